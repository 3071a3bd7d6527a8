//! Schema container

use serde::Serialize;

use super::custom_attribute::CustomAttributeInstance;
use super::ids::SchemaId;

/// A named, versioned container of classes and enumerations.
///
/// References to other schemas are held by id; resolve them through the
/// reader that produced this schema.
#[derive(Debug, Clone, Serialize)]
pub struct EcSchema {
    id: SchemaId,
    name: String,
    display_label: Option<String>,
    description: Option<String>,
    alias: Option<String>,
    version_major: u32,
    version_minor: u32,
    references: Vec<SchemaId>,
    custom_attributes: Vec<CustomAttributeInstance>,
}

impl EcSchema {
    pub fn new(id: SchemaId, name: impl Into<String>, version_major: u32, version_minor: u32) -> Self {
        Self {
            id,
            name: name.into(),
            display_label: None,
            description: None,
            alias: None,
            version_major,
            version_minor,
            references: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label, falling back to the name
    pub fn display_label(&self) -> &str {
        self.display_label.as_deref().unwrap_or(&self.name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Namespace prefix used to qualify class names
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn version_major(&self) -> u32 {
        self.version_major
    }

    pub fn version_minor(&self) -> u32 {
        self.version_minor
    }

    /// `Name.MM.mm`
    pub fn full_name(&self) -> String {
        format!(
            "{}.{:02}.{:02}",
            self.name, self.version_major, self.version_minor
        )
    }

    /// Directly referenced schemas
    pub fn references(&self) -> &[SchemaId] {
        &self.references
    }

    pub fn references_schema(&self, id: SchemaId) -> bool {
        self.references.contains(&id)
    }

    pub fn custom_attributes(&self) -> &[CustomAttributeInstance] {
        &self.custom_attributes
    }

    pub fn custom_attribute(&self, class_name: &str) -> Option<&CustomAttributeInstance> {
        self.custom_attributes
            .iter()
            .find(|ca| ca.class_name() == class_name)
    }

    pub(crate) fn set_labels(
        &mut self,
        display_label: Option<String>,
        description: Option<String>,
        alias: Option<String>,
    ) {
        self.display_label = display_label;
        self.description = description;
        self.alias = alias;
    }

    pub(crate) fn add_reference(&mut self, id: SchemaId) {
        if !self.references.contains(&id) {
            self.references.push(id);
        }
    }

    pub(crate) fn set_custom_attributes(&mut self, attributes: Vec<CustomAttributeInstance>) {
        self.custom_attributes = attributes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_and_label_fallback() {
        let mut schema = EcSchema::new(SchemaId(1), "Widgets", 1, 2);
        assert_eq!(schema.full_name(), "Widgets.01.02");
        assert_eq!(schema.display_label(), "Widgets");

        schema.set_labels(Some("Widget Parts".into()), None, Some("wdg".into()));
        assert_eq!(schema.display_label(), "Widget Parts");
        assert_eq!(schema.alias(), Some("wdg"));
    }

    #[test]
    fn test_references_are_deduplicated() {
        let mut schema = EcSchema::new(SchemaId(1), "Widgets", 1, 0);
        schema.add_reference(SchemaId(2));
        schema.add_reference(SchemaId(2));
        schema.add_reference(SchemaId(3));
        assert_eq!(schema.references(), &[SchemaId(2), SchemaId(3)]);
        assert!(schema.references_schema(SchemaId(3)));
    }
}
