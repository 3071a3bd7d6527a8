//! Class properties

use serde::Serialize;

use super::custom_attribute::CustomAttributeInstance;
use super::ids::{ClassId, EnumerationId, PropertyId};
use super::kinds::{PrimitiveType, RelatedDirection};

/// Occurrence bounds of an array property. `max_occurs == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrayBounds {
    pub min_occurs: u32,
    pub max_occurs: Option<u32>,
}

/// Type of a property, one variant per persisted property kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyType {
    Primitive(PrimitiveType),
    Enumeration(EnumerationId),
    Struct(ClassId),
    PrimitiveArray {
        element: PrimitiveType,
        bounds: ArrayBounds,
    },
    StructArray {
        element: ClassId,
        bounds: ArrayBounds,
    },
    /// Points through a relationship class in the given direction
    Navigation {
        relationship: ClassId,
        direction: RelatedDirection,
    },
}

impl PropertyType {
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            PropertyType::PrimitiveArray { .. } | PropertyType::StructArray { .. }
        )
    }

    /// Class referenced by this property type, if any
    pub fn referenced_class(&self) -> Option<ClassId> {
        match self {
            PropertyType::Struct(id) => Some(*id),
            PropertyType::StructArray { element, .. } => Some(*element),
            PropertyType::Navigation { relationship, .. } => Some(*relationship),
            PropertyType::Primitive(_)
            | PropertyType::Enumeration(_)
            | PropertyType::PrimitiveArray { .. } => None,
        }
    }
}

/// A typed member of a class.
#[derive(Debug, Clone, Serialize)]
pub struct EcProperty {
    id: PropertyId,
    class_id: ClassId,
    name: String,
    display_label: Option<String>,
    description: Option<String>,
    is_readonly: bool,
    property_type: PropertyType,
    custom_attributes: Vec<CustomAttributeInstance>,
}

impl EcProperty {
    pub fn new(
        id: PropertyId,
        class_id: ClassId,
        name: impl Into<String>,
        property_type: PropertyType,
    ) -> Self {
        Self {
            id,
            class_id,
            name: name.into(),
            display_label: None,
            description: None,
            is_readonly: false,
            property_type,
            custom_attributes: Vec::new(),
        }
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// The class declaring this property
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_label(&self) -> &str {
        self.display_label.as_deref().unwrap_or(&self.name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_readonly(&self) -> bool {
        self.is_readonly
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    pub fn custom_attributes(&self) -> &[CustomAttributeInstance] {
        &self.custom_attributes
    }

    pub(crate) fn set_details(
        &mut self,
        display_label: Option<String>,
        description: Option<String>,
        is_readonly: bool,
    ) {
        self.display_label = display_label;
        self.description = description;
        self.is_readonly = is_readonly;
    }

    pub(crate) fn set_custom_attributes(&mut self, attributes: Vec<CustomAttributeInstance>) {
        self.custom_attributes = attributes;
    }
}
