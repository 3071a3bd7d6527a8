//! Enumerations

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{EnumerationId, SchemaId};
use super::kinds::PrimitiveType;

/// Value of a single enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumeratorValue {
    Integer(i32),
    String(String),
}

impl EnumeratorValue {
    /// Whether the value is legal for the given underlying type
    pub fn matches(&self, underlying: PrimitiveType) -> bool {
        matches!(
            (self, underlying),
            (EnumeratorValue::Integer(_), PrimitiveType::Integer)
                | (EnumeratorValue::String(_), PrimitiveType::String)
        )
    }
}

impl fmt::Display for EnumeratorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumeratorValue::Integer(v) => write!(f, "{}", v),
            EnumeratorValue::String(v) => write!(f, "{}", v),
        }
    }
}

/// One legal value of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerator {
    pub value: EnumeratorValue,
    #[serde(default, rename = "label", skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
}

/// A named set of legal values for a primitive type.
#[derive(Debug, Clone, Serialize)]
pub struct EcEnumeration {
    id: EnumerationId,
    schema_id: SchemaId,
    name: String,
    display_label: Option<String>,
    description: Option<String>,
    underlying_type: PrimitiveType,
    is_strict: bool,
    enumerators: Vec<Enumerator>,
}

impl EcEnumeration {
    pub fn new(
        id: EnumerationId,
        schema_id: SchemaId,
        name: impl Into<String>,
        underlying_type: PrimitiveType,
        is_strict: bool,
    ) -> Self {
        Self {
            id,
            schema_id,
            name: name.into(),
            display_label: None,
            description: None,
            underlying_type,
            is_strict,
            enumerators: Vec::new(),
        }
    }

    pub fn id(&self) -> EnumerationId {
        self.id
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
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

    pub fn underlying_type(&self) -> PrimitiveType {
        self.underlying_type
    }

    /// Strict enumerations reject values outside the enumerator list
    pub fn is_strict(&self) -> bool {
        self.is_strict
    }

    pub fn enumerators(&self) -> &[Enumerator] {
        &self.enumerators
    }

    pub fn find(&self, value: &EnumeratorValue) -> Option<&Enumerator> {
        self.enumerators.iter().find(|e| &e.value == value)
    }

    pub(crate) fn set_labels(&mut self, display_label: Option<String>, description: Option<String>) {
        self.display_label = display_label;
        self.description = description;
    }

    pub(crate) fn set_enumerators(&mut self, enumerators: Vec<Enumerator>) {
        self.enumerators = enumerators;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_matches_underlying_type() {
        assert!(EnumeratorValue::Integer(1).matches(PrimitiveType::Integer));
        assert!(!EnumeratorValue::Integer(1).matches(PrimitiveType::String));
        assert!(EnumeratorValue::String("a".into()).matches(PrimitiveType::String));
        assert!(!EnumeratorValue::String("a".into()).matches(PrimitiveType::Double));
    }

    #[test]
    fn test_find_enumerator() {
        let mut color = EcEnumeration::new(
            EnumerationId(30),
            SchemaId(1),
            "Color",
            PrimitiveType::Integer,
            true,
        );
        color.set_enumerators(vec![
            Enumerator {
                value: EnumeratorValue::Integer(0),
                display_label: Some("Red".into()),
            },
            Enumerator {
                value: EnumeratorValue::Integer(1),
                display_label: None,
            },
        ]);

        let red = color.find(&EnumeratorValue::Integer(0)).unwrap();
        assert_eq!(red.display_label.as_deref(), Some("Red"));
        assert!(color.find(&EnumeratorValue::Integer(5)).is_none());
    }
}
