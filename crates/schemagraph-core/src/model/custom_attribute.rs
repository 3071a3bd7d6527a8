//! Custom attribute instances

use serde::Serialize;
use serde_json::{Map, Value};

use super::ids::ClassId;

/// Decoded property values of one custom attribute instance
pub type InstanceValues = Map<String, Value>;

/// A custom attribute attached to a schema, class, property or constraint end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomAttributeInstance {
    class_id: ClassId,
    class_name: String,
    values: InstanceValues,
}

impl CustomAttributeInstance {
    pub fn new(class_id: ClassId, class_name: impl Into<String>, values: InstanceValues) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            values,
        }
    }

    /// The custom attribute class defining this instance
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn values(&self) -> &InstanceValues {
        &self.values
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }
}
