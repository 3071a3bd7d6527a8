//! Payload Codecs
//!
//! Custom attribute instances, constraint key properties and enumeration
//! value lists are stored as opaque text payloads. The reader hands them to
//! these collaborators and only cares whether a usable value comes back.

use serde_json::Value;
use thiserror::Error;

use crate::model::{EcClass, Enumerator, InstanceValues, PrimitiveType};

/// Errors raised while decoding a stored payload
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload is empty")]
    Empty,

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Decodes custom attribute instance payloads.
pub trait InstanceCodec: Send + Sync {
    /// Decode an instance of `class` from its payload.
    ///
    /// `Ok(None)` means the payload decoded to no instance at all.
    fn decode_instance(
        &self,
        class: &EcClass,
        payload: &str,
    ) -> Result<Option<InstanceValues>, CodecError>;

    /// Decode the key property names of a relationship constraint class
    fn decode_key_properties(&self, payload: &str) -> Result<Vec<String>, CodecError>;
}

/// Decodes enumeration value lists.
pub trait EnumCodec: Send + Sync {
    fn decode_values(
        &self,
        underlying: PrimitiveType,
        payload: &str,
    ) -> Result<Vec<Enumerator>, CodecError>;
}

/// JSON implementation of both codecs
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl InstanceCodec for JsonCodec {
    fn decode_instance(
        &self,
        class: &EcClass,
        payload: &str,
    ) -> Result<Option<InstanceValues>, CodecError> {
        if payload.trim().is_empty() {
            return Err(CodecError::Empty);
        }

        match serde_json::from_str::<Value>(payload)? {
            Value::Null => Ok(None),
            Value::Object(values) => Ok(Some(values)),
            other => Err(CodecError::Malformed(format!(
                "instance of {} must be an object, got {}",
                class.name(),
                json_type_name(&other)
            ))),
        }
    }

    fn decode_key_properties(&self, payload: &str) -> Result<Vec<String>, CodecError> {
        if payload.trim().is_empty() {
            return Err(CodecError::Empty);
        }
        let names: Vec<String> = serde_json::from_str(payload)?;
        if names.iter().any(|n| n.is_empty()) {
            return Err(CodecError::Malformed(
                "key property names must not be empty".to_string(),
            ));
        }
        Ok(names)
    }
}

impl EnumCodec for JsonCodec {
    fn decode_values(
        &self,
        underlying: PrimitiveType,
        payload: &str,
    ) -> Result<Vec<Enumerator>, CodecError> {
        if payload.trim().is_empty() {
            return Err(CodecError::Empty);
        }

        let enumerators: Vec<Enumerator> = serde_json::from_str(payload)?;
        if enumerators.is_empty() {
            return Err(CodecError::Empty);
        }

        if let Some(bad) = enumerators.iter().find(|e| !e.value.matches(underlying)) {
            return Err(CodecError::Malformed(format!(
                "value {} does not match underlying type {}",
                bad.value,
                underlying.as_str()
            )));
        }

        Ok(enumerators)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassId, ClassKind, EnumeratorValue, SchemaId};

    fn ca_class() -> EcClass {
        EcClass::new(
            ClassId(90),
            SchemaId(1),
            "ClassMap",
            ClassKind::CustomAttribute,
        )
    }

    #[test]
    fn test_decode_instance_object() {
        let values = JsonCodec
            .decode_instance(&ca_class(), r#"{"MapStrategy": "OwnTable", "Level": 2}"#)
            .unwrap()
            .unwrap();
        assert_eq!(values["MapStrategy"], "OwnTable");
        assert_eq!(values["Level"], 2);
    }

    #[test]
    fn test_decode_instance_null_yields_none() {
        assert!(JsonCodec
            .decode_instance(&ca_class(), "null")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_instance_rejects_non_objects() {
        assert!(matches!(
            JsonCodec.decode_instance(&ca_class(), "[1, 2]"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            JsonCodec.decode_instance(&ca_class(), "  "),
            Err(CodecError::Empty)
        ));
        assert!(matches!(
            JsonCodec.decode_instance(&ca_class(), "{not json"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_decode_key_properties() {
        assert_eq!(
            JsonCodec.decode_key_properties(r#"["Code", "Scope"]"#).unwrap(),
            vec!["Code".to_string(), "Scope".to_string()]
        );
        assert!(JsonCodec.decode_key_properties(r#"[""]"#).is_err());
    }

    #[test]
    fn test_decode_values() {
        let values = JsonCodec
            .decode_values(
                PrimitiveType::Integer,
                r#"[{"value": 0, "label": "Red"}, {"value": 1}]"#,
            )
            .unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].value, EnumeratorValue::Integer(0));
        assert_eq!(values[0].display_label.as_deref(), Some("Red"));
        assert_eq!(values[1].display_label, None);
    }

    #[test]
    fn test_decode_values_rejects_bad_lists() {
        assert!(matches!(
            JsonCodec.decode_values(PrimitiveType::Integer, "[]"),
            Err(CodecError::Empty)
        ));
        assert!(matches!(
            JsonCodec.decode_values(PrimitiveType::Integer, r#"[{"value": "red"}]"#),
            Err(CodecError::Malformed(_))
        ));
    }
}
