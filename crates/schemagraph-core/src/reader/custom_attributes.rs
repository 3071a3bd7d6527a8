//! Custom Attribute Loading

use super::session::LoadSession;
use super::SchemaReadError;
use crate::model::{ContainerType, CustomAttributeInstance};

impl LoadSession<'_> {
    /// Load the custom attributes attached to a container, in ordinal order.
    ///
    /// The defining class of each attribute is resolved through the class
    /// cache and may live in a schema nobody has touched yet.
    pub(super) fn load_custom_attributes(
        &mut self,
        container_id: i64,
        container_type: ContainerType,
    ) -> Result<Vec<CustomAttributeInstance>, SchemaReadError> {
        let rows = self
            .store
            .custom_attribute_rows(container_id, container_type)?;
        let codec = self.instance_codec;

        let mut instances = Vec::with_capacity(rows.len());
        for row in rows {
            let class = self.get_class(row.class_id)?;
            if !class.is_custom_attribute() {
                return Err(SchemaReadError::corrupt(format!(
                    "{} class {} is used as a custom attribute",
                    class.class_type().as_str(),
                    class.name()
                )));
            }

            let payload = row.instance_payload.as_deref().ok_or_else(|| {
                SchemaReadError::corrupt(format!(
                    "custom attribute {} on {:?} {} has no instance",
                    class.name(),
                    container_type,
                    container_id
                ))
            })?;

            let values = codec
                .decode_instance(class, payload)
                .map_err(|e| {
                    SchemaReadError::corrupt(format!(
                        "custom attribute {} on {:?} {} could not be decoded: {}",
                        class.name(),
                        container_type,
                        container_id,
                        e
                    ))
                })?
                .ok_or_else(|| {
                    SchemaReadError::corrupt(format!(
                        "custom attribute {} on {:?} {} decoded to no instance",
                        class.name(),
                        container_type,
                        container_id
                    ))
                })?;

            instances.push(CustomAttributeInstance::new(
                class.id(),
                class.name(),
                values,
            ));
        }

        Ok(instances)
    }
}
