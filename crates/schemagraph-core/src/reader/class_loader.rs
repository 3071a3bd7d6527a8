//! Class Construction
//!
//! Builds one class at a time: own row, owning schema, then base classes,
//! properties, custom attributes and, for relationship classes, both
//! constraint ends. The empty class shell is cached before any of those
//! dependents is resolved.

use tracing::{debug, trace};

use super::session::{LoadSession, PendingNavigation};
use super::SchemaReadError;
use crate::model::{
    ArrayBounds, Cardinality, ClassId, ClassKind, ClassModifier, ClassType, ConstraintClass,
    ContainerType, EcClass, EcProperty, PrimitiveType, PropertyKind, PropertyType,
    RelatedDirection, RelationshipConstraint, RelationshipEnd, RelationshipInfo, StrengthType,
};
use crate::store::{ClassRow, ConstraintRow, PropertyRow};

impl LoadSession<'_> {
    pub(super) fn get_class(&mut self, id: ClassId) -> Result<&EcClass, SchemaReadError> {
        if self.caches.classes.contains_key(&id) {
            self.caches.metrics.record_hit();
            trace!("Class cache hit: {}", id);
        } else {
            self.caches.metrics.record_miss();
            self.load_class(id)?;
        }
        self.caches.class(id)
    }

    fn load_class(&mut self, id: ClassId) -> Result<(), SchemaReadError> {
        let row = self
            .store
            .class_row(id)?
            .ok_or_else(|| SchemaReadError::not_found("class", id))?;

        let class_type = ClassType::from_code(row.class_type).ok_or_else(|| {
            SchemaReadError::corrupt(format!(
                "class {} has unknown type {}",
                row.name, row.class_type
            ))
        })?;
        let modifier = ClassModifier::from_code(row.modifier).ok_or_else(|| {
            SchemaReadError::corrupt(format!(
                "class {} has unknown modifier {}",
                row.name, row.modifier
            ))
        })?;
        let kind = class_kind(class_type, &row)?;

        // The schema need not be fully loaded, only present
        self.ensure_schema(row.schema_id)?;
        if self.caches.classes.contains_key(&id) {
            // Built while the owning schema's custom attributes were loading
            return Ok(());
        }

        debug!("Loading class {} ({})", row.name, id);

        let schema_id = row.schema_id;
        let mut class = EcClass::new(id, schema_id, row.name, kind);
        class.set_details(row.display_label, row.description, modifier);
        self.caches.insert_class(class);

        for base_id in self.store.base_class_ids(id)? {
            self.get_class(base_id)?;
            self.caches.class_mut(id)?.add_base_class(base_id);
        }

        self.load_properties(id, class_type)?;

        let attributes = self.load_custom_attributes(id.get(), ContainerType::Class)?;
        self.caches.class_mut(id)?.set_custom_attributes(attributes);

        if class_type == ClassType::Relationship {
            self.load_constraint(id, RelationshipEnd::Source)?;
            self.load_constraint(id, RelationshipEnd::Target)?;
        }

        self.caches.record_type_loaded(schema_id)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn load_properties(
        &mut self,
        class_id: ClassId,
        owner_type: ClassType,
    ) -> Result<(), SchemaReadError> {
        for row in self.store.property_rows(class_id)? {
            let property_type = self.property_type(class_id, owner_type, &row)?;

            let mut property = EcProperty::new(row.id, class_id, row.name, property_type);
            property.set_details(row.display_label, row.description, row.is_readonly);

            let attributes =
                self.load_custom_attributes(row.id.get(), ContainerType::Property)?;
            property.set_custom_attributes(attributes);

            self.caches.class_mut(class_id)?.add_property(property);
        }
        Ok(())
    }

    fn property_type(
        &mut self,
        class_id: ClassId,
        owner_type: ClassType,
        row: &PropertyRow,
    ) -> Result<PropertyType, SchemaReadError> {
        let kind = PropertyKind::from_code(row.kind).ok_or_else(|| {
            SchemaReadError::corrupt(format!(
                "property {} has unknown kind {}",
                row.name, row.kind
            ))
        })?;

        let property_type = match kind {
            PropertyKind::Primitive => PropertyType::Primitive(primitive_type(row)?),
            PropertyKind::Enumeration => {
                let enumeration_id = row.enumeration_id.ok_or_else(|| {
                    SchemaReadError::corrupt(format!(
                        "enumeration property {} has no enumeration",
                        row.name
                    ))
                })?;
                self.get_enumeration(enumeration_id)?;
                PropertyType::Enumeration(enumeration_id)
            }
            PropertyKind::Struct => PropertyType::Struct(self.struct_class(row)?),
            PropertyKind::PrimitiveArray => PropertyType::PrimitiveArray {
                element: primitive_type(row)?,
                bounds: array_bounds(row)?,
            },
            PropertyKind::StructArray => PropertyType::StructArray {
                element: self.struct_class(row)?,
                bounds: array_bounds(row)?,
            },
            PropertyKind::Navigation => {
                if owner_type != ClassType::Entity {
                    return Err(SchemaReadError::corrupt(format!(
                        "navigation property {} declared on a {} class",
                        row.name,
                        owner_type.as_str()
                    )));
                }
                let relationship = self.relationship_class(row)?;
                let direction = match row.navigation_direction {
                    None => RelatedDirection::Forward,
                    Some(code) => RelatedDirection::from_code(code).ok_or_else(|| {
                        SchemaReadError::corrupt(format!(
                            "navigation property {} has unknown direction {}",
                            row.name, code
                        ))
                    })?,
                };

                // The relationship's constraints may still be under construction
                self.pending_navigation.push(PendingNavigation {
                    class_id,
                    property: row.name.clone(),
                    relationship,
                    direction,
                });

                PropertyType::Navigation {
                    relationship,
                    direction,
                }
            }
        };

        Ok(property_type)
    }

    /// Resolve the struct class referenced by a struct or struct array property
    fn struct_class(&mut self, row: &PropertyRow) -> Result<ClassId, SchemaReadError> {
        let struct_id = row.non_primitive_type.ok_or_else(|| {
            SchemaReadError::corrupt(format!("struct property {} has no struct class", row.name))
        })?;

        let class = self.get_class(struct_id)?;
        if !class.is_struct() {
            return Err(SchemaReadError::corrupt(format!(
                "property {} references {} class {} where a struct is required",
                row.name,
                class.class_type().as_str(),
                class.name()
            )));
        }
        Ok(struct_id)
    }

    /// Resolve the relationship class a navigation property points through
    fn relationship_class(&mut self, row: &PropertyRow) -> Result<ClassId, SchemaReadError> {
        let relationship_id = row.non_primitive_type.ok_or_else(|| {
            SchemaReadError::corrupt(format!(
                "navigation property {} has no relationship class",
                row.name
            ))
        })?;

        let class = self.get_class(relationship_id)?;
        if !class.is_relationship() {
            return Err(SchemaReadError::corrupt(format!(
                "navigation property {} points through {} class {}",
                row.name,
                class.class_type().as_str(),
                class.name()
            )));
        }
        Ok(relationship_id)
    }

    // =========================================================================
    // Relationship Constraints
    // =========================================================================

    fn load_constraint(
        &mut self,
        relationship_id: ClassId,
        end: RelationshipEnd,
    ) -> Result<(), SchemaReadError> {
        let row = self
            .store
            .constraint_row(relationship_id, end)?
            .ok_or_else(|| {
                SchemaReadError::not_found(
                    "relationship constraint",
                    format!("{}/{}", relationship_id, end.as_str()),
                )
            })?;

        let cardinality = cardinality(&row)?;
        self.constraint_mut(relationship_id, end)?.set_details(
            cardinality,
            row.is_polymorphic,
            row.role_label,
        );

        for constraint_class in self.store.constraint_class_rows(relationship_id, end)? {
            let class = self.get_class(constraint_class.class_id)?;
            if !class.is_entity() {
                return Err(SchemaReadError::corrupt(format!(
                    "{} constraint of relationship {} lists {} class {}",
                    end.as_str(),
                    relationship_id,
                    class.class_type().as_str(),
                    class.name()
                )));
            }

            let key_properties = match constraint_class.key_properties.as_deref() {
                Some(payload) => self
                    .instance_codec
                    .decode_key_properties(payload)
                    .map_err(|e| {
                        SchemaReadError::corrupt(format!(
                            "invalid key properties on {} constraint of relationship {}: {}",
                            end.as_str(),
                            relationship_id,
                            e
                        ))
                    })?,
                None => Vec::new(),
            };

            self.constraint_mut(relationship_id, end)?
                .add_class(ConstraintClass {
                    class_id: constraint_class.class_id,
                    key_properties,
                });
        }

        let attributes = self.load_custom_attributes(relationship_id.get(), end.container_type())?;
        self.constraint_mut(relationship_id, end)?
            .set_custom_attributes(attributes);
        Ok(())
    }

    fn constraint_mut(
        &mut self,
        relationship_id: ClassId,
        end: RelationshipEnd,
    ) -> Result<&mut RelationshipConstraint, SchemaReadError> {
        let class = self.caches.class_mut(relationship_id)?;
        let info = class.relationship_mut().ok_or_else(|| {
            SchemaReadError::invariant(format!(
                "cached class {} is not a relationship",
                relationship_id
            ))
        })?;
        Ok(info.constraint_mut(end))
    }
}

// ============================================================================
// Row Decoding
// ============================================================================

fn class_kind(class_type: ClassType, row: &ClassRow) -> Result<ClassKind, SchemaReadError> {
    let kind = match class_type {
        ClassType::Entity => ClassKind::Entity,
        ClassType::Struct => ClassKind::Struct,
        ClassType::CustomAttribute => ClassKind::CustomAttribute,
        ClassType::Relationship => {
            let strength = match row.relationship_strength {
                None => StrengthType::default(),
                Some(code) => StrengthType::from_code(code).ok_or_else(|| {
                    SchemaReadError::corrupt(format!(
                        "relationship {} has unknown strength {}",
                        row.name, code
                    ))
                })?,
            };
            let direction = match row.relationship_strength_direction {
                None => RelatedDirection::default(),
                Some(code) => RelatedDirection::from_code(code).ok_or_else(|| {
                    SchemaReadError::corrupt(format!(
                        "relationship {} has unknown strength direction {}",
                        row.name, code
                    ))
                })?,
            };
            ClassKind::Relationship(RelationshipInfo::new(strength, direction))
        }
    };
    Ok(kind)
}

fn primitive_type(row: &PropertyRow) -> Result<PrimitiveType, SchemaReadError> {
    let code = row.primitive_type.ok_or_else(|| {
        SchemaReadError::corrupt(format!("property {} has no primitive type", row.name))
    })?;
    PrimitiveType::from_code(code).ok_or_else(|| {
        SchemaReadError::corrupt(format!(
            "property {} has unknown primitive type {:#x}",
            row.name, code
        ))
    })
}

fn array_bounds(row: &PropertyRow) -> Result<ArrayBounds, SchemaReadError> {
    let (min, max) = match (row.array_min_occurs, row.array_max_occurs) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Err(SchemaReadError::corrupt(format!(
                "array property {} has no occurrence bounds",
                row.name
            )))
        }
    };

    let min_occurs = u32::try_from(min).map_err(|_| {
        SchemaReadError::corrupt(format!(
            "array property {} has invalid min occurs {}",
            row.name, min
        ))
    })?;
    // Negative max occurs is unbounded
    let max_occurs = if max < 0 {
        None
    } else {
        Some(u32::try_from(max).map_err(|_| {
            SchemaReadError::corrupt(format!(
                "array property {} has invalid max occurs {}",
                row.name, max
            ))
        })?)
    };

    Ok(ArrayBounds {
        min_occurs,
        max_occurs,
    })
}

fn cardinality(row: &ConstraintRow) -> Result<Cardinality, SchemaReadError> {
    let lower = u32::try_from(row.lower_cardinality).map_err(|_| {
        SchemaReadError::corrupt(format!(
            "invalid lower cardinality {}",
            row.lower_cardinality
        ))
    })?;
    let upper = match row.upper_cardinality {
        None => None,
        Some(upper) if upper < 0 => None,
        Some(upper) => Some(u32::try_from(upper).map_err(|_| {
            SchemaReadError::corrupt(format!("invalid upper cardinality {}", upper))
        })?),
    };
    Ok(Cardinality { lower, upper })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyId;

    fn property_row(kind: PropertyKind) -> PropertyRow {
        PropertyRow {
            kind: kind.code(),
            id: PropertyId(1),
            name: "Sizes".to_string(),
            display_label: None,
            description: None,
            is_readonly: false,
            primitive_type: Some(PrimitiveType::Double.code()),
            non_primitive_type: None,
            enumeration_id: None,
            array_min_occurs: None,
            array_max_occurs: None,
            navigation_direction: None,
        }
    }

    #[test]
    fn test_array_bounds() {
        let mut row = property_row(PropertyKind::PrimitiveArray);
        row.array_min_occurs = Some(1);
        row.array_max_occurs = Some(-1);
        assert_eq!(
            array_bounds(&row).unwrap(),
            ArrayBounds {
                min_occurs: 1,
                max_occurs: None
            }
        );

        row.array_max_occurs = Some(8);
        assert_eq!(array_bounds(&row).unwrap().max_occurs, Some(8));

        row.array_min_occurs = Some(-2);
        assert!(matches!(
            array_bounds(&row),
            Err(SchemaReadError::Corrupt(_))
        ));

        row.array_min_occurs = None;
        assert!(array_bounds(&row).is_err());
    }

    #[test]
    fn test_primitive_type_requires_known_code() {
        let mut row = property_row(PropertyKind::Primitive);
        assert_eq!(primitive_type(&row).unwrap(), PrimitiveType::Double);

        row.primitive_type = None;
        assert!(primitive_type(&row).is_err());

        row.primitive_type = Some(0x999);
        assert!(primitive_type(&row).is_err());
    }

    #[test]
    fn test_cardinality_unbounded_upper() {
        let row = ConstraintRow {
            lower_cardinality: 0,
            upper_cardinality: Some(-1),
            is_polymorphic: true,
            role_label: None,
        };
        assert_eq!(cardinality(&row).unwrap(), Cardinality::ZERO_MANY);

        let row = ConstraintRow {
            upper_cardinality: None,
            lower_cardinality: 1,
            ..row
        };
        assert_eq!(cardinality(&row).unwrap(), Cardinality::ONE_MANY);
    }

    #[test]
    fn test_relationship_kind_defaults() {
        let row = ClassRow {
            schema_id: crate::model::SchemaId(1),
            name: "Contains".to_string(),
            display_label: None,
            description: None,
            class_type: ClassType::Relationship.code(),
            modifier: 0,
            relationship_strength: Some(StrengthType::Embedding.code()),
            relationship_strength_direction: None,
        };
        match class_kind(ClassType::Relationship, &row).unwrap() {
            ClassKind::Relationship(info) => {
                assert_eq!(info.strength, StrengthType::Embedding);
                assert_eq!(info.strength_direction, RelatedDirection::Forward);
            }
            other => panic!("expected relationship, got {:?}", other),
        }

        let row = ClassRow {
            relationship_strength: Some(7),
            ..row
        };
        assert!(class_kind(ClassType::Relationship, &row).is_err());
    }
}
