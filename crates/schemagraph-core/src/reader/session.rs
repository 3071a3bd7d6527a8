//! Load Session
//!
//! The internal half of the reader. A `LoadSession` can only be built from
//! the `Caches` borrowed out of the reader's mutex guard, so every method
//! here runs with the lock already held and never tries to take it again.
//! Loaders recurse freely through the session; one session lives for exactly
//! one public call.

use std::collections::HashSet;
use tracing::{debug, trace, warn};

use super::cache::Caches;
use super::SchemaReadError;
use crate::codec::{EnumCodec, InstanceCodec};
use crate::model::{
    ClassId, ContainerType, EcEnumeration, EcSchema, EnumerationId, PrimitiveType,
    RelatedDirection, SchemaId,
};
use crate::store::MetadataStore;

/// A navigation property awaiting validation against its relationship
#[derive(Debug, Clone)]
pub(super) struct PendingNavigation {
    pub class_id: ClassId,
    pub property: String,
    pub relationship: ClassId,
    pub direction: RelatedDirection,
}

pub(crate) struct LoadSession<'a> {
    pub(super) caches: &'a mut Caches,
    pub(super) store: &'a dyn MetadataStore,
    pub(super) instance_codec: &'a dyn InstanceCodec,
    pub(super) enum_codec: &'a dyn EnumCodec,
    validate_navigation: bool,
    pub(super) pending_navigation: Vec<PendingNavigation>,
}

impl<'a> LoadSession<'a> {
    pub(super) fn new(
        caches: &'a mut Caches,
        store: &'a dyn MetadataStore,
        instance_codec: &'a dyn InstanceCodec,
        enum_codec: &'a dyn EnumCodec,
        validate_navigation: bool,
    ) -> Self {
        Self {
            caches,
            store,
            instance_codec,
            enum_codec,
            validate_navigation,
            pending_navigation: Vec::new(),
        }
    }

    /// Complete the public call: validate every navigation property
    /// registered while building.
    pub(super) fn finish(mut self) -> Result<(), SchemaReadError> {
        if !self.validate_navigation {
            self.pending_navigation.clear();
            return Ok(());
        }

        // Validation may itself load classes that register more properties
        while let Some(navigation) = self.pending_navigation.pop() {
            self.check_navigation(&navigation)?;
        }
        Ok(())
    }

    // =========================================================================
    // Schemas
    // =========================================================================

    /// Make sure a schema and its reference closure are cached, applying
    /// custom attributes to every schema this call newly read.
    pub(super) fn ensure_schema(&mut self, id: SchemaId) -> Result<&EcSchema, SchemaReadError> {
        if self.caches.schemas.contains_key(&id) {
            self.caches.metrics.record_hit();
            trace!("Schema cache hit: {}", id);
        } else {
            self.caches.metrics.record_miss();

            let mut newly_loaded = Vec::new();
            self.read_schema(id, &mut newly_loaded)?;

            // Deferred until the whole reference closure exists, so the
            // attribute classes can always resolve their schema.
            for schema_id in newly_loaded {
                let attributes =
                    self.load_custom_attributes(schema_id.get(), ContainerType::Schema)?;
                self.caches
                    .schema_mut(schema_id)?
                    .set_custom_attributes(attributes);
            }
        }

        self.caches.schema(id)
    }

    /// Read a schema's own row and, recursively, the schemas it references
    fn read_schema(
        &mut self,
        id: SchemaId,
        newly_loaded: &mut Vec<SchemaId>,
    ) -> Result<(), SchemaReadError> {
        if self.caches.schemas.contains_key(&id) {
            return Ok(());
        }

        let row = self
            .store
            .schema_row(id)?
            .ok_or_else(|| SchemaReadError::not_found("schema", id))?;

        debug!(
            "Loading schema {} ({}) with {} types",
            row.name, id, row.type_count
        );

        let mut schema = EcSchema::new(id, row.name, row.version_major, row.version_minor);
        schema.set_labels(row.display_label, row.description, row.prefix);
        self.caches.insert_schema(schema, row.type_count);
        newly_loaded.push(id);

        for referenced in self.store.schema_references(id)? {
            self.read_schema(referenced, newly_loaded)?;
            self.caches.schema_mut(id)?.add_reference(referenced);
        }

        Ok(())
    }

    /// Force-load every class and enumeration of a schema and of all the
    /// schemas it references.
    pub(super) fn ensure_all_classes_loaded(
        &mut self,
        id: SchemaId,
        visited: &mut HashSet<SchemaId>,
    ) -> Result<(), SchemaReadError> {
        if !visited.insert(id) {
            return Ok(());
        }

        let references = self.ensure_schema(id)?.references().to_vec();
        for referenced in references {
            self.ensure_all_classes_loaded(referenced, visited)?;
        }

        if self.caches.is_fully_loaded(id) {
            trace!("Schema {} already fully loaded", id);
            return Ok(());
        }

        // Loading one class can pull in its siblings, so re-check after each
        for class_id in self.store.class_ids_in_schema(id)? {
            self.get_class(class_id)?;
            if self.caches.is_fully_loaded(id) {
                debug!("Schema {} fully loaded", id);
                return Ok(());
            }
        }

        for enumeration_id in self.store.enumeration_ids_in_schema(id)? {
            self.get_enumeration(enumeration_id)?;
            if self.caches.is_fully_loaded(id) {
                debug!("Schema {} fully loaded", id);
                return Ok(());
            }
        }

        if let Some(entry) = self.caches.schemas.get(&id) {
            warn!(
                "Schema {} loaded {} of {} reported types",
                id, entry.loaded_type_count, entry.total_type_count
            );
        }
        Ok(())
    }

    // =========================================================================
    // Enumerations
    // =========================================================================

    pub(super) fn get_enumeration(
        &mut self,
        id: EnumerationId,
    ) -> Result<&EcEnumeration, SchemaReadError> {
        if self.caches.enumerations.contains_key(&id) {
            self.caches.metrics.record_hit();
            trace!("Enumeration cache hit: {}", id);
        } else {
            self.caches.metrics.record_miss();
            self.load_enumeration(id)?;
        }
        self.caches.enumeration(id)
    }

    fn load_enumeration(&mut self, id: EnumerationId) -> Result<(), SchemaReadError> {
        let row = self
            .store
            .enumeration_row(id)?
            .ok_or_else(|| SchemaReadError::not_found("enumeration", id))?;

        let underlying = PrimitiveType::from_code(row.underlying_type)
            .ok_or_else(|| {
                SchemaReadError::corrupt(format!(
                    "enumeration {} has unknown underlying type {}",
                    row.name, row.underlying_type
                ))
            })?;

        self.ensure_schema(row.schema_id)?;
        if self.caches.enumerations.contains_key(&id) {
            // Built while the owning schema was loading
            return Ok(());
        }

        let payload = row.values_payload.as_deref().ok_or_else(|| {
            SchemaReadError::corrupt(format!("enumeration {} has no values", row.name))
        })?;
        let enumerators = self
            .enum_codec
            .decode_values(underlying, payload)
            .map_err(|e| {
                SchemaReadError::corrupt(format!(
                    "enumeration {} has invalid values: {}",
                    row.name, e
                ))
            })?;

        debug!("Loading enumeration {} ({})", row.name, id);

        let mut enumeration =
            EcEnumeration::new(id, row.schema_id, row.name, underlying, row.is_strict);
        enumeration.set_labels(row.display_label, row.description);
        enumeration.set_enumerators(enumerators);

        self.caches.insert_enumeration(enumeration);
        self.caches.record_type_loaded(row.schema_id)
    }

    // =========================================================================
    // Navigation Validation
    // =========================================================================

    fn check_navigation(&mut self, navigation: &PendingNavigation) -> Result<(), SchemaReadError> {
        let end = navigation.direction.origin_end();

        let (allowed, is_polymorphic, relationship_name) = {
            let relationship = self.get_class(navigation.relationship)?;
            let info = relationship.relationship().ok_or_else(|| {
                SchemaReadError::invariant(format!(
                    "navigation target {} is no longer a relationship",
                    relationship.name()
                ))
            })?;
            let constraint = info.constraint(end);
            (
                constraint.class_ids().collect::<Vec<_>>(),
                constraint.is_polymorphic(),
                relationship.name().to_string(),
            )
        };

        if allowed.contains(&navigation.class_id) {
            return Ok(());
        }
        if is_polymorphic {
            let ancestors = self.ancestors(navigation.class_id)?;
            if ancestors.iter().any(|id| allowed.contains(id)) {
                return Ok(());
            }
        }

        let class_name = self.get_class(navigation.class_id)?.name().to_string();
        Err(SchemaReadError::corrupt(format!(
            "navigation property {}.{} is not allowed at the {} end of {}",
            class_name,
            navigation.property,
            end.as_str(),
            relationship_name
        )))
    }

    /// All transitive base classes of a class
    fn ancestors(&mut self, id: ClassId) -> Result<Vec<ClassId>, SchemaReadError> {
        let mut seen = HashSet::new();
        let mut stack = self.get_class(id)?.base_classes().to_vec();
        let mut ancestors = Vec::new();

        while let Some(base) = stack.pop() {
            if !seen.insert(base) {
                continue;
            }
            ancestors.push(base);
            stack.extend(self.get_class(base)?.base_classes().iter().copied());
        }

        Ok(ancestors)
    }
}
