//! Entity Caches
//!
//! Id-keyed maps from entity id to a loaded-or-loading entry. An entry is
//! inserted as soon as its own row has been read, before any dependent is
//! resolved, so a cyclic reference finds the entity under construction
//! instead of building it a second time.
//!
//! Not thread-safe on its own: the reader keeps the whole `Caches` value
//! behind a single `parking_lot::Mutex`.

use std::collections::HashMap;
use std::sync::Arc;

use super::SchemaReadError;
use crate::model::{ClassId, EcClass, EcEnumeration, EcSchema, EnumerationId, SchemaId};

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    /// Number of lookups answered from a cache
    pub hits: u64,
    /// Number of lookups that had to go to the store
    pub misses: u64,
}

impl CacheMetrics {
    /// Get hit rate as a fraction (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }
}

/// A cached schema plus its load progress
#[derive(Debug)]
pub struct SchemaEntry {
    pub schema: Arc<EcSchema>,
    /// Classes and enumerations of this schema built so far
    pub loaded_type_count: u32,
    /// Classes and enumerations the store reports for this schema
    pub total_type_count: u32,
}

impl SchemaEntry {
    pub fn new(schema: EcSchema, total_type_count: u32) -> Self {
        Self {
            schema: Arc::new(schema),
            loaded_type_count: 0,
            total_type_count,
        }
    }

    pub fn is_fully_loaded(&self) -> bool {
        self.loaded_type_count == self.total_type_count
    }

    /// Count one more built type, never past the reported total
    pub fn record_type_loaded(&mut self) {
        if self.loaded_type_count < self.total_type_count {
            self.loaded_type_count += 1;
        }
    }
}

#[derive(Debug)]
pub struct ClassEntry {
    pub class: Arc<EcClass>,
}

#[derive(Debug)]
pub struct EnumEntry {
    pub enumeration: Arc<EcEnumeration>,
}

/// The three entity caches guarded together by the reader's lock
#[derive(Debug, Default)]
pub struct Caches {
    pub schemas: HashMap<SchemaId, SchemaEntry>,
    pub classes: HashMap<ClassId, ClassEntry>,
    pub enumerations: HashMap<EnumerationId, EnumEntry>,
    pub metrics: CacheMetrics,
}

impl Caches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry and reset the counters
    pub fn clear(&mut self) {
        self.schemas.clear();
        self.classes.clear();
        self.enumerations.clear();
        self.metrics = CacheMetrics::default();
    }

    pub fn fully_loaded_schema_count(&self) -> usize {
        self.schemas
            .values()
            .filter(|entry| entry.is_fully_loaded())
            .count()
    }

    pub fn is_fully_loaded(&self, id: SchemaId) -> bool {
        self.schemas
            .get(&id)
            .is_some_and(|entry| entry.is_fully_loaded())
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    pub fn insert_schema(&mut self, schema: EcSchema, total_type_count: u32) {
        self.schemas
            .insert(schema.id(), SchemaEntry::new(schema, total_type_count));
    }

    pub fn insert_class(&mut self, class: EcClass) {
        self.classes.insert(
            class.id(),
            ClassEntry {
                class: Arc::new(class),
            },
        );
    }

    pub fn insert_enumeration(&mut self, enumeration: EcEnumeration) {
        self.enumerations.insert(
            enumeration.id(),
            EnumEntry {
                enumeration: Arc::new(enumeration),
            },
        );
    }

    /// Count a newly built class or enumeration against its schema
    pub fn record_type_loaded(&mut self, schema_id: SchemaId) -> Result<(), SchemaReadError> {
        let entry = self.schemas.get_mut(&schema_id).ok_or_else(|| {
            SchemaReadError::invariant(format!("schema {} is not cached", schema_id))
        })?;
        entry.record_type_loaded();
        Ok(())
    }

    // =========================================================================
    // Shared Access
    // =========================================================================

    pub fn schema(&self, id: SchemaId) -> Result<&EcSchema, SchemaReadError> {
        self.schemas
            .get(&id)
            .map(|entry| entry.schema.as_ref())
            .ok_or_else(|| SchemaReadError::invariant(format!("schema {} is not cached", id)))
    }

    pub fn class(&self, id: ClassId) -> Result<&EcClass, SchemaReadError> {
        self.classes
            .get(&id)
            .map(|entry| entry.class.as_ref())
            .ok_or_else(|| SchemaReadError::invariant(format!("class {} is not cached", id)))
    }

    pub fn enumeration(&self, id: EnumerationId) -> Result<&EcEnumeration, SchemaReadError> {
        self.enumerations
            .get(&id)
            .map(|entry| entry.enumeration.as_ref())
            .ok_or_else(|| {
                SchemaReadError::invariant(format!("enumeration {} is not cached", id))
            })
    }

    pub fn shared_schema(&self, id: SchemaId) -> Result<Arc<EcSchema>, SchemaReadError> {
        self.schemas
            .get(&id)
            .map(|entry| Arc::clone(&entry.schema))
            .ok_or_else(|| SchemaReadError::invariant(format!("schema {} is not cached", id)))
    }

    pub fn shared_class(&self, id: ClassId) -> Result<Arc<EcClass>, SchemaReadError> {
        self.classes
            .get(&id)
            .map(|entry| Arc::clone(&entry.class))
            .ok_or_else(|| SchemaReadError::invariant(format!("class {} is not cached", id)))
    }

    pub fn shared_enumeration(
        &self,
        id: EnumerationId,
    ) -> Result<Arc<EcEnumeration>, SchemaReadError> {
        self.enumerations
            .get(&id)
            .map(|entry| Arc::clone(&entry.enumeration))
            .ok_or_else(|| {
                SchemaReadError::invariant(format!("enumeration {} is not cached", id))
            })
    }

    // =========================================================================
    // Construction Access
    // =========================================================================

    /// Mutable access to a schema still under construction.
    ///
    /// Fails if the schema has already been handed out to a caller.
    pub fn schema_mut(&mut self, id: SchemaId) -> Result<&mut EcSchema, SchemaReadError> {
        let entry = self
            .schemas
            .get_mut(&id)
            .ok_or_else(|| SchemaReadError::invariant(format!("schema {} is not cached", id)))?;
        Arc::get_mut(&mut entry.schema).ok_or_else(|| {
            SchemaReadError::invariant(format!("schema {} is shared while under construction", id))
        })
    }

    /// Mutable access to a class still under construction.
    ///
    /// Fails if the class has already been handed out to a caller.
    pub fn class_mut(&mut self, id: ClassId) -> Result<&mut EcClass, SchemaReadError> {
        let entry = self
            .classes
            .get_mut(&id)
            .ok_or_else(|| SchemaReadError::invariant(format!("class {} is not cached", id)))?;
        Arc::get_mut(&mut entry.class).ok_or_else(|| {
            SchemaReadError::invariant(format!("class {} is shared while under construction", id))
        })
    }
}
