//! Schema Reader
//!
//! Lazily reconstructs the schema object graph from a [`MetadataStore`],
//! building every schema, class and enumeration at most once and handing out
//! shared references to the cached objects.
//!
//! # Locking
//!
//! One `parking_lot::Mutex` guards all three caches. Only the public methods
//! of [`SchemaReader`] take it; they then build a `LoadSession` over the
//! guarded caches, and all recursive loading goes through that session.
//! Concurrent callers fully serialize.

mod cache;
mod class_loader;
mod custom_attributes;
mod session;

use parking_lot::Mutex;
use schemagraph_config::ReaderConfig;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::codec::{EnumCodec, InstanceCodec, JsonCodec};
use crate::model::{ClassId, EcClass, EcEnumeration, EcSchema, EnumerationId, SchemaId};
use crate::store::{ClassKey, MetadataStore, SchemaKey, StoreError};

pub use cache::CacheMetrics;
use cache::Caches;
use session::LoadSession;

/// Errors that can occur while reading schema metadata
#[derive(Debug, Error)]
pub enum SchemaReadError {
    /// A required row is missing
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A row is present but cannot be turned into a valid object
    #[error("Corrupt metadata: {0}")]
    Corrupt(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The reader's own bookkeeping is inconsistent
    #[error("Reader invariant violated: {0}")]
    Invariant(String),
}

/// Coarse classification of a [`SchemaReadError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Corrupt,
    StoreFailure,
    Invariant,
}

impl SchemaReadError {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaReadError::NotFound { .. } => ErrorKind::NotFound,
            SchemaReadError::Corrupt(_) => ErrorKind::Corrupt,
            SchemaReadError::Store(_) => ErrorKind::StoreFailure,
            SchemaReadError::Invariant(_) => ErrorKind::Invariant,
        }
    }
}

/// Reader behaviour switches
#[derive(Debug, Clone)]
pub struct SchemaReaderOptions {
    /// Check navigation properties against their relationship constraints
    pub validate_navigation: bool,
}

impl Default for SchemaReaderOptions {
    fn default() -> Self {
        Self {
            validate_navigation: true,
        }
    }
}

impl From<&ReaderConfig> for SchemaReaderOptions {
    fn from(config: &ReaderConfig) -> Self {
        Self {
            validate_navigation: config.validate_navigation,
        }
    }
}

/// Statistics about the reader's caches
#[derive(Debug, Clone, Serialize)]
pub struct ReaderStats {
    /// Number of schemas in the cache
    pub cached_schemas: usize,
    /// Number of classes in the cache (including partially built ones)
    pub cached_classes: usize,
    /// Number of enumerations in the cache
    pub cached_enumerations: usize,
    /// Number of cached schemas with every class and enumeration built
    pub fully_loaded_schemas: usize,
    /// Lookups answered from a cache
    pub hits: u64,
    /// Lookups that went to the store
    pub misses: u64,
    /// Cache hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

/// Lazy, cached reader over a metadata store.
///
/// Each entity is built at most once per cache generation; repeated lookups
/// return the same `Arc`. [`SchemaReader::clear_cache`] starts a new
/// generation.
pub struct SchemaReader<S: MetadataStore> {
    store: S,
    instance_codec: Box<dyn InstanceCodec>,
    enum_codec: Box<dyn EnumCodec>,
    options: SchemaReaderOptions,
    caches: Mutex<Caches>,
}

impl<S: MetadataStore> SchemaReader<S> {
    /// Create a reader with JSON codecs and default options
    pub fn new(store: S) -> Self {
        Self::with_options(store, SchemaReaderOptions::default())
    }

    pub fn with_options(store: S, options: SchemaReaderOptions) -> Self {
        Self {
            store,
            instance_codec: Box::new(JsonCodec),
            enum_codec: Box::new(JsonCodec),
            options,
            caches: Mutex::new(Caches::new()),
        }
    }

    /// Replace the payload codecs
    pub fn with_codecs(
        mut self,
        instance_codec: impl InstanceCodec + 'static,
        enum_codec: impl EnumCodec + 'static,
    ) -> Self {
        self.instance_codec = Box::new(instance_codec);
        self.enum_codec = Box::new(enum_codec);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &SchemaReaderOptions {
        &self.options
    }

    /// Run one public operation under the cache lock
    fn with_session<T>(
        &self,
        load: impl FnOnce(&mut LoadSession<'_>) -> Result<(), SchemaReadError>,
        fetch: impl FnOnce(&Caches) -> Result<T, SchemaReadError>,
    ) -> Result<T, SchemaReadError> {
        let mut caches = self.caches.lock();
        let mut session = LoadSession::new(
            &mut *caches,
            &self.store,
            self.instance_codec.as_ref(),
            self.enum_codec.as_ref(),
            self.options.validate_navigation,
        );
        load(&mut session)?;
        session.finish()?;
        fetch(&*caches)
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Get a class by id, building it (and everything it references) on
    /// first use.
    pub fn get_class(&self, id: ClassId) -> Result<Arc<EcClass>, SchemaReadError> {
        self.with_session(
            |session| session.get_class(id).map(|_| ()),
            |caches| caches.shared_class(id),
        )
    }

    /// Get a class by schema name and class name
    ///
    /// Returns `Ok(None)` if no such class exists.
    pub fn get_class_by_name(
        &self,
        schema_name: &str,
        class_name: &str,
    ) -> Result<Option<Arc<EcClass>>, SchemaReadError> {
        match self.store.class_id_by_name(schema_name, class_name)? {
            Some(id) => self.get_class(id).map(Some),
            None => Ok(None),
        }
    }

    /// Get a class by schema alias (namespace prefix) and class name
    pub fn get_class_by_alias(
        &self,
        schema_alias: &str,
        class_name: &str,
    ) -> Result<Option<Arc<EcClass>>, SchemaReadError> {
        match self.store.class_id_by_prefix(schema_alias, class_name)? {
            Some(id) => self.get_class(id).map(Some),
            None => Ok(None),
        }
    }

    /// Get all classes directly deriving from `base_id`
    pub fn get_derived_classes(
        &self,
        base_id: ClassId,
    ) -> Result<Vec<Arc<EcClass>>, SchemaReadError> {
        let derived = self.store.derived_class_ids(base_id)?;
        self.with_session(
            |session| {
                session.get_class(base_id)?;
                for id in &derived {
                    session.get_class(*id)?;
                }
                Ok(())
            },
            |caches| derived.iter().map(|id| caches.shared_class(*id)).collect(),
        )
    }

    // =========================================================================
    // Schemas
    // =========================================================================

    /// Get a schema by id. With `ensure_all_classes_loaded`, every class and
    /// enumeration of the schema and its references is built as well.
    pub fn get_schema(
        &self,
        id: SchemaId,
        ensure_all_classes_loaded: bool,
    ) -> Result<Arc<EcSchema>, SchemaReadError> {
        self.with_session(
            |session| {
                if ensure_all_classes_loaded {
                    session.ensure_all_classes_loaded(id, &mut HashSet::new())
                } else {
                    session.ensure_schema(id).map(|_| ())
                }
            },
            |caches| caches.shared_schema(id),
        )
    }

    /// Get a schema by name, or `Ok(None)` if no such schema exists
    pub fn get_schema_by_name(
        &self,
        name: &str,
        ensure_all_classes_loaded: bool,
    ) -> Result<Option<Arc<EcSchema>>, SchemaReadError> {
        match self.store.schema_id_by_name(name)? {
            Some(id) => self.get_schema(id, ensure_all_classes_loaded).map(Some),
            None => Ok(None),
        }
    }

    /// Build every class and enumeration of a schema and of all schemas it
    /// references. A no-op once the schema is fully loaded.
    pub fn ensure_all_classes_loaded(&self, id: SchemaId) -> Result<(), SchemaReadError> {
        self.with_session(
            |session| session.ensure_all_classes_loaded(id, &mut HashSet::new()),
            |_| Ok(()),
        )
    }

    /// Whether every class and enumeration of a cached schema has been built.
    ///
    /// Never touches the store; an uncached schema is reported as not loaded.
    pub fn is_fully_loaded(&self, id: SchemaId) -> bool {
        self.caches.lock().is_fully_loaded(id)
    }

    /// `(loaded, total)` type counts of a cached schema, `None` if uncached
    pub fn schema_load_progress(&self, id: SchemaId) -> Option<(u32, u32)> {
        self.caches
            .lock()
            .schemas
            .get(&id)
            .map(|entry| (entry.loaded_type_count, entry.total_type_count))
    }

    /// Check whether a schema with this name exists in the store
    pub fn contains_schema(&self, name: &str) -> Result<bool, SchemaReadError> {
        Ok(self.store.schema_id_by_name(name)?.is_some())
    }

    // =========================================================================
    // Enumerations
    // =========================================================================

    pub fn get_enumeration(
        &self,
        id: EnumerationId,
    ) -> Result<Arc<EcEnumeration>, SchemaReadError> {
        self.with_session(
            |session| session.get_enumeration(id).map(|_| ()),
            |caches| caches.shared_enumeration(id),
        )
    }

    /// Get an enumeration by schema name and enumeration name
    pub fn get_enumeration_by_name(
        &self,
        schema_name: &str,
        enumeration_name: &str,
    ) -> Result<Option<Arc<EcEnumeration>>, SchemaReadError> {
        match self
            .store
            .enumeration_id_by_name(schema_name, enumeration_name)?
        {
            Some(id) => self.get_enumeration(id).map(Some),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List all schemas in the store without loading them
    pub fn schema_keys(&self) -> Result<Vec<SchemaKey>, SchemaReadError> {
        Ok(self.store.schema_keys()?)
    }

    /// List the classes of a schema without loading them
    pub fn class_keys(&self, schema_id: SchemaId) -> Result<Vec<ClassKey>, SchemaReadError> {
        Ok(self.store.class_keys(schema_id)?)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop every cached schema, class and enumeration.
    ///
    /// Objects already handed out stay valid but are no longer returned;
    /// the next lookup rebuilds from the store.
    pub fn clear_cache(&self) {
        let mut caches = self.caches.lock();
        info!(
            "Clearing schema cache ({} schemas, {} classes, {} enumerations)",
            caches.schemas.len(),
            caches.classes.len(),
            caches.enumerations.len()
        );
        caches.clear();
    }

    /// Get a snapshot of cache metrics
    pub fn cache_metrics(&self) -> CacheMetrics {
        self.caches.lock().metrics.clone()
    }

    /// Get statistics about the reader's caches
    pub fn stats(&self) -> ReaderStats {
        let caches = self.caches.lock();
        ReaderStats {
            cached_schemas: caches.schemas.len(),
            cached_classes: caches.classes.len(),
            cached_enumerations: caches.enumerations.len(),
            fully_loaded_schemas: caches.fully_loaded_schema_count(),
            hits: caches.metrics.hits,
            misses: caches.metrics.misses,
            hit_rate: caches.metrics.hit_rate(),
        }
    }
}
