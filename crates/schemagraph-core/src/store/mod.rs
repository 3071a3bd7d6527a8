//! Metadata Store Boundary
//!
//! The reader never talks to a database directly. It consumes the fixed,
//! parametrized queries of [`MetadataStore`], each returning plain rows with
//! classification columns left as raw integer codes. Decoding and validating
//! those codes is the reader's job.
//!
//! # Architecture
//!
//! ```text
//! SchemaReader
//! └── MetadataStore (trait, read-only)
//!     └── SqliteStore (rusqlite, one connection behind a mutex)
//!         ├── ec_Schema / ec_SchemaReference
//!         ├── ec_Class / ec_BaseClass / ec_Property
//!         ├── ec_Enumeration
//!         ├── ec_CustomAttribute
//!         └── ec_RelationshipConstraint / ec_RelationshipConstraintClass
//! ```

pub mod schema;
pub mod sqlite;

use serde::Serialize;
use thiserror::Error;

use crate::model::{ClassId, ContainerType, EnumerationId, PropertyId, RelationshipEnd, SchemaId};

pub use sqlite::SqliteStore;

/// Errors raised while executing a store query
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store layout version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: String, found: String },

    #[error("Store backend error: {0}")]
    Backend(String),
}

// ============================================================================
// Rows
// ============================================================================

/// Own attributes of a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRow {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub prefix: Option<String>,
    pub version_major: u32,
    pub version_minor: u32,
    /// Number of classes plus enumerations declared in the schema
    pub type_count: u32,
}

/// Own attributes of a class. Classification columns are raw codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRow {
    pub schema_id: SchemaId,
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub class_type: i32,
    pub modifier: i32,
    pub relationship_strength: Option<i32>,
    pub relationship_strength_direction: Option<i32>,
}

/// One property of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRow {
    pub kind: i32,
    pub id: PropertyId,
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub is_readonly: bool,
    pub primitive_type: Option<i32>,
    /// Struct class (struct kinds) or relationship class (navigation)
    pub non_primitive_type: Option<ClassId>,
    pub enumeration_id: Option<EnumerationId>,
    pub array_min_occurs: Option<i64>,
    /// Negative means unbounded
    pub array_max_occurs: Option<i64>,
    pub navigation_direction: Option<i32>,
}

/// Own attributes of an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationRow {
    pub schema_id: SchemaId,
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub underlying_type: i32,
    pub is_strict: bool,
    pub values_payload: Option<String>,
}

/// One custom attribute attached to a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomAttributeRow {
    pub class_id: ClassId,
    pub instance_payload: Option<String>,
}

/// One end of a relationship class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRow {
    pub lower_cardinality: i64,
    /// `None` or negative means unbounded
    pub upper_cardinality: Option<i64>,
    pub is_polymorphic: bool,
    pub role_label: Option<String>,
}

/// One class allowed at a relationship constraint end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintClassRow {
    pub class_id: ClassId,
    pub key_properties: Option<String>,
}

/// Catalog entry for a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaKey {
    pub id: SchemaId,
    pub name: String,
    pub version_major: u32,
    pub version_minor: u32,
    pub display_label: Option<String>,
}

/// Catalog entry for a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassKey {
    pub id: ClassId,
    pub name: String,
    pub display_label: Option<String>,
}

// ============================================================================
// Store Trait
// ============================================================================

/// Read-only access to the normalized metadata tables.
///
/// Lookups of a single row return `Ok(None)` when the row is missing; the
/// reader decides whether that is an error. List queries preserve the
/// declared ordinal order where one exists.
pub trait MetadataStore: Send + Sync {
    /// Own row of a schema
    fn schema_row(&self, id: SchemaId) -> Result<Option<SchemaRow>, StoreError>;

    /// Ids of the schemas a schema references
    fn schema_references(&self, id: SchemaId) -> Result<Vec<SchemaId>, StoreError>;

    /// Own row of a class
    fn class_row(&self, id: ClassId) -> Result<Option<ClassRow>, StoreError>;

    /// Direct base classes, ordered by ordinal
    fn base_class_ids(&self, id: ClassId) -> Result<Vec<ClassId>, StoreError>;

    /// Properties of a class, ordered by ordinal
    fn property_rows(&self, class_id: ClassId) -> Result<Vec<PropertyRow>, StoreError>;

    /// Own row of an enumeration
    fn enumeration_row(&self, id: EnumerationId) -> Result<Option<EnumerationRow>, StoreError>;

    /// Custom attributes of a container, ordered by ordinal
    fn custom_attribute_rows(
        &self,
        container_id: i64,
        container_type: ContainerType,
    ) -> Result<Vec<CustomAttributeRow>, StoreError>;

    /// One end of a relationship class
    fn constraint_row(
        &self,
        class_id: ClassId,
        end: RelationshipEnd,
    ) -> Result<Option<ConstraintRow>, StoreError>;

    /// Classes allowed at one end of a relationship class, ordered by ordinal
    fn constraint_class_rows(
        &self,
        class_id: ClassId,
        end: RelationshipEnd,
    ) -> Result<Vec<ConstraintClassRow>, StoreError>;

    fn class_id_by_name(
        &self,
        schema_name: &str,
        class_name: &str,
    ) -> Result<Option<ClassId>, StoreError>;

    /// Class id keyed by the schema's namespace prefix instead of its name
    fn class_id_by_prefix(
        &self,
        schema_prefix: &str,
        class_name: &str,
    ) -> Result<Option<ClassId>, StoreError>;

    fn enumeration_id_by_name(
        &self,
        schema_name: &str,
        enumeration_name: &str,
    ) -> Result<Option<EnumerationId>, StoreError>;

    fn schema_id_by_name(&self, name: &str) -> Result<Option<SchemaId>, StoreError>;

    /// Ids of all classes declared in a schema
    fn class_ids_in_schema(&self, schema_id: SchemaId) -> Result<Vec<ClassId>, StoreError>;

    /// Ids of all enumerations declared in a schema
    fn enumeration_ids_in_schema(
        &self,
        schema_id: SchemaId,
    ) -> Result<Vec<EnumerationId>, StoreError>;

    /// Classes listing `base_id` as a direct base class
    fn derived_class_ids(&self, base_id: ClassId) -> Result<Vec<ClassId>, StoreError>;

    /// All schemas, ordered by name
    fn schema_keys(&self) -> Result<Vec<SchemaKey>, StoreError>;

    /// All classes of a schema, ordered by name
    fn class_keys(&self, schema_id: SchemaId) -> Result<Vec<ClassKey>, StoreError>;
}
