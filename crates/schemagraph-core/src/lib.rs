//! SchemaGraph Core - Lazy schema metadata loading
//!
//! This crate reconstructs an in-memory schema object graph from a
//! normalized relational store, on demand:
//! - Object model for schemas, classes, properties, enumerations and
//!   relationship constraints
//! - A read-only store boundary with a SQLite implementation
//! - Payload codecs for custom attribute instances and enumeration values
//! - A cycle-safe, cached reader that builds each entity at most once

pub mod codec;
pub mod model;
pub mod reader;
pub mod store;

// Model re-exports
pub use model::{
    ArrayBounds, Cardinality, ClassId, ClassKind, ClassModifier, ClassType, ConstraintClass,
    ContainerType, CustomAttributeInstance, EcClass, EcEnumeration, EcProperty, EcSchema,
    EnumerationId, Enumerator, EnumeratorValue, InstanceValues, PrimitiveType, PropertyId,
    PropertyKind, PropertyType, RelatedDirection, RelationshipConstraint, RelationshipEnd,
    RelationshipInfo, SchemaId, StrengthType,
};

// Store re-exports
pub use store::{ClassKey, MetadataStore, SchemaKey, SqliteStore, StoreError};

// Codec re-exports
pub use codec::{CodecError, EnumCodec, InstanceCodec, JsonCodec};

// Reader re-exports
pub use reader::{
    CacheMetrics, ErrorKind, ReaderStats, SchemaReadError, SchemaReader, SchemaReaderOptions,
};
