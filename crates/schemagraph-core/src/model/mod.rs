//! In-memory schema object model
//!
//! The graph produced by the reader. Cross-entity references (base classes,
//! struct and navigation targets, schema references) are stored as ids and
//! resolved through the id-keyed caches of the reader, so the graph may be
//! cyclic without reference-counted cycles.

pub mod class;
pub mod custom_attribute;
pub mod enumeration;
pub mod ids;
pub mod kinds;
pub mod property;
pub mod schema;

pub use class::{
    Cardinality, ClassKind, ConstraintClass, EcClass, RelationshipConstraint, RelationshipInfo,
};
pub use custom_attribute::{CustomAttributeInstance, InstanceValues};
pub use enumeration::{EcEnumeration, Enumerator, EnumeratorValue};
pub use ids::{ClassId, EnumerationId, PropertyId, SchemaId};
pub use kinds::{
    ClassModifier, ClassType, ContainerType, PrimitiveType, PropertyKind, RelatedDirection,
    RelationshipEnd, StrengthType,
};
pub use property::{ArrayBounds, EcProperty, PropertyType};
pub use schema::EcSchema;
