//! Persisted type codes
//!
//! The store keeps every classification as a small integer. Each enum here
//! maps its codes both ways; `from_code` returns `None` for anything it does
//! not recognize so the reader can surface a corrupt row instead of guessing.

use serde::{Deserialize, Serialize};

// ============================================================================
// Class Classification
// ============================================================================

/// Persisted class type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    /// Regular entity class
    Entity,
    /// Relationship class with source and target constraints
    Relationship,
    /// Struct class, only usable as a property type
    Struct,
    /// Custom attribute class, only usable as an attribute type
    CustomAttribute,
}

impl ClassType {
    pub fn code(self) -> i32 {
        match self {
            ClassType::Entity => 0,
            ClassType::Relationship => 1,
            ClassType::Struct => 2,
            ClassType::CustomAttribute => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ClassType::Entity),
            1 => Some(ClassType::Relationship),
            2 => Some(ClassType::Struct),
            3 => Some(ClassType::CustomAttribute),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClassType::Entity => "entity",
            ClassType::Relationship => "relationship",
            ClassType::Struct => "struct",
            ClassType::CustomAttribute => "custom_attribute",
        }
    }
}

/// Class modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassModifier {
    #[default]
    None,
    Abstract,
    Sealed,
}

impl ClassModifier {
    pub fn code(self) -> i32 {
        match self {
            ClassModifier::None => 0,
            ClassModifier::Abstract => 1,
            ClassModifier::Sealed => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ClassModifier::None),
            1 => Some(ClassModifier::Abstract),
            2 => Some(ClassModifier::Sealed),
            _ => None,
        }
    }
}

/// Lifetime coupling between the two ends of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthType {
    /// Ends exist independently
    #[default]
    Referencing,
    /// The holding end keeps the held end alive
    Holding,
    /// The held end is owned by the embedding end
    Embedding,
}

impl StrengthType {
    pub fn code(self) -> i32 {
        match self {
            StrengthType::Referencing => 0,
            StrengthType::Holding => 1,
            StrengthType::Embedding => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(StrengthType::Referencing),
            1 => Some(StrengthType::Holding),
            2 => Some(StrengthType::Embedding),
            _ => None,
        }
    }
}

/// Direction in which a relationship (or a navigation through it) is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedDirection {
    /// Source to target
    #[default]
    Forward,
    /// Target to source
    Backward,
}

impl RelatedDirection {
    pub fn code(self) -> i32 {
        match self {
            RelatedDirection::Forward => 1,
            RelatedDirection::Backward => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(RelatedDirection::Forward),
            2 => Some(RelatedDirection::Backward),
            _ => None,
        }
    }

    /// The constraint end a navigation in this direction starts from
    pub fn origin_end(self) -> RelationshipEnd {
        match self {
            RelatedDirection::Forward => RelationshipEnd::Source,
            RelatedDirection::Backward => RelationshipEnd::Target,
        }
    }
}

/// One end of a relationship class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipEnd {
    Source,
    Target,
}

impl RelationshipEnd {
    pub fn code(self) -> i32 {
        match self {
            RelationshipEnd::Source => 0,
            RelationshipEnd::Target => 1,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(RelationshipEnd::Source),
            1 => Some(RelationshipEnd::Target),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipEnd::Source => "source",
            RelationshipEnd::Target => "target",
        }
    }

    /// Container type under which custom attributes of this end are stored
    pub fn container_type(self) -> ContainerType {
        match self {
            RelationshipEnd::Source => ContainerType::SourceConstraint,
            RelationshipEnd::Target => ContainerType::TargetConstraint,
        }
    }
}

// ============================================================================
// Property Classification
// ============================================================================

/// Persisted property kind code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Primitive,
    Struct,
    PrimitiveArray,
    StructArray,
    Navigation,
    Enumeration,
}

impl PropertyKind {
    pub fn code(self) -> i32 {
        match self {
            PropertyKind::Primitive => 0,
            PropertyKind::Struct => 1,
            PropertyKind::PrimitiveArray => 2,
            PropertyKind::StructArray => 3,
            PropertyKind::Navigation => 4,
            PropertyKind::Enumeration => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(PropertyKind::Primitive),
            1 => Some(PropertyKind::Struct),
            2 => Some(PropertyKind::PrimitiveArray),
            3 => Some(PropertyKind::StructArray),
            4 => Some(PropertyKind::Navigation),
            5 => Some(PropertyKind::Enumeration),
            _ => None,
        }
    }
}

/// Primitive value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Binary,
    Boolean,
    DateTime,
    Double,
    Integer,
    Long,
    Point2d,
    Point3d,
    String,
    IGeometry,
}

impl PrimitiveType {
    pub fn code(self) -> i32 {
        match self {
            PrimitiveType::Binary => 0x101,
            PrimitiveType::Boolean => 0x201,
            PrimitiveType::DateTime => 0x301,
            PrimitiveType::Double => 0x401,
            PrimitiveType::Integer => 0x501,
            PrimitiveType::Long => 0x601,
            PrimitiveType::Point2d => 0x701,
            PrimitiveType::Point3d => 0x801,
            PrimitiveType::String => 0x901,
            PrimitiveType::IGeometry => 0xa01,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0x101 => Some(PrimitiveType::Binary),
            0x201 => Some(PrimitiveType::Boolean),
            0x301 => Some(PrimitiveType::DateTime),
            0x401 => Some(PrimitiveType::Double),
            0x501 => Some(PrimitiveType::Integer),
            0x601 => Some(PrimitiveType::Long),
            0x701 => Some(PrimitiveType::Point2d),
            0x801 => Some(PrimitiveType::Point3d),
            0x901 => Some(PrimitiveType::String),
            0xa01 => Some(PrimitiveType::IGeometry),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Binary => "binary",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::DateTime => "dateTime",
            PrimitiveType::Double => "double",
            PrimitiveType::Integer => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Point2d => "point2d",
            PrimitiveType::Point3d => "point3d",
            PrimitiveType::String => "string",
            PrimitiveType::IGeometry => "geometry",
        }
    }
}

// ============================================================================
// Custom Attribute Containers
// ============================================================================

/// Kind of entity a custom attribute is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    Schema,
    Class,
    Property,
    SourceConstraint,
    TargetConstraint,
}

impl ContainerType {
    pub fn code(self) -> i32 {
        match self {
            ContainerType::Schema => 1,
            ContainerType::Class => 2,
            ContainerType::Property => 3,
            ContainerType::SourceConstraint => 4,
            ContainerType::TargetConstraint => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ContainerType::Schema),
            2 => Some(ContainerType::Class),
            3 => Some(ContainerType::Property),
            4 => Some(ContainerType::SourceConstraint),
            5 => Some(ContainerType::TargetConstraint),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_codes_are_rejected() {
        assert_eq!(ClassType::from_code(9), None);
        assert_eq!(ClassModifier::from_code(-1), None);
        assert_eq!(StrengthType::from_code(3), None);
        assert_eq!(RelatedDirection::from_code(0), None);
        assert_eq!(PropertyKind::from_code(6), None);
        assert_eq!(PrimitiveType::from_code(0x102), None);
        assert_eq!(RelationshipEnd::from_code(2), None);
        assert_eq!(ContainerType::from_code(0), None);
    }

    #[test]
    fn test_primitive_codes() {
        assert_eq!(PrimitiveType::Double.code(), 0x401);
        assert_eq!(PrimitiveType::from_code(0x901), Some(PrimitiveType::String));
        assert_eq!(PrimitiveType::Integer.as_str(), "int");
    }

    #[test]
    fn test_direction_origin_end() {
        assert_eq!(
            RelatedDirection::Forward.origin_end(),
            RelationshipEnd::Source
        );
        assert_eq!(
            RelatedDirection::Backward.origin_end(),
            RelationshipEnd::Target
        );
    }

    #[test]
    fn test_constraint_container_types() {
        assert_eq!(
            RelationshipEnd::Source.container_type(),
            ContainerType::SourceConstraint
        );
        assert_eq!(
            RelationshipEnd::Target.container_type().code(),
            ContainerType::TargetConstraint.code()
        );
    }
}
