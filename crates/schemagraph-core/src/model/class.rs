//! Classes and relationship constraints

use serde::Serialize;
use std::fmt;

use super::custom_attribute::CustomAttributeInstance;
use super::ids::{ClassId, SchemaId};
use super::kinds::{ClassModifier, ClassType, RelatedDirection, RelationshipEnd, StrengthType};
use super::property::EcProperty;

// ============================================================================
// Relationship Constraints
// ============================================================================

/// Multiplicity of a constraint end. `upper == None` is unbounded (`N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cardinality {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl Cardinality {
    pub const ZERO_ONE: Cardinality = Cardinality {
        lower: 0,
        upper: Some(1),
    };
    pub const ONE_ONE: Cardinality = Cardinality {
        lower: 1,
        upper: Some(1),
    };
    pub const ZERO_MANY: Cardinality = Cardinality {
        lower: 0,
        upper: None,
    };
    pub const ONE_MANY: Cardinality = Cardinality {
        lower: 1,
        upper: None,
    };
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::ZERO_ONE
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "({},{})", self.lower, upper),
            None => write!(f, "({},N)", self.lower),
        }
    }
}

/// An entity class allowed at a constraint end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintClass {
    pub class_id: ClassId,
    /// Names of the properties keying the related instance, if declared
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_properties: Vec<String>,
}

/// The source or target end of a relationship class.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipConstraint {
    end: RelationshipEnd,
    cardinality: Cardinality,
    is_polymorphic: bool,
    role_label: Option<String>,
    classes: Vec<ConstraintClass>,
    custom_attributes: Vec<CustomAttributeInstance>,
}

impl RelationshipConstraint {
    pub fn new(end: RelationshipEnd) -> Self {
        Self {
            end,
            cardinality: Cardinality::default(),
            is_polymorphic: true,
            role_label: None,
            classes: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    pub fn end(&self) -> RelationshipEnd {
        self.end
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Whether subclasses of the constraint classes are also allowed
    pub fn is_polymorphic(&self) -> bool {
        self.is_polymorphic
    }

    pub fn role_label(&self) -> Option<&str> {
        self.role_label.as_deref()
    }

    pub fn classes(&self) -> &[ConstraintClass] {
        &self.classes
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.classes.iter().map(|c| c.class_id)
    }

    pub fn custom_attributes(&self) -> &[CustomAttributeInstance] {
        &self.custom_attributes
    }

    pub(crate) fn set_details(
        &mut self,
        cardinality: Cardinality,
        is_polymorphic: bool,
        role_label: Option<String>,
    ) {
        self.cardinality = cardinality;
        self.is_polymorphic = is_polymorphic;
        self.role_label = role_label;
    }

    pub(crate) fn add_class(&mut self, class: ConstraintClass) {
        self.classes.push(class);
    }

    pub(crate) fn set_custom_attributes(&mut self, attributes: Vec<CustomAttributeInstance>) {
        self.custom_attributes = attributes;
    }
}

/// Relationship-specific part of a class.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipInfo {
    pub strength: StrengthType,
    pub strength_direction: RelatedDirection,
    pub source: RelationshipConstraint,
    pub target: RelationshipConstraint,
}

impl RelationshipInfo {
    pub fn new(strength: StrengthType, strength_direction: RelatedDirection) -> Self {
        Self {
            strength,
            strength_direction,
            source: RelationshipConstraint::new(RelationshipEnd::Source),
            target: RelationshipConstraint::new(RelationshipEnd::Target),
        }
    }

    pub fn constraint(&self, end: RelationshipEnd) -> &RelationshipConstraint {
        match end {
            RelationshipEnd::Source => &self.source,
            RelationshipEnd::Target => &self.target,
        }
    }

    pub(crate) fn constraint_mut(&mut self, end: RelationshipEnd) -> &mut RelationshipConstraint {
        match end {
            RelationshipEnd::Source => &mut self.source,
            RelationshipEnd::Target => &mut self.target,
        }
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Variant-specific part of a class.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassKind {
    Entity,
    Struct,
    CustomAttribute,
    Relationship(RelationshipInfo),
}

/// A typed definition with ordered base classes and properties.
///
/// Base classes are held by id; resolve them through the reader.
#[derive(Debug, Clone, Serialize)]
pub struct EcClass {
    id: ClassId,
    schema_id: SchemaId,
    name: String,
    display_label: Option<String>,
    description: Option<String>,
    modifier: ClassModifier,
    kind: ClassKind,
    base_classes: Vec<ClassId>,
    properties: Vec<EcProperty>,
    custom_attributes: Vec<CustomAttributeInstance>,
}

impl EcClass {
    /// Create an empty class shell bound to its schema
    pub fn new(id: ClassId, schema_id: SchemaId, name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            id,
            schema_id,
            name: name.into(),
            display_label: None,
            description: None,
            modifier: ClassModifier::None,
            kind,
            base_classes: Vec::new(),
            properties: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_label(&self) -> &str {
        self.display_label.as_deref().unwrap_or(&self.name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn modifier(&self) -> ClassModifier {
        self.modifier
    }

    pub fn kind(&self) -> &ClassKind {
        &self.kind
    }

    pub fn class_type(&self) -> ClassType {
        match self.kind {
            ClassKind::Entity => ClassType::Entity,
            ClassKind::Struct => ClassType::Struct,
            ClassKind::CustomAttribute => ClassType::CustomAttribute,
            ClassKind::Relationship(_) => ClassType::Relationship,
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self.kind, ClassKind::Entity)
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, ClassKind::Struct)
    }

    pub fn is_custom_attribute(&self) -> bool {
        matches!(self.kind, ClassKind::CustomAttribute)
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self.kind, ClassKind::Relationship(_))
    }

    pub fn relationship(&self) -> Option<&RelationshipInfo> {
        match &self.kind {
            ClassKind::Relationship(info) => Some(info),
            _ => None,
        }
    }

    /// Direct base classes in declaration order
    pub fn base_classes(&self) -> &[ClassId] {
        &self.base_classes
    }

    /// Properties declared on this class, in declaration order
    pub fn properties(&self) -> &[EcProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&EcProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn custom_attributes(&self) -> &[CustomAttributeInstance] {
        &self.custom_attributes
    }

    pub fn custom_attribute(&self, class_name: &str) -> Option<&CustomAttributeInstance> {
        self.custom_attributes
            .iter()
            .find(|ca| ca.class_name() == class_name)
    }

    pub(crate) fn set_details(
        &mut self,
        display_label: Option<String>,
        description: Option<String>,
        modifier: ClassModifier,
    ) {
        self.display_label = display_label;
        self.description = description;
        self.modifier = modifier;
    }

    pub(crate) fn add_base_class(&mut self, id: ClassId) {
        self.base_classes.push(id);
    }

    pub(crate) fn add_property(&mut self, property: EcProperty) {
        self.properties.push(property);
    }

    pub(crate) fn set_custom_attributes(&mut self, attributes: Vec<CustomAttributeInstance>) {
        self.custom_attributes = attributes;
    }

    pub(crate) fn relationship_mut(&mut self) -> Option<&mut RelationshipInfo> {
        match &mut self.kind {
            ClassKind::Relationship(info) => Some(info),
            _ => None,
        }
    }
}
