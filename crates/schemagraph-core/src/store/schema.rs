//! SQLite Table Definitions for the Metadata Store
//!
//! Normalized tables holding schemas, classes, properties, enumerations,
//! custom attributes and relationship constraints. Classification columns
//! hold the integer codes of `model::kinds`.

/// Layout version of a metadata store database
pub const STORE_SCHEMA_VERSION: &str = "1.0";

/// SQL to create the schema tables
pub const SCHEMA_CREATE_SCHEMAS: &str = r#"
CREATE TABLE IF NOT EXISTS ec_Schema (
    Id INTEGER PRIMARY KEY NOT NULL,
    Name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    DisplayLabel TEXT,
    Description TEXT,

    -- Namespace prefix used to qualify class names
    Prefix TEXT UNIQUE COLLATE NOCASE,

    VersionMajor INTEGER NOT NULL,
    VersionMinor INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ec_SchemaReference (
    SchemaId INTEGER NOT NULL,
    ReferencedSchemaId INTEGER NOT NULL,
    PRIMARY KEY (SchemaId, ReferencedSchemaId)
)
"#;

/// SQL to create the class tables
pub const SCHEMA_CREATE_CLASSES: &str = r#"
CREATE TABLE IF NOT EXISTS ec_Class (
    Id INTEGER PRIMARY KEY NOT NULL,
    SchemaId INTEGER NOT NULL,
    Name TEXT NOT NULL COLLATE NOCASE,
    DisplayLabel TEXT,
    Description TEXT,

    -- Entity=0, Relationship=1, Struct=2, CustomAttribute=3
    Type INTEGER NOT NULL,

    -- None=0, Abstract=1, Sealed=2
    Modifier INTEGER NOT NULL DEFAULT 0,

    -- Relationship classes only
    RelationStrength INTEGER,
    RelationStrengthDirection INTEGER,

    UNIQUE (SchemaId, Name)
);

CREATE TABLE IF NOT EXISTS ec_BaseClass (
    ClassId INTEGER NOT NULL,
    BaseClassId INTEGER NOT NULL,
    Ordinal INTEGER NOT NULL,
    PRIMARY KEY (ClassId, BaseClassId)
);

CREATE TABLE IF NOT EXISTS ec_Property (
    Id INTEGER PRIMARY KEY NOT NULL,
    ClassId INTEGER NOT NULL,
    Name TEXT NOT NULL COLLATE NOCASE,
    DisplayLabel TEXT,
    Description TEXT,
    IsReadonly INTEGER NOT NULL DEFAULT 0,

    -- Primitive=0, Struct=1, PrimitiveArray=2, StructArray=3, Navigation=4, Enumeration=5
    Kind INTEGER NOT NULL,

    PrimitiveType INTEGER,

    -- Struct class, or relationship class for navigation properties
    NonPrimitiveType INTEGER,

    EnumerationId INTEGER,
    ArrayMinOccurs INTEGER,
    ArrayMaxOccurs INTEGER,
    NavigationDirection INTEGER,
    Ordinal INTEGER NOT NULL,

    UNIQUE (ClassId, Name)
)
"#;

/// SQL to create the enumeration table
pub const SCHEMA_CREATE_ENUMERATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS ec_Enumeration (
    Id INTEGER PRIMARY KEY NOT NULL,
    SchemaId INTEGER NOT NULL,
    Name TEXT NOT NULL COLLATE NOCASE,
    DisplayLabel TEXT,
    Description TEXT,
    UnderlyingType INTEGER NOT NULL,
    IsStrict INTEGER NOT NULL DEFAULT 1,

    -- Serialized enumerator list
    ValuesPayload TEXT,

    UNIQUE (SchemaId, Name)
)
"#;

/// SQL to create the custom attribute and relationship constraint tables
pub const SCHEMA_CREATE_ATTACHMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS ec_CustomAttribute (
    ContainerId INTEGER NOT NULL,

    -- Schema=1, Class=2, Property=3, SourceConstraint=4, TargetConstraint=5
    ContainerType INTEGER NOT NULL,

    ClassId INTEGER NOT NULL,
    Ordinal INTEGER NOT NULL,
    InstancePayload TEXT,
    PRIMARY KEY (ContainerId, ContainerType, ClassId)
);

CREATE TABLE IF NOT EXISTS ec_RelationshipConstraint (
    ClassId INTEGER NOT NULL,

    -- Source=0, Target=1
    RelationshipEnd INTEGER NOT NULL,

    LowerCardinality INTEGER NOT NULL,
    UpperCardinality INTEGER,
    IsPolymorphic INTEGER NOT NULL DEFAULT 1,
    RoleLabel TEXT,
    PRIMARY KEY (ClassId, RelationshipEnd)
);

CREATE TABLE IF NOT EXISTS ec_RelationshipConstraintClass (
    ClassId INTEGER NOT NULL,
    RelationshipEnd INTEGER NOT NULL,
    ConstraintClassId INTEGER NOT NULL,
    Ordinal INTEGER NOT NULL,

    -- Serialized key property names
    KeyProperties TEXT,

    PRIMARY KEY (ClassId, RelationshipEnd, ConstraintClassId)
)
"#;

/// SQL to create indexes for the reverse lookups
pub const SCHEMA_CREATE_INDEXES: &str = r#"
-- Classes of a schema
CREATE INDEX IF NOT EXISTS idx_class_schema ON ec_Class(SchemaId);

-- Derived classes of a base class
CREATE INDEX IF NOT EXISTS idx_baseclass_base ON ec_BaseClass(BaseClassId);

-- Properties of a class in declaration order
CREATE INDEX IF NOT EXISTS idx_property_class ON ec_Property(ClassId, Ordinal);

-- Enumerations of a schema
CREATE INDEX IF NOT EXISTS idx_enumeration_schema ON ec_Enumeration(SchemaId);
"#;

/// SQL to create the metadata table
///
/// Stores store-level metadata like the layout version.
pub const SCHEMA_CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS store_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)
"#;

/// Column names for property queries (in order for row mapping)
pub const PROPERTY_COLUMNS: &str = "Kind, Id, Name, DisplayLabel, Description, IsReadonly, \
     PrimitiveType, NonPrimitiveType, EnumerationId, ArrayMinOccurs, ArrayMaxOccurs, \
     NavigationDirection";
