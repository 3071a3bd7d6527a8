//! Common test utilities for integration tests.
//!
//! Seeded in-memory stores and a store wrapper that counts queries.

#![allow(dead_code)]

use std::collections::HashMap;

use parking_lot::Mutex;
use schemagraph_core::store::{
    ClassRow, ConstraintClassRow, ConstraintRow, CustomAttributeRow, EnumerationRow, PropertyRow,
    SchemaRow,
};
use schemagraph_core::{
    ClassId, ClassKey, ContainerType, EnumerationId, MetadataStore, RelationshipEnd, SchemaId,
    SchemaKey, SchemaReader, SqliteStore, StoreError,
};

/// Property kind codes as stored in `ec_Property.Kind`
pub mod kind {
    pub const PRIMITIVE: i32 = 0;
    pub const STRUCT: i32 = 1;
    pub const PRIMITIVE_ARRAY: i32 = 2;
    pub const STRUCT_ARRAY: i32 = 3;
    pub const NAVIGATION: i32 = 4;
    pub const ENUMERATION: i32 = 5;
}

/// Primitive type codes as stored in `ec_Property.PrimitiveType`
pub mod primitive {
    pub const DOUBLE: i32 = 0x401;
    pub const INTEGER: i32 = 0x501;
    pub const STRING: i32 = 0x901;
}

/// In-memory store seeded with `sql`
pub fn store_with(sql: &str) -> SqliteStore {
    let store = SqliteStore::in_memory().expect("Failed to open in-memory store");
    store
        .connection()
        .execute_batch(sql)
        .expect("Failed to seed store");
    store
}

pub fn reader_with(sql: &str) -> SchemaReader<SqliteStore> {
    SchemaReader::new(store_with(sql))
}

/// Reader over a seeded store that counts every query
pub fn counting_reader_with(sql: &str) -> SchemaReader<CountingStore<SqliteStore>> {
    SchemaReader::new(CountingStore::new(store_with(sql)))
}

// ============================================================================
// Fixtures
// ============================================================================

/// `Widgets` (1) with `Bolt` (10, one double property `Length`) and
/// `Widget` (11) deriving from `Bolt` and from `Nut` (21) in `Fasteners` (2).
pub const WIDGETS: &str = r#"
    INSERT INTO ec_Schema (Id, Name, Prefix, VersionMajor, VersionMinor) VALUES (1, 'Widgets', 'wdg', 1, 0);
    INSERT INTO ec_Schema (Id, Name, Prefix, VersionMajor, VersionMinor) VALUES (2, 'Fasteners', 'fst', 2, 1);

    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (10, 1, 'Bolt', 0);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (11, 1, 'Widget', 0);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (21, 2, 'Nut', 0);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (22, 2, 'Washer', 0);

    INSERT INTO ec_BaseClass (ClassId, BaseClassId, Ordinal) VALUES (11, 21, 1);
    INSERT INTO ec_BaseClass (ClassId, BaseClassId, Ordinal) VALUES (11, 10, 0);

    INSERT INTO ec_Property (Id, ClassId, Name, Kind, PrimitiveType, Ordinal) VALUES (100, 10, 'Length', 0, 1025, 0);
"#;

/// `Paint` (12) with two properties typed by the `Color` enumeration (30)
pub const PAINT: &str = r#"
    INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (1, 'Widgets', 1, 0);

    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (12, 1, 'Paint', 0);
    INSERT INTO ec_Enumeration (Id, SchemaId, Name, UnderlyingType, ValuesPayload)
        VALUES (30, 1, 'Color', 1281, '[{"value": 0, "label": "Red"}, {"value": 1, "label": "Blue"}]');

    INSERT INTO ec_Property (Id, ClassId, Name, Kind, EnumerationId, Ordinal) VALUES (120, 12, 'Shade', 5, 30, 0);
    INSERT INTO ec_Property (Id, ClassId, Name, Kind, EnumerationId, Ordinal) VALUES (121, 12, 'Trim', 5, 30, 1);
"#;

/// Relationship `Contains` (40) from `Container` (41) to `Item` (42). `Item`
/// has no navigation; `Container.Items` navigates forward through `Contains`.
pub const CONTAINS: &str = r#"
    INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (1, 'Storage', 1, 0);

    INSERT INTO ec_Class (Id, SchemaId, Name, Type, RelationStrength, RelationStrengthDirection)
        VALUES (40, 1, 'Contains', 1, 2, 1);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (41, 1, 'Container', 0);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (42, 1, 'Item', 0);

    INSERT INTO ec_RelationshipConstraint (ClassId, RelationshipEnd, LowerCardinality, UpperCardinality, IsPolymorphic, RoleLabel)
        VALUES (40, 0, 1, 1, 0, 'contains');
    INSERT INTO ec_RelationshipConstraint (ClassId, RelationshipEnd, LowerCardinality, UpperCardinality, IsPolymorphic, RoleLabel)
        VALUES (40, 1, 0, -1, 1, 'is contained by');
    INSERT INTO ec_RelationshipConstraintClass (ClassId, RelationshipEnd, ConstraintClassId, Ordinal)
        VALUES (40, 0, 41, 0);
    INSERT INTO ec_RelationshipConstraintClass (ClassId, RelationshipEnd, ConstraintClassId, Ordinal, KeyProperties)
        VALUES (40, 1, 42, 0, '["Serial"]');

    INSERT INTO ec_Property (Id, ClassId, Name, Kind, NonPrimitiveType, NavigationDirection, Ordinal)
        VALUES (410, 41, 'Items', 4, 40, 1, 0);
    INSERT INTO ec_Property (Id, ClassId, Name, Kind, PrimitiveType, Ordinal) VALUES (420, 42, 'Serial', 0, 2305, 0);
"#;

// ============================================================================
// Counting Store
// ============================================================================

/// Wraps a store and counts calls per query
pub struct CountingStore<S> {
    inner: S,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl<S: MetadataStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Calls made to one query
    pub fn count(&self, query: &str) -> usize {
        self.calls.lock().get(query).copied().unwrap_or(0)
    }

    /// Calls made to all queries
    pub fn total(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, query: &'static str) {
        *self.calls.lock().entry(query).or_insert(0) += 1;
    }
}

impl<S: MetadataStore> MetadataStore for CountingStore<S> {
    fn schema_row(&self, id: SchemaId) -> Result<Option<SchemaRow>, StoreError> {
        self.record("schema_row");
        self.inner.schema_row(id)
    }

    fn schema_references(&self, id: SchemaId) -> Result<Vec<SchemaId>, StoreError> {
        self.record("schema_references");
        self.inner.schema_references(id)
    }

    fn class_row(&self, id: ClassId) -> Result<Option<ClassRow>, StoreError> {
        self.record("class_row");
        self.inner.class_row(id)
    }

    fn base_class_ids(&self, id: ClassId) -> Result<Vec<ClassId>, StoreError> {
        self.record("base_class_ids");
        self.inner.base_class_ids(id)
    }

    fn property_rows(&self, class_id: ClassId) -> Result<Vec<PropertyRow>, StoreError> {
        self.record("property_rows");
        self.inner.property_rows(class_id)
    }

    fn enumeration_row(&self, id: EnumerationId) -> Result<Option<EnumerationRow>, StoreError> {
        self.record("enumeration_row");
        self.inner.enumeration_row(id)
    }

    fn custom_attribute_rows(
        &self,
        container_id: i64,
        container_type: ContainerType,
    ) -> Result<Vec<CustomAttributeRow>, StoreError> {
        self.record("custom_attribute_rows");
        self.inner.custom_attribute_rows(container_id, container_type)
    }

    fn constraint_row(
        &self,
        class_id: ClassId,
        end: RelationshipEnd,
    ) -> Result<Option<ConstraintRow>, StoreError> {
        self.record("constraint_row");
        self.inner.constraint_row(class_id, end)
    }

    fn constraint_class_rows(
        &self,
        class_id: ClassId,
        end: RelationshipEnd,
    ) -> Result<Vec<ConstraintClassRow>, StoreError> {
        self.record("constraint_class_rows");
        self.inner.constraint_class_rows(class_id, end)
    }

    fn class_id_by_name(
        &self,
        schema_name: &str,
        class_name: &str,
    ) -> Result<Option<ClassId>, StoreError> {
        self.record("class_id_by_name");
        self.inner.class_id_by_name(schema_name, class_name)
    }

    fn class_id_by_prefix(
        &self,
        schema_prefix: &str,
        class_name: &str,
    ) -> Result<Option<ClassId>, StoreError> {
        self.record("class_id_by_prefix");
        self.inner.class_id_by_prefix(schema_prefix, class_name)
    }

    fn enumeration_id_by_name(
        &self,
        schema_name: &str,
        enumeration_name: &str,
    ) -> Result<Option<EnumerationId>, StoreError> {
        self.record("enumeration_id_by_name");
        self.inner.enumeration_id_by_name(schema_name, enumeration_name)
    }

    fn schema_id_by_name(&self, name: &str) -> Result<Option<SchemaId>, StoreError> {
        self.record("schema_id_by_name");
        self.inner.schema_id_by_name(name)
    }

    fn class_ids_in_schema(&self, schema_id: SchemaId) -> Result<Vec<ClassId>, StoreError> {
        self.record("class_ids_in_schema");
        self.inner.class_ids_in_schema(schema_id)
    }

    fn enumeration_ids_in_schema(
        &self,
        schema_id: SchemaId,
    ) -> Result<Vec<EnumerationId>, StoreError> {
        self.record("enumeration_ids_in_schema");
        self.inner.enumeration_ids_in_schema(schema_id)
    }

    fn derived_class_ids(&self, base_id: ClassId) -> Result<Vec<ClassId>, StoreError> {
        self.record("derived_class_ids");
        self.inner.derived_class_ids(base_id)
    }

    fn schema_keys(&self) -> Result<Vec<SchemaKey>, StoreError> {
        self.record("schema_keys");
        self.inner.schema_keys()
    }

    fn class_keys(&self, schema_id: SchemaId) -> Result<Vec<ClassKey>, StoreError> {
        self.record("class_keys");
        self.inner.class_keys(schema_id)
    }
}
