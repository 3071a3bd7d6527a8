//! Integration tests for cyclic graphs, full schema loads, navigation
//! properties and cache invalidation.

mod common;

use std::sync::Arc;

use common::{counting_reader_with, reader_with, store_with, CONTAINS, WIDGETS};
use pretty_assertions::assert_eq;
use schemagraph_core::{
    ClassId, ErrorKind, PropertyType, RelatedDirection, RelationshipEnd, SchemaId, SchemaReader,
    SchemaReaderOptions,
};

// ============================================================================
// Cycles
// ============================================================================

/// `Alpha` (1) and `Beta` (2) reference each other. `Alpha.Leaf` derives from
/// `Beta.Root`, and `Beta.Root` holds a struct typed by `Alpha.Point`.
const MUTUAL: &str = r#"
    INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (1, 'Alpha', 1, 0);
    INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (2, 'Beta', 1, 0);
    INSERT INTO ec_SchemaReference (SchemaId, ReferencedSchemaId) VALUES (1, 2);
    INSERT INTO ec_SchemaReference (SchemaId, ReferencedSchemaId) VALUES (2, 1);

    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (10, 1, 'Leaf', 0);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (11, 1, 'Point', 2);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (20, 2, 'Root', 0);

    INSERT INTO ec_BaseClass (ClassId, BaseClassId, Ordinal) VALUES (10, 20, 0);
    INSERT INTO ec_Property (Id, ClassId, Name, Kind, NonPrimitiveType, Ordinal) VALUES (200, 20, 'Origin', 1, 11, 0);
"#;

#[test]
fn test_mutually_referencing_schemas_load_once() {
    let reader = counting_reader_with(MUTUAL);

    let leaf = reader.get_class(ClassId(10)).unwrap();
    assert_eq!(leaf.base_classes(), &[ClassId(20)]);

    assert_eq!(reader.store().count("schema_row"), 2);
    assert_eq!(reader.store().count("class_row"), 3);

    let alpha = reader.get_schema(SchemaId(1), false).unwrap();
    let beta = reader.get_schema(SchemaId(2), false).unwrap();
    assert_eq!(alpha.references(), &[SchemaId(2)]);
    assert_eq!(beta.references(), &[SchemaId(1)]);
    assert_eq!(reader.store().count("schema_row"), 2);
}

#[test]
fn test_class_hierarchy_cycle_terminates() {
    let reader = reader_with(
        r#"
        INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (1, 'Alpha', 1, 0);
        INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (10, 1, 'Left', 0);
        INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (11, 1, 'Right', 0);
        INSERT INTO ec_BaseClass (ClassId, BaseClassId, Ordinal) VALUES (10, 11, 0);
        INSERT INTO ec_BaseClass (ClassId, BaseClassId, Ordinal) VALUES (11, 10, 0);
        "#,
    );

    let left = reader.get_class(ClassId(10)).unwrap();
    let right = reader.get_class(ClassId(11)).unwrap();
    assert_eq!(left.base_classes(), &[ClassId(11)]);
    assert_eq!(right.base_classes(), &[ClassId(10)]);
    assert_eq!(reader.stats().cached_classes, 2);
}

// ============================================================================
// Full Schema Loads
// ============================================================================

#[test]
fn test_full_load_covers_reference_closure() {
    let reader = reader_with(MUTUAL);

    let alpha = reader.get_schema(SchemaId(1), true).unwrap();

    assert_eq!(alpha.name(), "Alpha");
    assert!(reader.is_fully_loaded(SchemaId(1)));
    assert!(reader.is_fully_loaded(SchemaId(2)));
    assert_eq!(reader.stats().cached_classes, 3);
    assert_eq!(reader.stats().fully_loaded_schemas, 2);
}

#[test]
fn test_full_load_is_idempotent() {
    let reader = counting_reader_with(WIDGETS);

    reader.ensure_all_classes_loaded(SchemaId(1)).unwrap();
    assert!(reader.is_fully_loaded(SchemaId(1)));
    assert!(reader.store().total() > 0);

    reader.store().reset();
    reader.ensure_all_classes_loaded(SchemaId(1)).unwrap();
    reader.get_schema(SchemaId(1), true).unwrap();
    assert_eq!(reader.store().total(), 0);
}

#[test]
fn test_full_load_stops_once_siblings_are_built() {
    let reader = counting_reader_with(
        r#"
        INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (1, 'Alpha', 1, 0);
        INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (10, 1, 'Derived', 0);
        INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (11, 1, 'Base', 0);
        INSERT INTO ec_BaseClass (ClassId, BaseClassId, Ordinal) VALUES (10, 11, 0);
        "#,
    );

    reader.ensure_all_classes_loaded(SchemaId(1)).unwrap();

    assert!(reader.is_fully_loaded(SchemaId(1)));
    assert_eq!(reader.store().count("class_row"), 2);
    assert_eq!(reader.store().count("enumeration_ids_in_schema"), 0);
}

#[test]
fn test_full_load_of_unknown_schema_is_not_found() {
    let reader = reader_with(WIDGETS);

    let err = reader.ensure_all_classes_loaded(SchemaId(99)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!reader.is_fully_loaded(SchemaId(99)));
    assert_eq!(reader.schema_load_progress(SchemaId(99)), None);
}

// ============================================================================
// Navigation Properties
// ============================================================================

/// `Pump` (60) and `Valve` (61) in `Plant` (1) navigate through `Feeds` (70),
/// which lives in `Links` (2). Plant does not reference Links.
const PLANT: &str = r#"
    INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (1, 'Plant', 1, 0);
    INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (2, 'Links', 1, 0);

    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (60, 1, 'Pump', 0);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (61, 1, 'Valve', 0);
    INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (62, 1, 'Booster', 0);
    INSERT INTO ec_BaseClass (ClassId, BaseClassId, Ordinal) VALUES (62, 60, 0);

    INSERT INTO ec_Class (Id, SchemaId, Name, Type, RelationStrength) VALUES (70, 2, 'Feeds', 1, 0);
    INSERT INTO ec_RelationshipConstraint (ClassId, RelationshipEnd, LowerCardinality, UpperCardinality, IsPolymorphic)
        VALUES (70, 0, 0, 1, 1);
    INSERT INTO ec_RelationshipConstraint (ClassId, RelationshipEnd, LowerCardinality, UpperCardinality, IsPolymorphic)
        VALUES (70, 1, 0, NULL, 0);
    INSERT INTO ec_RelationshipConstraintClass (ClassId, RelationshipEnd, ConstraintClassId, Ordinal) VALUES (70, 0, 60, 0);
    INSERT INTO ec_RelationshipConstraintClass (ClassId, RelationshipEnd, ConstraintClassId, Ordinal) VALUES (70, 1, 61, 0);

    INSERT INTO ec_Property (Id, ClassId, Name, Kind, NonPrimitiveType, Ordinal) VALUES (600, 60, 'Outlet', 4, 70, 0);
    INSERT INTO ec_Property (Id, ClassId, Name, Kind, NonPrimitiveType, NavigationDirection, Ordinal)
        VALUES (610, 61, 'Source', 4, 70, 2, 0);
    INSERT INTO ec_Property (Id, ClassId, Name, Kind, NonPrimitiveType, NavigationDirection, Ordinal)
        VALUES (620, 62, 'Stage', 4, 70, 1, 0);
"#;

#[test]
fn test_navigation_into_unloaded_schema() {
    let reader = reader_with(PLANT);

    let pump = reader.get_class(ClassId(60)).unwrap();
    assert_eq!(
        pump.properties()[0].property_type(),
        &PropertyType::Navigation {
            relationship: ClassId(70),
            direction: RelatedDirection::Forward,
        }
    );

    let feeds = reader.get_class(ClassId(70)).unwrap();
    let info = feeds.relationship().unwrap();
    assert_eq!(
        info.constraint(RelationshipEnd::Source)
            .class_ids()
            .collect::<Vec<_>>(),
        vec![ClassId(60)]
    );
    assert_eq!(
        info.constraint(RelationshipEnd::Target)
            .class_ids()
            .collect::<Vec<_>>(),
        vec![ClassId(61)]
    );
    assert_eq!(reader.schema_load_progress(SchemaId(2)), Some((1, 1)));
}

#[test]
fn test_backward_navigation_starts_at_target() {
    let reader = reader_with(PLANT);

    let valve = reader.get_class(ClassId(61)).unwrap();
    assert_eq!(
        valve.properties()[0].property_type(),
        &PropertyType::Navigation {
            relationship: ClassId(70),
            direction: RelatedDirection::Backward,
        }
    );
}

#[test]
fn test_navigation_from_derived_class_needs_polymorphic_end() {
    let reader = reader_with(PLANT);
    assert!(reader.get_class(ClassId(62)).is_ok());

    // Same shape, but the source end only admits Pump itself
    let store = store_with(PLANT);
    store
        .connection()
        .execute(
            "UPDATE ec_RelationshipConstraint SET IsPolymorphic = 0 WHERE ClassId = 70 AND RelationshipEnd = 0",
            [],
        )
        .unwrap();
    let reader = SchemaReader::new(store);

    let err = reader.get_class(ClassId(62)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
    assert!(err.to_string().contains("Booster.Stage"));
}

const MISPLACED_NAVIGATION: &str = r#"
    INSERT INTO ec_Property (Id, ClassId, Name, Kind, NonPrimitiveType, NavigationDirection, Ordinal)
        VALUES (611, 61, 'Downstream', 4, 70, 1, 1);
"#;

#[test]
fn test_navigation_from_wrong_end_is_corrupt() {
    let reader = reader_with(&format!("{}{}", PLANT, MISPLACED_NAVIGATION));

    let err = reader.get_class(ClassId(61)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
}

#[test]
fn test_misplaced_navigation_is_reported_once() {
    let reader = reader_with(&format!("{}{}", PLANT, MISPLACED_NAVIGATION));

    // The class was built and cached before its navigation was checked, so
    // only the call that built it fails
    assert_eq!(
        reader.get_class(ClassId(61)).unwrap_err().kind(),
        ErrorKind::Corrupt
    );

    let valve = reader.get_class(ClassId(61)).unwrap();
    assert_eq!(valve.properties().len(), 2);
    assert!(Arc::ptr_eq(&valve, &reader.get_class(ClassId(61)).unwrap()));
}

#[test]
fn test_navigation_validation_can_be_disabled() {
    let store = store_with(&format!("{}{}", PLANT, MISPLACED_NAVIGATION));
    let reader = SchemaReader::with_options(
        store,
        SchemaReaderOptions {
            validate_navigation: false,
        },
    );

    let valve = reader.get_class(ClassId(61)).unwrap();
    assert_eq!(valve.properties().len(), 2);
}

#[test]
fn test_navigation_must_point_through_relationship() {
    let reader = reader_with(
        r#"
        INSERT INTO ec_Schema (Id, Name, VersionMajor, VersionMinor) VALUES (1, 'Plant', 1, 0);
        INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (60, 1, 'Pump', 0);
        INSERT INTO ec_Class (Id, SchemaId, Name, Type) VALUES (61, 1, 'Valve', 0);
        INSERT INTO ec_Property (Id, ClassId, Name, Kind, NonPrimitiveType, Ordinal) VALUES (600, 60, 'Outlet', 4, 61, 0);
        "#,
    );

    let err = reader.get_class(ClassId(60)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
}

#[test]
fn test_self_referencing_navigation() {
    let reader = reader_with(CONTAINS);

    let container = reader.get_class(ClassId(41)).unwrap();
    let contains = reader.get_class(ClassId(40)).unwrap();

    assert_eq!(container.properties()[0].name(), "Items");
    let source = contains.relationship().unwrap().constraint(RelationshipEnd::Source);
    assert_eq!(source.class_ids().collect::<Vec<_>>(), vec![ClassId(41)]);
}

// ============================================================================
// Cache Invalidation
// ============================================================================

#[test]
fn test_clear_cache_requeries_store() {
    let reader = counting_reader_with(WIDGETS);

    let before = reader.get_class(ClassId(10)).unwrap();
    assert_eq!(reader.store().count("class_row"), 1);

    reader.get_class(ClassId(10)).unwrap();
    assert_eq!(reader.store().count("class_row"), 1);

    reader.clear_cache();
    assert!(!reader.is_fully_loaded(SchemaId(1)));

    let after = reader.get_class(ClassId(10)).unwrap();
    assert_eq!(reader.store().count("class_row"), 2);
    assert_eq!(reader.store().count("schema_row"), 2);
    assert!(!Arc::ptr_eq(&before, &after));

    // The old object is still usable
    assert_eq!(before.name(), "Bolt");
}
