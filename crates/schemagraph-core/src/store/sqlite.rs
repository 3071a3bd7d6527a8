//! SQLite Metadata Store
//!
//! A [`MetadataStore`] over a single rusqlite connection. The connection is
//! `Send` but not `Sync`, so it lives behind a mutex; every query holds the
//! mutex only for the duration of one statement.

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Result as SqliteResult};
use std::path::Path;
use tracing::debug;

use super::schema::{
    PROPERTY_COLUMNS, SCHEMA_CREATE_ATTACHMENTS, SCHEMA_CREATE_CLASSES, SCHEMA_CREATE_ENUMERATIONS,
    SCHEMA_CREATE_INDEXES, SCHEMA_CREATE_METADATA, SCHEMA_CREATE_SCHEMAS, STORE_SCHEMA_VERSION,
};
use super::{
    ClassKey, ClassRow, ConstraintClassRow, ConstraintRow, CustomAttributeRow, EnumerationRow,
    MetadataStore, PropertyRow, SchemaKey, SchemaRow, StoreError,
};
use crate::model::{ClassId, ContainerType, EnumerationId, PropertyId, RelationshipEnd, SchemaId};

/// A metadata store backed by a SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open an existing store database for reading
    ///
    /// The file is never written: no journal mode change, no metadata
    /// update. Fails with `SchemaVersionMismatch` if the database was
    /// written with a different table layout.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::configure_reads(&conn)?;
        Self::from_existing(conn, path)
    }

    /// Open an existing store database with write access
    ///
    /// Switches the file to WAL journaling, like `create`.
    pub fn open_writable(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::configure_writes(&conn)?;
        Self::configure_reads(&conn)?;
        Self::from_existing(conn, path)
    }

    /// Open an existing store, read-only unless `read_only` is false
    pub fn open_with_mode(path: &Path, read_only: bool) -> Result<Self, StoreError> {
        if read_only {
            Self::open(path)
        } else {
            Self::open_writable(path)
        }
    }

    fn from_existing(conn: Connection, path: &Path) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };

        if let Some(version) = store.get_metadata("schema_version")? {
            if version != STORE_SCHEMA_VERSION {
                return Err(StoreError::SchemaVersionMismatch {
                    expected: STORE_SCHEMA_VERSION.to_string(),
                    found: version,
                });
            }
        }

        debug!("Opened metadata store {:?}", path);
        Ok(store)
    }

    /// Create a new store database with empty tables
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_writes(&conn)?;
        Self::configure_reads(&conn)?;
        Self::create_tables(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.set_metadata("schema_version", STORE_SCHEMA_VERSION)?;

        debug!("Created metadata store {:?}", path);
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::configure_writes(&conn)?;
        Self::configure_reads(&conn)?;
        Self::create_tables(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.set_metadata("schema_version", STORE_SCHEMA_VERSION)?;
        Ok(store)
    }

    fn create_tables(conn: &Connection) -> SqliteResult<()> {
        conn.execute_batch(SCHEMA_CREATE_SCHEMAS)?;
        conn.execute_batch(SCHEMA_CREATE_CLASSES)?;
        conn.execute_batch(SCHEMA_CREATE_ENUMERATIONS)?;
        conn.execute_batch(SCHEMA_CREATE_ATTACHMENTS)?;
        conn.execute(SCHEMA_CREATE_METADATA, [])?;
        conn.execute_batch(SCHEMA_CREATE_INDEXES)?;
        Ok(())
    }

    /// Journal settings; these persist in the database file
    fn configure_writes(conn: &Connection) -> SqliteResult<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    /// Per-connection settings, safe on a read-only connection
    fn configure_reads(conn: &Connection) -> SqliteResult<()> {
        // Negative value = KB
        conn.pragma_update(None, "cache_size", -16000)?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        Ok(())
    }

    /// Override the page cache size (in KB)
    pub fn set_cache_size_kb(&self, kb: i64) -> Result<(), StoreError> {
        self.conn.lock().pragma_update(None, "cache_size", -kb)?;
        Ok(())
    }

    /// Direct access to the underlying connection, e.g. to seed rows
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    // =========================================================================
    // Metadata Operations
    // =========================================================================

    /// Get a metadata value
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM store_metadata WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    /// Set a metadata value
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO store_metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // =========================================================================
    // Row Mapping
    // =========================================================================

    fn query_ids<T: From<i64>>(&self, sql: &str, key: i64) -> Result<Vec<T>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let ids = stmt
            .query_map([key], |row| row.get::<_, i64>(0))?
            .map(|id| id.map(T::from))
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(ids)
    }

    fn query_id_by_names<T: From<i64>>(
        &self,
        sql: &str,
        first: &str,
        second: &str,
    ) -> Result<Option<T>, StoreError> {
        let id = self
            .conn
            .lock()
            .query_row(sql, params![first, second], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(id.map(T::from))
    }

    fn row_to_property(row: &rusqlite::Row<'_>) -> SqliteResult<PropertyRow> {
        Ok(PropertyRow {
            kind: row.get(0)?,
            id: PropertyId(row.get(1)?),
            name: row.get(2)?,
            display_label: row.get(3)?,
            description: row.get(4)?,
            is_readonly: row.get(5)?,
            primitive_type: row.get(6)?,
            non_primitive_type: row.get::<_, Option<i64>>(7)?.map(ClassId),
            enumeration_id: row.get::<_, Option<i64>>(8)?.map(EnumerationId),
            array_min_occurs: row.get(9)?,
            array_max_occurs: row.get(10)?,
            navigation_direction: row.get(11)?,
        })
    }
}

impl MetadataStore for SqliteStore {
    fn schema_row(&self, id: SchemaId) -> Result<Option<SchemaRow>, StoreError> {
        let row = self
            .conn
            .lock()
            .query_row(
                r#"
                SELECT Name, DisplayLabel, Description, Prefix, VersionMajor, VersionMinor,
                    (SELECT COUNT(*) FROM ec_Class C WHERE C.SchemaId = S.Id) +
                    (SELECT COUNT(*) FROM ec_Enumeration E WHERE E.SchemaId = S.Id)
                FROM ec_Schema S WHERE S.Id = ?1
                "#,
                [id.get()],
                |row| {
                    Ok(SchemaRow {
                        name: row.get(0)?,
                        display_label: row.get(1)?,
                        description: row.get(2)?,
                        prefix: row.get(3)?,
                        version_major: row.get(4)?,
                        version_minor: row.get(5)?,
                        type_count: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn schema_references(&self, id: SchemaId) -> Result<Vec<SchemaId>, StoreError> {
        self.query_ids(
            "SELECT ReferencedSchemaId FROM ec_SchemaReference WHERE SchemaId = ?1 ORDER BY ReferencedSchemaId",
            id.get(),
        )
    }

    fn class_row(&self, id: ClassId) -> Result<Option<ClassRow>, StoreError> {
        let row = self
            .conn
            .lock()
            .query_row(
                r#"
                SELECT SchemaId, Name, DisplayLabel, Description, Type, Modifier,
                    RelationStrength, RelationStrengthDirection
                FROM ec_Class WHERE Id = ?1
                "#,
                [id.get()],
                |row| {
                    Ok(ClassRow {
                        schema_id: SchemaId(row.get(0)?),
                        name: row.get(1)?,
                        display_label: row.get(2)?,
                        description: row.get(3)?,
                        class_type: row.get(4)?,
                        modifier: row.get(5)?,
                        relationship_strength: row.get(6)?,
                        relationship_strength_direction: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn base_class_ids(&self, id: ClassId) -> Result<Vec<ClassId>, StoreError> {
        self.query_ids(
            "SELECT BaseClassId FROM ec_BaseClass WHERE ClassId = ?1 ORDER BY Ordinal",
            id.get(),
        )
    }

    fn property_rows(&self, class_id: ClassId) -> Result<Vec<PropertyRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM ec_Property WHERE ClassId = ?1 ORDER BY Ordinal",
            PROPERTY_COLUMNS
        ))?;
        let rows = stmt
            .query_map([class_id.get()], Self::row_to_property)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn enumeration_row(&self, id: EnumerationId) -> Result<Option<EnumerationRow>, StoreError> {
        let row = self
            .conn
            .lock()
            .query_row(
                r#"
                SELECT SchemaId, Name, DisplayLabel, Description, UnderlyingType, IsStrict,
                    ValuesPayload
                FROM ec_Enumeration WHERE Id = ?1
                "#,
                [id.get()],
                |row| {
                    Ok(EnumerationRow {
                        schema_id: SchemaId(row.get(0)?),
                        name: row.get(1)?,
                        display_label: row.get(2)?,
                        description: row.get(3)?,
                        underlying_type: row.get(4)?,
                        is_strict: row.get(5)?,
                        values_payload: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn custom_attribute_rows(
        &self,
        container_id: i64,
        container_type: ContainerType,
    ) -> Result<Vec<CustomAttributeRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT ClassId, InstancePayload FROM ec_CustomAttribute
            WHERE ContainerId = ?1 AND ContainerType = ?2
            ORDER BY Ordinal
            "#,
        )?;
        let rows = stmt
            .query_map(params![container_id, container_type.code()], |row| {
                Ok(CustomAttributeRow {
                    class_id: ClassId(row.get(0)?),
                    instance_payload: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn constraint_row(
        &self,
        class_id: ClassId,
        end: RelationshipEnd,
    ) -> Result<Option<ConstraintRow>, StoreError> {
        let row = self
            .conn
            .lock()
            .query_row(
                r#"
                SELECT LowerCardinality, UpperCardinality, IsPolymorphic, RoleLabel
                FROM ec_RelationshipConstraint WHERE ClassId = ?1 AND RelationshipEnd = ?2
                "#,
                params![class_id.get(), end.code()],
                |row| {
                    Ok(ConstraintRow {
                        lower_cardinality: row.get(0)?,
                        upper_cardinality: row.get(1)?,
                        is_polymorphic: row.get(2)?,
                        role_label: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn constraint_class_rows(
        &self,
        class_id: ClassId,
        end: RelationshipEnd,
    ) -> Result<Vec<ConstraintClassRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT ConstraintClassId, KeyProperties FROM ec_RelationshipConstraintClass
            WHERE ClassId = ?1 AND RelationshipEnd = ?2
            ORDER BY Ordinal
            "#,
        )?;
        let rows = stmt
            .query_map(params![class_id.get(), end.code()], |row| {
                Ok(ConstraintClassRow {
                    class_id: ClassId(row.get(0)?),
                    key_properties: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn class_id_by_name(
        &self,
        schema_name: &str,
        class_name: &str,
    ) -> Result<Option<ClassId>, StoreError> {
        self.query_id_by_names(
            "SELECT C.Id FROM ec_Class C JOIN ec_Schema S ON C.SchemaId = S.Id WHERE S.Name = ?1 AND C.Name = ?2",
            schema_name,
            class_name,
        )
    }

    fn class_id_by_prefix(
        &self,
        schema_prefix: &str,
        class_name: &str,
    ) -> Result<Option<ClassId>, StoreError> {
        self.query_id_by_names(
            "SELECT C.Id FROM ec_Class C JOIN ec_Schema S ON C.SchemaId = S.Id WHERE S.Prefix = ?1 AND C.Name = ?2",
            schema_prefix,
            class_name,
        )
    }

    fn enumeration_id_by_name(
        &self,
        schema_name: &str,
        enumeration_name: &str,
    ) -> Result<Option<EnumerationId>, StoreError> {
        self.query_id_by_names(
            "SELECT E.Id FROM ec_Enumeration E JOIN ec_Schema S ON E.SchemaId = S.Id WHERE S.Name = ?1 AND E.Name = ?2",
            schema_name,
            enumeration_name,
        )
    }

    fn schema_id_by_name(&self, name: &str) -> Result<Option<SchemaId>, StoreError> {
        let id = self
            .conn
            .lock()
            .query_row("SELECT Id FROM ec_Schema WHERE Name = ?1", [name], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(id.map(SchemaId))
    }

    fn class_ids_in_schema(&self, schema_id: SchemaId) -> Result<Vec<ClassId>, StoreError> {
        self.query_ids(
            "SELECT Id FROM ec_Class WHERE SchemaId = ?1 ORDER BY Id",
            schema_id.get(),
        )
    }

    fn enumeration_ids_in_schema(
        &self,
        schema_id: SchemaId,
    ) -> Result<Vec<EnumerationId>, StoreError> {
        self.query_ids(
            "SELECT Id FROM ec_Enumeration WHERE SchemaId = ?1 ORDER BY Id",
            schema_id.get(),
        )
    }

    fn derived_class_ids(&self, base_id: ClassId) -> Result<Vec<ClassId>, StoreError> {
        self.query_ids(
            "SELECT ClassId FROM ec_BaseClass WHERE BaseClassId = ?1 ORDER BY ClassId",
            base_id.get(),
        )
    }

    fn schema_keys(&self) -> Result<Vec<SchemaKey>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT Id, Name, VersionMajor, VersionMinor, DisplayLabel FROM ec_Schema ORDER BY Name",
        )?;
        let keys = stmt
            .query_map([], |row| {
                Ok(SchemaKey {
                    id: SchemaId(row.get(0)?),
                    name: row.get(1)?,
                    version_major: row.get(2)?,
                    version_minor: row.get(3)?,
                    display_label: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(keys)
    }

    fn class_keys(&self, schema_id: SchemaId) -> Result<Vec<ClassKey>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT Id, Name, DisplayLabel FROM ec_Class WHERE SchemaId = ?1 ORDER BY Name",
        )?;
        let keys = stmt
            .query_map([schema_id.get()], |row| {
                Ok(ClassKey {
                    id: ClassId(row.get(0)?),
                    name: row.get(1)?,
                    display_label: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(keys)
    }
}
