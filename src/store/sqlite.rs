//! SQLite-backed relationship store.
//!
//! One database file per `(region, table)`, see
//! [`StoreConfig::database_path`](crate::config::StoreConfig::database_path).
//! Every update statement is a fixed string per field; the update spec is
//! bound as parameters, never spliced into SQL.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use checkin_core::scheduler::{format_date, parse_date};
use checkin_core::{
    CheckInFrequency, Field, Relationship, RelationshipKey, UpdateSpec, UpdatedAttributes,
};
use rusqlite::{Connection, OptionalExtension, params};

use super::schema::{CURRENT_SCHEMA_VERSION, apply_schema, read_schema_version};
use super::{RelationshipStore, StoreError};

const SELECT_BY_KEY: &str = "SELECT user_id, contact_id, name, birthday, check_in_frequency, \
     check_in_date FROM relationships WHERE user_id = ?1 AND contact_id = ?2";

const UPSERT: &str = "INSERT OR REPLACE INTO relationships \
     (user_id, contact_id, name, birthday, check_in_frequency, check_in_date) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const DELETE_BY_KEY: &str = "DELETE FROM relationships WHERE user_id = ?1 AND contact_id = ?2";

/// Single-column update statement for `field`. Parameters: value, user, contact.
fn update_sql(field: Field) -> &'static str {
    match field {
        Field::Name => {
            "UPDATE relationships SET name = ?1 WHERE user_id = ?2 AND contact_id = ?3"
        }
        Field::Birthday => {
            "UPDATE relationships SET birthday = ?1 WHERE user_id = ?2 AND contact_id = ?3"
        }
        Field::CheckInFrequency => {
            "UPDATE relationships SET check_in_frequency = ?1 \
             WHERE user_id = ?2 AND contact_id = ?3"
        }
        Field::CheckInDate => {
            "UPDATE relationships SET check_in_date = ?1 WHERE user_id = ?2 AND contact_id = ?3"
        }
    }
}

/// SQLite-backed relationship store.
///
/// Statements run on the blocking thread pool and are serialized through an
/// internal `Mutex<Connection>`.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Schema`] if the file was stamped by a newer
    /// schema version than this build understands.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let store = Self::from_connection(Some(path.to_path_buf()), Connection::open(path)?)?;
        tracing::debug!(path = %path.display(), "opened relationship database");
        Ok(store)
    }

    /// A private, non-persistent database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(None, Connection::open_in_memory()?)
    }

    fn from_connection(path: Option<PathBuf>, conn: Connection) -> Result<Self, StoreError> {
        apply_schema(&conn)?;
        let store = Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        };
        store.check_schema_version()?;
        Ok(store)
    }

    /// Database file path, if on disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the schema version stamp.
    pub fn schema_version(&self) -> Result<Option<u32>, StoreError> {
        let conn = self.lock()?;
        Ok(read_schema_version(&conn)?)
    }

    fn check_schema_version(&self) -> Result<(), StoreError> {
        match self.schema_version()? {
            Some(version) if version <= CURRENT_SCHEMA_VERSION => Ok(()),
            Some(version) => Err(StoreError::Schema(format!(
                "database is at version {version}, this build supports up to {CURRENT_SCHEMA_VERSION}"
            ))),
            None => Err(StoreError::Schema(
                "schema_version stamp is not a number".to_owned(),
            )),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        lock_conn(&self.conn)
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock_conn(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn lock_conn(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock().map_err(|e| StoreError::Lock(e.to_string()))
}

#[async_trait]
impl RelationshipStore for SqliteStore {
    async fn put(&self, item: &Relationship) -> Result<(), StoreError> {
        let item = item.clone();
        self.with_conn(move |conn| {
            conn.execute(
                UPSERT,
                params![
                    item.user_id,
                    item.contact_id,
                    item.name,
                    item.birthday.map(format_date),
                    item.check_in_frequency.label(),
                    format_date(item.check_in_date),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &RelationshipKey) -> Result<Option<Relationship>, StoreError> {
        let key = key.clone();
        self.with_conn(move |conn| select(conn, &key)).await
    }

    async fn update(
        &self,
        key: &RelationshipKey,
        spec: &UpdateSpec,
    ) -> Result<UpdatedAttributes, StoreError> {
        let key = key.clone();
        let spec = spec.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            for assignment in spec.assignments() {
                let rows = tx.execute(
                    update_sql(assignment.field()),
                    params![assignment.value(), key.user_id, key.contact_id],
                )?;
                if rows == 0 {
                    // Dropping `tx` rolls back.
                    return Err(StoreError::NotFound(key));
                }
            }

            let item = select(&tx, &key)?.ok_or_else(|| StoreError::NotFound(key.clone()))?;
            tx.commit()?;
            Ok(spec.read_back(&item))
        })
        .await
    }

    async fn delete(&self, key: &RelationshipKey) -> Result<(), StoreError> {
        let key = key.clone();
        self.with_conn(move |conn| {
            conn.execute(DELETE_BY_KEY, params![key.user_id, key.contact_id])?;
            Ok(())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Row conversion helpers
// ---------------------------------------------------------------------------

struct RawRow {
    user_id: String,
    contact_id: String,
    name: String,
    birthday: Option<String>,
    check_in_frequency: String,
    check_in_date: String,
}

fn select(conn: &Connection, key: &RelationshipKey) -> Result<Option<Relationship>, StoreError> {
    let raw = conn
        .query_row(SELECT_BY_KEY, params![key.user_id, key.contact_id], |row| {
            Ok(RawRow {
                user_id: row.get(0)?,
                contact_id: row.get(1)?,
                name: row.get(2)?,
                birthday: row.get(3)?,
                check_in_frequency: row.get(4)?,
                check_in_date: row.get(5)?,
            })
        })
        .optional()?;

    raw.map(|r| decode(key, r)).transpose()
}

fn decode(key: &RelationshipKey, raw: RawRow) -> Result<Relationship, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        key: key.clone(),
        reason,
    };

    let check_in_frequency =
        CheckInFrequency::from_label(&raw.check_in_frequency).map_err(|e| corrupt(e.to_string()))?;
    let check_in_date =
        parse_date("CheckInDate", &raw.check_in_date).map_err(|e| corrupt(e.to_string()))?;
    let birthday = raw
        .birthday
        .map(|b| parse_date("Birthday", &b))
        .transpose()
        .map_err(|e| corrupt(e.to_string()))?;

    Ok(Relationship {
        user_id: raw.user_id,
        contact_id: raw.contact_id,
        name: raw.name,
        birthday,
        check_in_frequency,
        check_in_date,
    })
}
