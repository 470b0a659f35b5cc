//! Person store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the async keyed record store consumed by the person service.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `insert` and `relocate` fail atomically with `RepoError::Duplicate`
//!   when the target key is taken; the service relies on this to close
//!   check-then-act races.
//! - `relocate` never leaves a copy under the old key.
//! - Birth dates are stored as ISO `YYYY-MM-DD` text so `BETWEEN` orders
//!   correctly.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::person::{Person, PersonId};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};

const PERSON_SELECT_SQL: &str = "SELECT
    email,
    first_name,
    last_name,
    birth_date,
    address,
    phone_number
FROM persons";

const PERSON_INSERT_SQL: &str = "INSERT INTO persons (
    email,
    first_name,
    last_name,
    birth_date,
    address,
    phone_number
) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const STORAGE_DATE_FORMAT: &str = "%Y-%m-%d";

const REQUIRED_COLUMNS: [&str; 6] = [
    "email",
    "first_name",
    "last_name",
    "birth_date",
    "address",
    "phone_number",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for person persistence and query operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("person already exists: {0}")]
    Duplicate(PersonId),
    #[error("person not found: {0}")]
    NotFound(PersonId),
    #[error("invalid persisted person data: {0}")]
    InvalidData(String),
    #[error(
        "connection is not initialized: schema version {actual_version}, expected {expected_version}"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("missing required table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("missing required column `{table}.{column}`")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("store worker failed: {0}")]
    Worker(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyed person storage.
///
/// Implementations must be safe to share across tasks; every call is
/// single-record atomic.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Looks one record up by key.
    async fn get(&self, email: &str) -> RepoResult<Option<Person>>;
    /// Stores a new record; fails with `Duplicate` when the key exists.
    async fn insert(&self, person: &Person) -> RepoResult<Person>;
    /// Stores a record under its key, replacing any existing one.
    async fn upsert(&self, person: &Person) -> RepoResult<Person>;
    /// Moves the record stored under `from` to `person.email` in one step.
    ///
    /// Fails with `Duplicate` when the new key is taken and with `NotFound`
    /// when `from` is missing; nothing changes on failure.
    async fn relocate(&self, from: &str, person: &Person) -> RepoResult<Person>;
    /// Deletes by key; returns whether a record was removed.
    async fn delete(&self, email: &str) -> RepoResult<bool>;
    /// Returns records with `birth_date` in `[from, to]`, inclusive.
    async fn scan_birth_date_range(&self, from: NaiveDate, to: NaiveDate)
        -> RepoResult<Vec<Person>>;
}

#[async_trait]
impl<S: PersonStore + ?Sized> PersonStore for Arc<S> {
    async fn get(&self, email: &str) -> RepoResult<Option<Person>> {
        (**self).get(email).await
    }

    async fn insert(&self, person: &Person) -> RepoResult<Person> {
        (**self).insert(person).await
    }

    async fn upsert(&self, person: &Person) -> RepoResult<Person> {
        (**self).upsert(person).await
    }

    async fn relocate(&self, from: &str, person: &Person) -> RepoResult<Person> {
        (**self).relocate(from, person).await
    }

    async fn delete(&self, email: &str) -> RepoResult<bool> {
        (**self).delete(email).await
    }

    async fn scan_birth_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Person>> {
        (**self).scan_birth_date_range(from, to).await
    }
}

/// SQLite-backed person store.
///
/// Statements run on the blocking thread pool behind one shared
/// connection.
#[derive(Clone)]
pub struct SqlitePersonStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePersonStore {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - Rejects connections whose schema is missing or outdated.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> RepoResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| RepoError::Worker(format!("{op}: connection lock poisoned")))?;
            f(&mut guard)
        })
        .await
        .map_err(|err| RepoError::Worker(format!("{op}: {err}")))?
    }
}

#[async_trait]
impl PersonStore for SqlitePersonStore {
    async fn get(&self, email: &str) -> RepoResult<Option<Person>> {
        let email = email.to_string();
        self.run("get", move |conn| select_person(conn, &email))
            .await
    }

    async fn insert(&self, person: &Person) -> RepoResult<Person> {
        let person = person.clone();
        self.run("insert", move |conn| {
            insert_person(conn, &person)?;
            Ok(person)
        })
        .await
    }

    async fn upsert(&self, person: &Person) -> RepoResult<Person> {
        let person = person.clone();
        self.run("upsert", move |conn| {
            conn.execute(
                &format!(
                    "{PERSON_INSERT_SQL}
                     ON CONFLICT(email) DO UPDATE SET
                        first_name = excluded.first_name,
                        last_name = excluded.last_name,
                        birth_date = excluded.birth_date,
                        address = excluded.address,
                        phone_number = excluded.phone_number,
                        updated_at = (strftime('%s', 'now') * 1000);"
                ),
                params![
                    person.email.as_str(),
                    person.first_name.as_str(),
                    person.last_name.as_str(),
                    date_to_db(person.birth_date),
                    person.address.as_deref(),
                    person.phone_number.as_deref(),
                ],
            )?;
            Ok(person)
        })
        .await
    }

    async fn relocate(&self, from: &str, person: &Person) -> RepoResult<Person> {
        let from = from.to_string();
        let person = person.clone();
        self.run("relocate", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            insert_person(&tx, &person)?;
            let removed = tx.execute("DELETE FROM persons WHERE email = ?1;", [from.as_str()])?;
            if removed == 0 {
                // Dropping the transaction rolls the insert back.
                return Err(RepoError::NotFound(from));
            }
            tx.commit()?;
            Ok(person)
        })
        .await
    }

    async fn delete(&self, email: &str) -> RepoResult<bool> {
        let email = email.to_string();
        self.run("delete", move |conn| {
            let changed = conn.execute("DELETE FROM persons WHERE email = ?1;", [email.as_str()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn scan_birth_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Person>> {
        self.run("scan_birth_date_range", move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{PERSON_SELECT_SQL}
                 WHERE birth_date BETWEEN ?1 AND ?2
                 ORDER BY birth_date ASC, email ASC;"
            ))?;
            let mut rows = stmt.query(params![date_to_db(from), date_to_db(to)])?;
            let mut persons = Vec::new();
            while let Some(row) = rows.next()? {
                persons.push(parse_person_row(row)?);
            }
            Ok(persons)
        })
        .await
    }
}

fn select_person(conn: &Connection, email: &str) -> RepoResult<Option<Person>> {
    let mut stmt = conn.prepare(&format!("{PERSON_SELECT_SQL} WHERE email = ?1;"))?;
    let mut rows = stmt.query([email])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_person_row(row)?));
    }
    Ok(None)
}

fn insert_person(conn: &Connection, person: &Person) -> RepoResult<()> {
    conn.execute(
        &format!("{PERSON_INSERT_SQL};"),
        params![
            person.email.as_str(),
            person.first_name.as_str(),
            person.last_name.as_str(),
            date_to_db(person.birth_date),
            person.address.as_deref(),
            person.phone_number.as_deref(),
        ],
    )
    .map_err(|err| match &err {
        rusqlite::Error::SqliteFailure(failure, _) if is_key_violation(failure) => {
            RepoError::Duplicate(person.email.clone())
        }
        _ => err.into(),
    })?;
    Ok(())
}

/// Only primary-key or unique failures mean the email is taken; other
/// constraint failures surface as `Db`.
fn is_key_violation(failure: &rusqlite::ffi::Error) -> bool {
    failure.code == ErrorCode::ConstraintViolation
        && matches!(
            failure.extended_code,
            rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let birth_text: String = row.get("birth_date")?;
    let birth_date = NaiveDate::parse_from_str(&birth_text, STORAGE_DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date value `{birth_text}` in persons.birth_date"
        ))
    })?;

    Ok(Person {
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        birth_date,
        address: row.get("address")?,
        phone_number: row.get("phone_number")?,
    })
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(STORAGE_DATE_FORMAT).to_string()
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "persons")? {
        return Err(RepoError::MissingRequiredTable("persons"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "persons", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "persons",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
