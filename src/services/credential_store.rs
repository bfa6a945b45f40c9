//! Durable credential table backed by a single SQLite file.
//!
//! Every operation opens its own connection on a blocking thread and runs
//! the schema statement before touching the table, so the database (and its
//! parent directory) is created lazily by whichever call comes first.
//! Conflicting writers are serialized by SQLite itself: WAL journaling plus a
//! busy timeout makes a second writer wait instead of failing, and the
//! `UNIQUE` constraint on `name` decides which of two racing `add` calls wins.

use crate::constants::storage::BUSY_TIMEOUT_MS;
use crate::errors::BrokerError;
use crate::services::logger::Logger;
use crate::utils::paths::ensure_dir_exists;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS credentials (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        host TEXT NOT NULL,
        username TEXT NOT NULL,
        private_key_path TEXT NOT NULL
    );
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub username: String,
    pub private_key_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub name: String,
    pub host: String,
    pub username: String,
    /// Canonical path as returned by the key path validator.
    pub private_key_path: String,
}

#[derive(Clone)]
pub struct CredentialStore {
    db_path: PathBuf,
    logger: Logger,
}

impl CredentialStore {
    pub fn new(logger: Logger, db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            logger: logger.child("store"),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, BrokerError> {
        ensure_dir_exists(&self.db_path)?;
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, BrokerError>
    where
        T: Send + 'static,
        F: FnOnce(&CredentialStore, Connection) -> Result<T, BrokerError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store.connect()?;
            op(&store, conn)
        })
        .await
        .map_err(|err| BrokerError::Storage(format!("store task failed: {}", err)))?
    }

    pub async fn add(&self, credential: NewCredential) -> Result<Credential, BrokerError> {
        self.run_blocking(move |store, conn| store.add_sync(&conn, credential))
            .await
    }

    pub async fn remove(&self, name: &str) -> Result<bool, BrokerError> {
        let name = name.to_string();
        self.run_blocking(move |store, conn| store.remove_sync(&conn, &name))
            .await
    }

    pub async fn list(&self) -> Result<Vec<Credential>, BrokerError> {
        self.run_blocking(|_, conn| list_sync(&conn)).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Credential>, BrokerError> {
        let name = name.to_string();
        self.run_blocking(move |_, conn| get_by_name_sync(&conn, &name))
            .await
    }

    fn add_sync(&self, conn: &Connection, credential: NewCredential) -> Result<Credential, BrokerError> {
        let inserted = conn.execute(
            "INSERT INTO credentials (name, host, username, private_key_path) VALUES (?1, ?2, ?3, ?4)",
            params![
                credential.name,
                credential.host,
                credential.username,
                credential.private_key_path
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                self.logger.warn(
                    "duplicate credential rejected",
                    Some(&serde_json::json!({ "name": credential.name })),
                );
                return Err(BrokerError::DuplicateName {
                    name: credential.name,
                });
            }
            Err(err) => return Err(err.into()),
        }
        let id = conn.last_insert_rowid();
        self.logger.info(
            "credential added",
            Some(&serde_json::json!({ "name": credential.name, "id": id })),
        );
        Ok(Credential {
            id,
            name: credential.name,
            host: credential.host,
            username: credential.username,
            private_key_path: credential.private_key_path,
        })
    }

    fn remove_sync(&self, conn: &Connection, name: &str) -> Result<bool, BrokerError> {
        let affected = conn.execute("DELETE FROM credentials WHERE name = ?1", params![name])?;
        self.logger.info(
            "credential removed",
            Some(&serde_json::json!({ "name": name, "existed": affected > 0 })),
        );
        Ok(affected > 0)
    }
}

fn text_column(name: &str, column: &str, value: SqlValue) -> Result<String, BrokerError> {
    match value {
        SqlValue::Text(text) => Ok(text),
        SqlValue::Null => Err(invalid_column(name, column, "null")),
        SqlValue::Integer(_) => Err(invalid_column(name, column, "integer")),
        SqlValue::Real(_) => Err(invalid_column(name, column, "real")),
        SqlValue::Blob(_) => Err(invalid_column(name, column, "blob")),
    }
}

fn invalid_column(name: &str, column: &str, found: &str) -> BrokerError {
    BrokerError::InvalidCredential {
        name: name.to_string(),
        reason: format!("{} is stored as {} instead of text", column, found),
    }
}

/// Lossy rendering used by `list`, so a damaged row stays visible and removable.
fn lenient_text(value: SqlValue) -> String {
    match value {
        SqlValue::Text(text) => text,
        SqlValue::Null => String::new(),
        SqlValue::Integer(n) => n.to_string(),
        SqlValue::Real(n) => n.to_string(),
        SqlValue::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

type RawRow = (i64, String, SqlValue, SqlValue, SqlValue);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_credential(raw: RawRow) -> Result<Credential, BrokerError> {
    let (id, name, host, username, key_path) = raw;
    Ok(Credential {
        host: text_column(&name, "host", host)?,
        username: text_column(&name, "username", username)?,
        private_key_path: text_column(&name, "privateKeyPath", key_path)?,
        id,
        name,
    })
}

fn list_sync(conn: &Connection) -> Result<Vec<Credential>, BrokerError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, host, username, private_key_path FROM credentials ORDER BY id",
    )?;
    let rows = stmt.query_map([], read_raw)?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, host, username, key_path) = row?;
        out.push(Credential {
            id,
            name,
            host: lenient_text(host),
            username: lenient_text(username),
            private_key_path: lenient_text(key_path),
        });
    }
    Ok(out)
}

fn get_by_name_sync(conn: &Connection, name: &str) -> Result<Option<Credential>, BrokerError> {
    let raw = conn
        .query_row(
            "SELECT id, name, host, username, private_key_path FROM credentials WHERE name = ?1",
            params![name],
            read_raw,
        )
        .optional()?;
    raw.map(into_credential).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> CredentialStore {
        let path = std::env::temp_dir()
            .join(format!("ssh-broker-store-{}", uuid::Uuid::new_v4()))
            .join("nested")
            .join("ssh.db");
        CredentialStore::new(Logger::new("test"), path)
    }

    fn sample(name: &str) -> NewCredential {
        NewCredential {
            name: name.to_string(),
            host: "10.0.0.5".to_string(),
            username: "deploy".to_string(),
            private_key_path: "/keys/id_ed25519".to_string(),
        }
    }

    #[tokio::test]
    async fn first_use_creates_database_and_schema() {
        let store = temp_store();
        assert!(!store.db_path().exists());
        assert!(store.list().await.expect("list").is_empty());
        assert!(store.db_path().exists());
    }

    #[tokio::test]
    async fn add_then_get_by_name() {
        let store = temp_store();
        let added = store.add(sample("box1")).await.expect("add");
        assert_eq!(added.name, "box1");

        let found = store.get_by_name("box1").await.expect("get").expect("present");
        assert_eq!(found, added);
        assert!(store.get_by_name("box2").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn duplicate_name_keeps_original_record() {
        let store = temp_store();
        store.add(sample("box1")).await.expect("add");

        let mut other = sample("box1");
        other.host = "192.168.1.9".to_string();
        let err = store.add(other).await.unwrap_err();
        assert_eq!(err, BrokerError::DuplicateName { name: "box1".to_string() });

        let all = store.list().await.expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].host, "10.0.0.5");
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = temp_store();
        store.add(sample("box1")).await.expect("add");
        assert!(store.remove("box1").await.expect("remove"));
        assert!(!store.remove("box1").await.expect("remove again"));
        assert!(!store.remove("never-there").await.expect("remove absent"));
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn list_serializes_camel_case_columns() {
        let store = temp_store();
        store.add(sample("box1")).await.expect("add");
        let all = store.list().await.expect("list");
        let json = serde_json::to_value(&all).expect("json");
        assert_eq!(json[0]["privateKeyPath"], "/keys/id_ed25519");
        assert_eq!(json[0]["username"], "deploy");
        assert!(json[0]["id"].is_i64());
    }

    #[tokio::test]
    async fn corrupted_key_path_is_invalid_credential() {
        let store = temp_store();
        store.list().await.expect("init schema");
        {
            let conn = Connection::open(store.db_path()).expect("open");
            conn.execute(
                "INSERT INTO credentials (name, host, username, private_key_path) VALUES ('bad', 'h', 'u', X'DEADBEEF')",
                [],
            )
            .expect("insert");
        }
        let err = store.get_by_name("bad").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_CREDENTIAL");
        assert!(err.to_string().contains("privateKeyPath is stored as blob"));

        let all = store.list().await.expect("list tolerates damaged rows");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "bad");
    }

    #[tokio::test]
    async fn concurrent_adds_with_same_name_have_one_winner() {
        let store = temp_store();
        store.list().await.expect("init schema");
        let (a, b) = tokio::join!(store.add(sample("race")), store.add(sample("race")));
        let outcomes = [a, b];
        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        let dupes = outcomes
            .iter()
            .filter(|r| matches!(r, Err(BrokerError::DuplicateName { .. })))
            .count();
        assert_eq!((wins, dupes), (1, 1));
        assert_eq!(store.list().await.expect("list").len(), 1);
    }
}
