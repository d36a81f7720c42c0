use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AacError, Result};

/// JSON documents grouped into named collections, one SQLite table each.
///
/// Documents are keyed by their `_id` string field; documents without one
/// get a random UUID.
pub struct DocumentStore {
    conn: Connection,
    path: Option<PathBuf>,
}

fn check_collection_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AacError::validation(
            "collection",
            format!("invalid collection name: {:?}", name),
        ))
    }
}

impl DocumentStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened document store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn ensure_collection(&self, collection: &str) -> Result<()> {
        check_collection_name(collection)?;
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (
                    _id TEXT PRIMARY KEY,
                    body TEXT NOT NULL
                )",
                collection
            ),
            [],
        )?;
        Ok(())
    }

    fn collection_exists(&self, collection: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![collection],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert all documents or none of them. Returns the number inserted.
    pub fn insert_many<T: Serialize>(&mut self, collection: &str, docs: &[T]) -> Result<usize> {
        self.ensure_collection(collection)?;

        let insert_failure = |message: String| AacError::InsertFailure {
            collection: collection.to_string(),
            message,
        };

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{}\" (_id, body) VALUES (?1, ?2)",
                collection
            ))?;

            for doc in docs {
                let mut value = serde_json::to_value(doc)?;
                let id = match value.get("_id") {
                    Some(Value::String(id)) => id.clone(),
                    Some(other) => other.to_string(),
                    None => {
                        let id = uuid::Uuid::new_v4().to_string();
                        if let Value::Object(map) = &mut value {
                            map.insert("_id".to_string(), Value::String(id.clone()));
                        }
                        id
                    }
                };

                stmt.execute(params![id, value.to_string()])
                    .map_err(|e| insert_failure(format!("document {}: {}", id, e)))?;
            }
        }
        tx.commit()
            .map_err(|e| insert_failure(e.to_string()))?;

        debug!(collection, count = docs.len(), "inserted documents");
        Ok(docs.len())
    }

    /// Every document in insertion order. A missing collection is empty.
    pub fn find_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        check_collection_name(collection)?;
        if !self.collection_exists(collection)? {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT body FROM \"{}\" ORDER BY rowid", collection))?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(AacError::from))
            .collect()
    }

    /// `_id`s already stored in `collection`.
    pub fn ids(&self, collection: &str) -> Result<HashSet<String>> {
        check_collection_name(collection)?;
        if !self.collection_exists(collection)? {
            return Ok(HashSet::new());
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT _id FROM \"{}\"", collection))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    pub fn count(&self, collection: &str) -> Result<usize> {
        check_collection_name(collection)?;
        if !self.collection_exists(collection)? {
            return Ok(0);
        }

        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", collection),
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| AacError::from(e))
    }
}

impl From<rusqlite::Error> for AacError {
    fn from(e: rusqlite::Error) -> Self {
        AacError::Storage(format!("SQLite error: {}", e))
    }
}
