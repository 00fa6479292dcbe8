//! Document metadata store.
//!
//! One row per successful ingestion. Rows are inserted and listed, never
//! updated or deleted. SQLite serialises writers; the connection itself sits
//! behind a mutex so the store can be shared across actix workers.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::schema_init::SchemaInitializer;
use crate::config::DatabaseLocation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("failed to prepare database directory {path}: {reason}")]
    Directory { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub total_pages: i64,
    pub total_chunks: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub filename: &'a str,
    pub total_pages: usize,
    pub total_chunks: usize,
}

pub struct DocumentStore {
    conn: Mutex<Connection>,
}

impl DocumentStore {
    pub fn open(location: &DatabaseLocation) -> Result<Self, StoreError> {
        let conn = match location {
            DatabaseLocation::Memory => Connection::open_in_memory()?,
            DatabaseLocation::File(path) => {
                ensure_parent_dir(path)?;
                info!(path = %path.display(), "Opening document database");
                Connection::open(path)?
            }
        };
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(&DatabaseLocation::Memory)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        SchemaInitializer::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a record stamped with the current UTC time and return it with its new id.
    pub fn insert(&self, doc: &NewDocument<'_>) -> Result<Document, StoreError> {
        let uploaded_at = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO documents (filename, total_pages, total_chunks, uploaded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                doc.filename,
                doc.total_pages as i64,
                doc.total_chunks as i64,
                uploaded_at
            ],
        )?;
        Ok(Document {
            id: conn.last_insert_rowid(),
            filename: doc.filename.to_string(),
            total_pages: doc.total_pages as i64,
            total_chunks: doc.total_chunks as i64,
            uploaded_at,
        })
    }

    /// All records, newest first.
    pub fn list(&self) -> Result<Vec<Document>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, filename, total_pages, total_chunks, uploaded_at
             FROM documents
             ORDER BY uploaded_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Document {
                id: row.get(0)?,
                filename: row.get(1)?,
                total_pages: row.get(2)?,
                total_chunks: row.get(3)?,
                uploaded_at: row.get(4)?,
            })
        })?;
        let docs = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(docs)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Directory {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })
        }
        _ => Ok(()),
    }
}
