// src/db/schema_init.rs
use rusqlite::{Connection, Result as SqlResult};
use tracing::info;

pub struct SchemaInitializer;

impl SchemaInitializer {
    /// Create the documents table and its indexes if they do not exist yet.
    pub fn init(db_conn: &Connection) -> SqlResult<()> {
        info!("Initializing document metadata schema");
        let schema_sql = include_str!("../db/schema.sql");
        db_conn.execute_batch(schema_sql)?;
        info!("Document metadata schema ready");
        Ok(())
    }
}
