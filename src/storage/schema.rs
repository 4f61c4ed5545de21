//! Database schema for pending-entry records

use rusqlite::Connection;

/// SQL schema for the state database
pub const SCHEMA_SQL: &str = r#"
-- URLs awaiting expansion, namespaced by crawl identity.
-- The (crawl_id, hash) unique key is what makes inserts idempotent.
CREATE TABLE IF NOT EXISTS pending_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id TEXT NOT NULL,
    hash TEXT NOT NULL,
    url TEXT NOT NULL,
    discovered_at TEXT NOT NULL,
    UNIQUE(crawl_id, hash)
);

CREATE INDEX IF NOT EXISTS idx_pending_crawl ON pending_entries(crawl_id);
"#;

/// Creates the schema if it does not already exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
