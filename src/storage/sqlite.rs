//! SQLite implementation of the pending-entry store

use crate::storage::schema::initialize_schema;
use crate::storage::{StateStore, StorageResult};
use crate::url::url_hash;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;

/// SQLite-backed pending-entry store for one crawl identity
pub struct SqliteStateStore {
    conn: Connection,
    crawl_id: String,
}

impl SqliteStateStore {
    /// Opens (or creates) the state database at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `crawl_id` - The crawl identity that namespaces this store's records
    pub fn open(path: &Path, crawl_id: &str) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            crawl_id: crawl_id.to_string(),
        })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn new_in_memory(crawl_id: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            crawl_id: crawl_id.to_string(),
        })
    }
}

impl StateStore for SqliteStateStore {
    fn exists(&self) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pending_entries WHERE crawl_id = ?1",
            params![self.crawl_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_all(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT url FROM pending_entries WHERE crawl_id = ?1 ORDER BY id",
        )?;
        let urls = stmt
            .query_map(params![self.crawl_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn add_many(&mut self, urls: &[String]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        for url in urls {
            let result = self.conn.execute(
                "INSERT INTO pending_entries (crawl_id, hash, url, discovered_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![self.crawl_id, url_hash(url), url, now],
            );
            match result {
                Ok(_) => {}
                // Duplicate hash: the URL is already pending, not an error
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    tracing::debug!("Pending entry already exists: {}", url);
                }
                Err(e) => {
                    tracing::warn!("Failed to persist pending entry {}: {}", url, e);
                }
            }
        }
        Ok(())
    }

    fn remove_many(&mut self, urls: &[String]) -> StorageResult<()> {
        for url in urls {
            self.conn.execute(
                "DELETE FROM pending_entries WHERE crawl_id = ?1 AND hash = ?2",
                params![self.crawl_id, url_hash(url)],
            )?;
        }
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM pending_entries WHERE crawl_id = ?1",
            params![self.crawl_id],
        )?;
        Ok(())
    }
}
