//! Durable pending-entry storage
//!
//! When resumability is enabled, every URL accepted by the entry filter is
//! persisted as a pending-entry record before the crawler descends into it,
//! and removed once its page has been fully expanded. A crawl interrupted
//! mid-run resumes from exactly the records still present.
//!
//! Records are namespaced by crawl identity (a hash of the seed URL) so two
//! different seed sites never collide in one database. The only protection
//! against concurrent crawlers sharing one identity is the unique-key
//! constraint on the URL hash; double-processing in that setup is a
//! documented non-goal.

mod schema;
mod sqlite;

pub use sqlite::SqliteStateStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for pending-entry storage backends
///
/// All operations are idempotent: inserting a URL whose hash is already
/// pending is a no-op, as is removing a URL with no record.
pub trait StateStore {
    /// Returns true iff any pending record exists for this crawl identity
    fn exists(&self) -> StorageResult<bool>;

    /// Returns all pending URLs, in insertion order
    fn list_all(&self) -> StorageResult<Vec<String>>;

    /// Inserts pending records for the given URLs
    ///
    /// A duplicate hash is silently ignored (the URL is already pending).
    /// Any other storage fault for a single record is logged and that record
    /// skipped; the rest of the batch proceeds.
    fn add_many(&mut self, urls: &[String]) -> StorageResult<()>;

    /// Removes the pending records for the given URLs
    ///
    /// Removing a URL with no record is a silent no-op.
    fn remove_many(&mut self, urls: &[String]) -> StorageResult<()>;

    /// Deletes every pending record for this crawl identity
    fn clear(&mut self) -> StorageResult<()>;
}
