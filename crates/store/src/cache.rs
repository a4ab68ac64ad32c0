//! SQLite-backed summary cache.
//!
//! One row per persisted [`SummaryKey`]; writes are upserts so a key holds at
//! most one summary. The connection sits behind a mutex, which serializes all
//! writes (and therefore writes to the same key).

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use pipeline::{CacheError, SummaryCache, SummaryKey};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS summaries (
    cache_key  TEXT PRIMARY KEY NOT NULL,
    summary    TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

/// Persistent summary cache in a local SQLite database.
pub struct SqliteSummaryCache {
    conn: Mutex<Connection>,
}

impl SqliteSummaryCache {
    /// Opens (or creates) the cache database at `path`.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError(format!("{}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path).map_err(db_error)?;
        // WAL keeps committed entries intact if the process dies mid-write.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(db_error)?;
        Self::from_connection(conn)
    }

    /// Opens a throwaway in-memory cache.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::from_connection(Connection::open_in_memory().map_err(db_error)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(SCHEMA).map_err(db_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError("cache connection poisoned".into()))
    }

    /// Number of cached summaries.
    pub fn len(&self) -> Result<usize, CacheError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))
            .map_err(db_error)?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

impl SummaryCache for SqliteSummaryCache {
    fn get(&self, key: &SummaryKey) -> Result<Option<String>, CacheError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT summary FROM summaries WHERE cache_key = ?1",
            params![key.cache_key()],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_error)
    }

    fn set(&self, key: &SummaryKey, summary: &str) -> Result<(), CacheError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO summaries (cache_key, summary, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(cache_key) DO UPDATE SET
               summary = excluded.summary,
               updated_at = excluded.updated_at",
            params![key.cache_key(), summary, Utc::now().to_rfc3339()],
        )
        .map_err(db_error)?;
        debug!(key = %key, "Summary cached");
        Ok(())
    }
}

fn db_error(e: rusqlite::Error) -> CacheError {
    CacheError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{ArticleId, InstructionVariant, ModelId};
    use tempfile::TempDir;

    fn key(article: &str, model: &str, variant: InstructionVariant) -> SummaryKey {
        SummaryKey::new(
            ArticleId::new(article).unwrap(),
            ModelId::new(model).unwrap(),
            variant,
        )
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache = SqliteSummaryCache::open_in_memory().unwrap();
        let k = key("1", "gpt-3.5-turbo", InstructionVariant::Expert);
        cache.set(&k, "A trial of 400 adults.").unwrap();
        assert_eq!(cache.get(&k).unwrap().as_deref(), Some("A trial of 400 adults."));
    }

    #[test]
    fn unset_key_is_absent() {
        let cache = SqliteSummaryCache::open_in_memory().unwrap();
        let k = key("1", "gpt-3.5-turbo", InstructionVariant::Expert);
        assert_eq!(cache.get(&k).unwrap(), None);
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn set_overwrites_the_single_entry() {
        let cache = SqliteSummaryCache::open_in_memory().unwrap();
        let k = key("1", "gpt-4", InstructionVariant::Expert);
        cache.set(&k, "first").unwrap();
        cache.set(&k, "second").unwrap();
        assert_eq!(cache.get(&k).unwrap().as_deref(), Some("second"));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn model_and_variant_keep_entries_apart() {
        let cache = SqliteSummaryCache::open_in_memory().unwrap();
        cache
            .set(&key("1", "gpt-3.5-turbo", InstructionVariant::Expert), "expert")
            .unwrap();

        assert_eq!(
            cache.get(&key("1", "gpt-3.5-turbo", InstructionVariant::Lay)).unwrap(),
            None
        );
        assert_eq!(
            cache.get(&key("1", "gpt-4", InstructionVariant::Expert)).unwrap(),
            None
        );
    }

    #[test]
    fn entries_survive_reopening() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache").join("summaries.sqlite3");
        let k = key("77", "gpt-4", InstructionVariant::Lay);
        {
            let cache = SqliteSummaryCache::open(&path).unwrap();
            cache.set(&k, "kept").unwrap();
        }
        let reopened = SqliteSummaryCache::open(&path).unwrap();
        assert_eq!(reopened.get(&k).unwrap().as_deref(), Some("kept"));
    }
}
