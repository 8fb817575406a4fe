// Scope-keyed result cache.
//
// The cache collaborator contract is get/put on a deterministic scope key.
// Computation is deterministic, so concurrent recomputation of the same
// scope is safe and last-writer-wins on `put` is acceptable.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Key-value store for serialized query outcomes, keyed by scope key.
pub trait ResultCache {
    /// Fetch the cached payload for a scope key, or `None` on a miss.
    fn get(&self, scope_key: &str) -> Result<Option<String>>;

    /// Store a payload for a scope key, replacing any previous entry.
    fn put(&self, scope_key: &str, payload: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SQLite-backed cache
// ---------------------------------------------------------------------------

/// SQLite-backed cache that survives across runs.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path` and ensure the table
    /// exists. Pass `":memory:"` for an ephemeral cache (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open cache database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set cache database pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS war_results (
                scope_key TEXT PRIMARY KEY,
                payload   TEXT NOT NULL
            );",
        )
        .context("failed to create cache schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock), which leaves the cache unusable anyway.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("cache connection mutex poisoned")
    }
}

impl ResultCache for SqliteCache {
    fn get(&self, scope_key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let payload = conn
            .query_row(
                "SELECT payload FROM war_results WHERE scope_key = ?1",
                params![scope_key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to read cache entry for {scope_key}"))?;
        Ok(payload)
    }

    fn put(&self, scope_key: &str, payload: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO war_results (scope_key, payload) VALUES (?1, ?2)",
            params![scope_key, payload],
        )
        .with_context(|| format!("failed to write cache entry for {scope_key}"))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory cache
// ---------------------------------------------------------------------------

/// Process-local cache for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, scope_key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        Ok(entries.get(scope_key).cloned())
    }

    fn put(&self, scope_key: &str, payload: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(scope_key.to_string(), payload.to_string());
        Ok(())
    }
}
