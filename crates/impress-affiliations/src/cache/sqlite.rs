//! SQLite-backed resolution cache
//!
//! Entries persist across runs. All stored entries are loaded into a
//! [`MemoryCache`] when the cache is opened, which then serves every lookup;
//! new entries are buffered and written to the database in batches, and on
//! [`ResolutionCache::flush`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use super::schema::{Schema, SCHEMA_VERSION};
use super::{CacheLookup, CachedMatch, MemoryCache, ResolutionCache};
use crate::error::CacheError;

/// Pending writes are committed once this many accumulate
const WRITE_BATCH_SIZE: usize = 256;

struct Store {
    conn: Connection,
    pending: Vec<(String, CachedMatch)>,
}

/// Persistent resolution cache
pub struct SqliteCache {
    memory: MemoryCache,
    store: Mutex<Store>,
    path: Option<PathBuf>,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CacheError::Database(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        let cache = Self::with_connection(conn, Some(path.to_path_buf()))?;
        tracing::info!(
            "Opened resolution cache {:?} with {} entries",
            path,
            cache.memory.len()?
        );
        Ok(cache)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self, CacheError> {
        initialize(&conn)?;
        let memory = MemoryCache::new();
        for (org_name, value) in load_entries(&conn)? {
            memory.put(&org_name, &value)?;
        }

        Ok(Self {
            memory,
            store: Mutex::new(Store {
                conn,
                pending: Vec::new(),
            }),
            path,
        })
    }

    /// Database path, `None` for in-memory caches
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flush pending writes and close the database
    pub fn close(self) -> Result<(), CacheError> {
        self.flush()
    }

    /// Number of rows currently committed to the database
    pub fn stored_len(&self) -> Result<usize, CacheError> {
        let store = self.lock()?;
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM resolutions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, CacheError> {
        self.store
            .lock()
            .map_err(|e| CacheError::Poisoned(e.to_string()))
    }

    fn record(&self, org_name: &str, value: &CachedMatch) -> Result<(), CacheError> {
        let mut store = self.lock()?;
        store.pending.push((org_name.to_string(), value.clone()));
        if store.pending.len() >= WRITE_BATCH_SIZE {
            write_pending(&mut store)?;
        }
        Ok(())
    }
}

impl ResolutionCache for SqliteCache {
    fn get(&self, org_name: &str) -> Result<Option<CachedMatch>, CacheError> {
        self.memory.get(org_name)
    }

    fn put(&self, org_name: &str, value: &CachedMatch) -> Result<(), CacheError> {
        self.memory.put(org_name, value)?;
        self.record(org_name, value)
    }

    fn get_or_resolve(
        &self,
        org_name: &str,
        resolve: &mut dyn FnMut() -> Option<CachedMatch>,
    ) -> Result<CacheLookup, CacheError> {
        let lookup = self.memory.get_or_resolve(org_name, resolve)?;
        if let CacheLookup::Resolved(value) = &lookup {
            self.record(org_name, value)?;
        }
        Ok(lookup)
    }

    fn len(&self) -> Result<usize, CacheError> {
        self.memory.len()
    }

    fn flush(&self) -> Result<(), CacheError> {
        let mut store = self.lock()?;
        write_pending(&mut store)
    }
}

impl Drop for SqliteCache {
    fn drop(&mut self) {
        if let Ok(store) = self.store.get_mut() {
            if let Err(e) = write_pending(store) {
                tracing::warn!("Failed to flush resolution cache: {}", e);
            }
        }
    }
}

fn initialize(conn: &Connection) -> Result<(), CacheError> {
    conn.execute_batch(Schema::create_tables())?;

    let current_version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;

    if current_version > SCHEMA_VERSION {
        return Err(CacheError::SchemaVersionMismatch {
            expected: SCHEMA_VERSION,
            actual: current_version,
        });
    }

    if current_version < SCHEMA_VERSION {
        for version in current_version..SCHEMA_VERSION {
            if let Some(migration) = Schema::migration(version, version + 1) {
                conn.execute_batch(migration)?;
            }
        }
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
    }

    Ok(())
}

fn load_entries(conn: &Connection) -> Result<Vec<(String, CachedMatch)>, CacheError> {
    let mut stmt =
        conn.prepare("SELECT org_name, canonical_name, registry_id FROM resolutions")?;
    let entries = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                CachedMatch {
                    canonical_name: row.get(1)?,
                    registry_id: row.get(2)?,
                },
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

fn write_pending(store: &mut Store) -> Result<(), CacheError> {
    if store.pending.is_empty() {
        return Ok(());
    }

    let resolved_at = chrono::Utc::now().to_rfc3339();
    let tx = store.conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            r#"
            INSERT OR REPLACE INTO resolutions (org_name, canonical_name, registry_id, resolved_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;
        for (org_name, value) in &store.pending {
            stmt.execute(rusqlite::params![
                org_name,
                value.canonical_name,
                value.registry_id,
                resolved_at,
            ])?;
        }
    }
    tx.commit()?;

    tracing::debug!("Wrote {} cache entries", store.pending.len());
    store.pending.clear();
    Ok(())
}
