//! Resolution cache for organization-name matches
//!
//! Keys are raw organization names exactly as extracted; no case or
//! whitespace normalization is applied before lookup. Only successful
//! matches are ever stored, so an unmatched name is re-scored each time it
//! recurs.

mod memory;
#[cfg(feature = "sqlite")]
mod schema;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryCache;
#[cfg(feature = "sqlite")]
pub use schema::{Schema, SCHEMA_VERSION};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Cached outcome of a successful match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CachedMatch {
    pub canonical_name: String,
    pub registry_id: String,
}

impl CachedMatch {
    pub fn new(canonical_name: impl Into<String>, registry_id: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            registry_id: registry_id.into(),
        }
    }
}

/// Outcome of [`ResolutionCache::get_or_resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Served from the cache; the resolver was not called
    Hit(CachedMatch),
    /// Computed by the resolver and written to the cache
    Resolved(CachedMatch),
    /// The resolver found nothing; nothing was written
    Unresolved,
}

impl CacheLookup {
    pub fn into_match(self) -> Option<CachedMatch> {
        match self {
            CacheLookup::Hit(value) | CacheLookup::Resolved(value) => Some(value),
            CacheLookup::Unresolved => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// Key-value store of resolved organization names
pub trait ResolutionCache: Send + Sync {
    /// Point lookup
    fn get(&self, org_name: &str) -> Result<Option<CachedMatch>, CacheError>;

    /// Insert or overwrite the entry for `org_name`
    fn put(&self, org_name: &str, value: &CachedMatch) -> Result<(), CacheError>;

    /// Read, and on a miss compute and conditionally write
    ///
    /// `resolve` runs only on a miss; a `Some` result is stored, `None` is
    /// not. The default implementation is not atomic; stores shared across
    /// threads override it so that concurrent lookups of the same key run
    /// `resolve` once.
    fn get_or_resolve(
        &self,
        org_name: &str,
        resolve: &mut dyn FnMut() -> Option<CachedMatch>,
    ) -> Result<CacheLookup, CacheError> {
        if let Some(hit) = self.get(org_name)? {
            return Ok(CacheLookup::Hit(hit));
        }
        match resolve() {
            Some(value) => {
                self.put(org_name, &value)?;
                Ok(CacheLookup::Resolved(value))
            }
            None => Ok(CacheLookup::Unresolved),
        }
    }

    /// Number of stored entries
    fn len(&self) -> Result<usize, CacheError>;

    fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Persist buffered writes
    fn flush(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

impl<T: ResolutionCache + ?Sized> ResolutionCache for Box<T> {
    fn get(&self, org_name: &str) -> Result<Option<CachedMatch>, CacheError> {
        (**self).get(org_name)
    }

    fn put(&self, org_name: &str, value: &CachedMatch) -> Result<(), CacheError> {
        (**self).put(org_name, value)
    }

    fn get_or_resolve(
        &self,
        org_name: &str,
        resolve: &mut dyn FnMut() -> Option<CachedMatch>,
    ) -> Result<CacheLookup, CacheError> {
        (**self).get_or_resolve(org_name, resolve)
    }

    fn len(&self) -> Result<usize, CacheError> {
        (**self).len()
    }

    fn flush(&self) -> Result<(), CacheError> {
        (**self).flush()
    }
}
