//! In-process resolution cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use super::{CacheLookup, CachedMatch, ResolutionCache};
use crate::error::CacheError;

/// A key's slot; uninitialized while a lookup for it is in flight
type Slot = Arc<OnceLock<Option<CachedMatch>>>;

/// Unbounded in-memory cache
///
/// Each key owns a once-cell, so concurrent `get_or_resolve` calls for the
/// same organization name run the matcher once while other keys proceed
/// in parallel. The map lock is never held while resolving.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Slot>>, CacheError> {
        self.slots
            .lock()
            .map_err(|e| CacheError::Poisoned(e.to_string()))
    }

    /// Snapshot of all stored entries
    pub fn entries(&self) -> Result<Vec<(String, CachedMatch)>, CacheError> {
        let slots = self.lock()?;
        Ok(slots
            .iter()
            .filter_map(|(key, slot)| {
                slot.get()
                    .cloned()
                    .flatten()
                    .map(|value| (key.clone(), value))
            })
            .collect())
    }
}

impl ResolutionCache for MemoryCache {
    fn get(&self, org_name: &str) -> Result<Option<CachedMatch>, CacheError> {
        let slots = self.lock()?;
        Ok(slots
            .get(org_name)
            .and_then(|slot| slot.get().cloned().flatten()))
    }

    fn put(&self, org_name: &str, value: &CachedMatch) -> Result<(), CacheError> {
        let mut slots = self.lock()?;
        slots.insert(
            org_name.to_string(),
            Arc::new(OnceLock::from(Some(value.clone()))),
        );
        Ok(())
    }

    fn get_or_resolve(
        &self,
        org_name: &str,
        resolve: &mut dyn FnMut() -> Option<CachedMatch>,
    ) -> Result<CacheLookup, CacheError> {
        let slot = {
            let mut slots = self.lock()?;
            slots.entry(org_name.to_string()).or_default().clone()
        };

        let mut computed = false;
        let value = slot
            .get_or_init(|| {
                computed = true;
                resolve()
            })
            .clone();

        match value {
            Some(value) if computed => Ok(CacheLookup::Resolved(value)),
            Some(value) => Ok(CacheLookup::Hit(value)),
            None => {
                // Drop the empty slot so the next occurrence is re-scored
                let mut slots = self.lock()?;
                if slots
                    .get(org_name)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot))
                {
                    slots.remove(org_name);
                }
                Ok(CacheLookup::Unresolved)
            }
        }
    }

    fn len(&self) -> Result<usize, CacheError> {
        let slots = self.lock()?;
        Ok(slots
            .values()
            .filter(|slot| matches!(slot.get(), Some(Some(_))))
            .count())
    }
}
