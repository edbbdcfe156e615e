//! Affiliation resolution
//!
//! [`AffiliationResolver`] composes the field extractors, the entity
//! extractor, the country registry, the geographic filter, the similarity
//! matcher and the resolution cache into one `resolve(text)` operation.
//!
//! Absent fields are `None` and an unmatched organization has an empty
//! registry ID; only extractor and cache-store failures are errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheLookup, CachedMatch, ResolutionCache};
use crate::countries::{resolve_country, CountryRegistry};
use crate::entities::{resolve_org_name, EntityExtractor};
use crate::error::Result;
use crate::extractors::{extract_email, extract_zipcode};
use crate::matcher::SimilarityMatcher;
use crate::reference::ReferenceData;

/// Structured result for one affiliation string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAffiliation {
    pub raw_text: String,
    pub email: Option<String>,
    pub country: Option<String>,
    /// Registry name on a match, otherwise the extracted organization name
    pub canonical_name: String,
    pub zipcode: Option<String>,
    /// Empty when unresolved
    pub registry_id: String,
}

impl ResolvedAffiliation {
    pub fn is_resolved(&self) -> bool {
        !self.registry_id.is_empty()
    }
}

/// Counters describing resolver activity
#[derive(Debug, Default)]
pub struct ResolutionStats {
    resolved: AtomicU64,
    cache_hits: AtomicU64,
    matcher_runs: AtomicU64,
    matched: AtomicU64,
    unresolved: AtomicU64,
}

/// Point-in-time copy of [`ResolutionStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Affiliations processed
    pub resolved: u64,
    /// Organization names served from the cache
    pub cache_hits: u64,
    /// Times the matcher scored a candidate set
    pub matcher_runs: u64,
    /// Affiliations that ended with a registry ID
    pub matched: u64,
    /// Affiliations that ended without a registry ID
    pub unresolved: u64,
}

impl ResolutionStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            resolved: self.resolved.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            matcher_runs: self.matcher_runs.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Resolves affiliation strings against borrowed collaborators
pub struct AffiliationResolver<'a> {
    reference: &'a ReferenceData,
    countries: &'a CountryRegistry,
    extractor: &'a dyn EntityExtractor,
    cache: &'a dyn ResolutionCache,
    matcher: SimilarityMatcher,
    stats: Arc<ResolutionStats>,
}

impl<'a> AffiliationResolver<'a> {
    pub fn new(
        reference: &'a ReferenceData,
        countries: &'a CountryRegistry,
        extractor: &'a dyn EntityExtractor,
        cache: &'a dyn ResolutionCache,
    ) -> Self {
        Self {
            reference,
            countries,
            extractor,
            cache,
            matcher: SimilarityMatcher::default(),
            stats: Arc::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.matcher = SimilarityMatcher::new(threshold);
        self
    }

    /// Count into `stats` instead of a private set of counters
    pub fn with_stats(mut self, stats: Arc<ResolutionStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn matcher(&self) -> &SimilarityMatcher {
        &self.matcher
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Resolve one affiliation string
    pub fn resolve(&self, text: &str) -> Result<ResolvedAffiliation> {
        let email = extract_email(text);
        let zipcode = extract_zipcode(text);

        let spans = self.extractor.extract_entities(text)?;
        let country = resolve_country(&spans, self.countries);
        let org_name = resolve_org_name(&spans);

        let resolved = if org_name.is_empty() {
            tracing::debug!("No organization in {:?}", text);
            None
        } else {
            self.lookup(&org_name, country.as_deref())?
        };

        ResolutionStats::bump(&self.stats.resolved);
        let (canonical_name, registry_id) = match resolved {
            Some(CachedMatch {
                canonical_name,
                registry_id,
            }) => {
                ResolutionStats::bump(&self.stats.matched);
                (canonical_name, registry_id)
            }
            None => {
                ResolutionStats::bump(&self.stats.unresolved);
                (org_name, String::new())
            }
        };

        Ok(ResolvedAffiliation {
            raw_text: text.to_string(),
            email,
            country,
            canonical_name,
            zipcode,
            registry_id,
        })
    }

    fn lookup(&self, org_name: &str, country: Option<&str>) -> Result<Option<CachedMatch>> {
        let lookup = self.cache.get_or_resolve(org_name, &mut || {
            ResolutionStats::bump(&self.stats.matcher_runs);
            let candidates = self.reference.candidates(country);
            self.matcher
                .find_best_match(org_name, candidates)
                .map(|m| CachedMatch::new(m.institute.name.clone(), m.institute.registry_id.clone()))
        })?;

        match &lookup {
            CacheLookup::Hit(hit) => {
                ResolutionStats::bump(&self.stats.cache_hits);
                tracing::debug!("Cache hit {:?} -> {}", org_name, hit.registry_id);
            }
            CacheLookup::Resolved(value) => {
                tracing::debug!(
                    "Matched {:?} -> {:?} ({}) in {:?}",
                    org_name,
                    value.canonical_name,
                    value.registry_id,
                    country
                );
            }
            CacheLookup::Unresolved => {
                tracing::debug!("No match for {:?} in {:?}", org_name, country);
            }
        }

        Ok(lookup.into_match())
    }
}

/// One-shot resolution with the default threshold
pub fn resolve(
    text: &str,
    reference: &ReferenceData,
    countries: &CountryRegistry,
    extractor: &dyn EntityExtractor,
    cache: &dyn ResolutionCache,
) -> Result<ResolvedAffiliation> {
    AffiliationResolver::new(reference, countries, extractor, cache).resolve(text)
}
