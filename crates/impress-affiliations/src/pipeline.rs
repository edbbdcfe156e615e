//! Resolution pipeline
//!
//! Owns the reference data, the country registry, the entity extractor and
//! the resolution cache for one run. [`Pipeline::open`] loads everything
//! from an [`AffiliationConfig`]; a reference table that fails to load
//! aborts the run before any affiliation is processed. [`Pipeline::finish`]
//! flushes the cache and reports what happened.
//!
//! # Parallel Processing
//!
//! When the `parallel` feature is enabled, [`Pipeline::resolve_batch_parallel`]
//! resolves affiliations on the rayon thread pool. Output order matches input
//! order, and concurrent lookups of the same organization name run the
//! matcher once.

use std::io::{self, BufRead};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cache::{MemoryCache, ResolutionCache};
use crate::command::CommandExtractor;
use crate::config::{AffiliationConfig, CacheBackend, ExtractorBackend};
use crate::countries::CountryRegistry;
use crate::entities::EntityExtractor;
use crate::error::{ConfigError, Result};
use crate::reference::ReferenceData;
use crate::resolver::{AffiliationResolver, ResolutionStats, ResolvedAffiliation, StatsSnapshot};
use crate::rules::RuleBasedExtractor;

/// Everything needed to resolve affiliations for one run
pub struct Pipeline {
    reference: ReferenceData,
    countries: CountryRegistry,
    extractor: Box<dyn EntityExtractor>,
    cache: Box<dyn ResolutionCache>,
    threshold: f64,
    stats: Arc<ResolutionStats>,
}

impl Pipeline {
    /// Assemble a pipeline from already-built parts
    pub fn new(
        reference: ReferenceData,
        countries: CountryRegistry,
        extractor: Box<dyn EntityExtractor>,
        cache: Box<dyn ResolutionCache>,
    ) -> Self {
        Self {
            reference,
            countries,
            extractor,
            cache,
            threshold: crate::matcher::DEFAULT_THRESHOLD,
            stats: Arc::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Load reference data and build the extractor and cache from `config`
    pub fn open(config: &AffiliationConfig) -> Result<Self> {
        config.validate()?;

        let institutes = config
            .reference
            .institutes
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField("reference.institutes".to_string()))?;
        let addresses = config
            .reference
            .addresses
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField("reference.addresses".to_string()))?;
        let reference = ReferenceData::load(institutes, addresses)?;

        let countries = load_countries(config)?;
        let extractor = build_extractor(config, &countries)?;
        let cache = open_cache(config)?;

        tracing::info!(
            "Opened affiliation pipeline: {} institutes, {} countries, {} extractor, {} cached names",
            reference.institutes().len(),
            countries.len(),
            extractor.name(),
            cache.len()?
        );

        Ok(Self::new(reference, countries, extractor, cache)
            .with_threshold(config.matching.threshold))
    }

    /// A resolver borrowing this pipeline's parts and counting into its stats
    pub fn resolver(&self) -> AffiliationResolver<'_> {
        AffiliationResolver::new(
            &self.reference,
            &self.countries,
            self.extractor.as_ref(),
            self.cache.as_ref(),
        )
        .with_threshold(self.threshold)
        .with_stats(Arc::clone(&self.stats))
    }

    pub fn resolve(&self, text: &str) -> Result<ResolvedAffiliation> {
        self.resolver().resolve(text)
    }

    /// Resolve affiliations one at a time, in order
    ///
    /// A failure affects only its own entry.
    pub fn resolve_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Result<ResolvedAffiliation>> {
        let resolver = self.resolver();
        texts.iter().map(|text| resolver.resolve(text.as_ref())).collect()
    }

    /// Resolve affiliations in parallel; results are in input order
    #[cfg(feature = "parallel")]
    pub fn resolve_batch_parallel<S>(&self, texts: &[S]) -> Vec<Result<ResolvedAffiliation>>
    where
        S: AsRef<str> + Sync,
    {
        let resolver = self.resolver();
        texts
            .par_iter()
            .map(|text| resolver.resolve(text.as_ref()))
            .collect()
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn countries(&self) -> &CountryRegistry {
        &self.countries
    }

    pub fn cache(&self) -> &dyn ResolutionCache {
        self.cache.as_ref()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Flush the cache and return the run's counters
    pub fn finish(self) -> Result<StatsSnapshot> {
        self.cache.flush()?;
        let stats = self.stats.snapshot();
        tracing::info!(
            "Resolved {} affiliations: {} matched, {} unresolved, {} cache hits, {} matcher runs",
            stats.resolved,
            stats.matched,
            stats.unresolved,
            stats.cache_hits,
            stats.matcher_runs
        );
        Ok(stats)
    }
}

/// The configured country list, or the built-in one
pub fn load_countries(config: &AffiliationConfig) -> Result<CountryRegistry> {
    Ok(match &config.reference.countries {
        Some(path) => CountryRegistry::load(path)?,
        None => CountryRegistry::builtin(),
    })
}

/// The configured entity extractor backend
pub fn build_extractor(
    config: &AffiliationConfig,
    countries: &CountryRegistry,
) -> Result<Box<dyn EntityExtractor>> {
    let extractor: Box<dyn EntityExtractor> = match config.extractor.backend {
        ExtractorBackend::Rules => Box::new(RuleBasedExtractor::extended(
            countries,
            &config.extractor.extra_places,
            &config.extractor.extra_org_keywords,
        )?),
        ExtractorBackend::Command => Box::new(CommandExtractor::from_command_line(
            &config.extractor.command,
        )?),
    };
    Ok(extractor)
}

/// Affiliation lines from `reader`, blank lines skipped
///
/// Lines are kept as read apart from the line terminator, so each result's
/// `raw_text` is exactly the input line.
pub fn read_affiliations<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

fn open_cache(config: &AffiliationConfig) -> Result<Box<dyn ResolutionCache>> {
    match config.cache.backend {
        CacheBackend::Memory => Ok(Box::new(MemoryCache::new())),
        #[cfg(feature = "sqlite")]
        CacheBackend::Sqlite => {
            let path = config
                .cache_path()
                .ok_or_else(|| ConfigError::MissingField("cache.path".to_string()))?;
            Ok(Box::new(crate::cache::SqliteCache::open(path)?))
        }
        #[cfg(not(feature = "sqlite"))]
        CacheBackend::Sqlite => Err(ConfigError::OutOfRange(
            "the sqlite cache backend requires the `sqlite` feature".to_string(),
        )
        .into()),
    }
}
