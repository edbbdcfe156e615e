//! Impress Affiliations - Resolve free-text author affiliations to registry institutions
//!
//! Turns an affiliation string such as
//! `"Dept. of Biology, Example University, 10001, contact: a@b.com"` into a
//! structured record: email, postal code, country, canonical institution name
//! and research-organization registry (GRID) ID.
//!
//! - **Extractors**: Regex-based zipcode and email extraction
//! - **Entities**: Labeled entity spans and the pluggable extractor trait
//! - **Rules**: Gazetteer and keyword entity extractor
//! - **Command**: Entity extraction through an external NER process
//! - **Countries**: Country registry and country resolution
//! - **Reference**: Institute and address tables, geographic filter
//! - **Matcher**: Normalized Levenshtein matching with a strict threshold
//! - **Cache**: In-memory and SQLite resolution caches
//! - **Resolver**: Per-affiliation orchestration
//! - **Pipeline**: Run lifecycle, batch and parallel resolution
//! - **Config**: TOML/JSON configuration
//!
//! # Resolution
//!
//! ```text
//! text ─┬─ extract_email / extract_zipcode
//!       └─ EntityExtractor ─┬─ country (first registry GPE)
//!                           └─ org name (last ORG) ─ cache ─ filter ─ matcher
//! ```
//!
//! Missing fields are `None`; an unmatched organization keeps its extracted
//! name with an empty registry ID and is never cached.

pub mod cache;
pub mod command;
pub mod config;
pub mod countries;
pub mod entities;
pub mod error;
pub mod extractors;
pub mod matcher;
pub mod pipeline;
pub mod reference;
pub mod resolver;
pub mod rules;

pub use cache::{CacheLookup, CachedMatch, MemoryCache, ResolutionCache};
#[cfg(feature = "sqlite")]
pub use cache::SqliteCache;
pub use command::CommandExtractor;
pub use config::{AffiliationConfig, CacheBackend, ExtractorBackend};
pub use countries::{resolve_country, CountryRegistry};
pub use entities::{resolve_org_name, EntityExtractor, EntityLabel, EntitySpan};
pub use error::{AffiliationError, Result};
pub use extractors::{extract_email, extract_zipcode};
pub use matcher::{
    find_best_match, normalized_similarity, InstituteMatch, SimilarityMatcher, DEFAULT_THRESHOLD,
};
pub use pipeline::{build_extractor, load_countries, read_affiliations, Pipeline};
pub use reference::{filter_by_country, AddressRecord, InstituteRecord, ReferenceData};
pub use resolver::{resolve, AffiliationResolver, ResolvedAffiliation, StatsSnapshot};
pub use rules::RuleBasedExtractor;

/// Returns the version of impress-affiliations
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
