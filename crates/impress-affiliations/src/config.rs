//! Configuration for impress-affiliations
//!
//! Reference table locations, the match threshold, the cache backend and
//! the entity extractor backend. Every section has defaults, so a config
//! file only needs the keys it changes:
//!
//! ```toml
//! [reference]
//! institutes = "grid/institutes.csv"
//! addresses = "grid/addresses.csv"
//!
//! [cache]
//! backend = "sqlite"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matcher::DEFAULT_THRESHOLD;

/// File name looked up by [`AffiliationConfig::load_standard`]
pub const CONFIG_FILE_NAME: &str = "affiliations.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffiliationConfig {
    /// Reference table locations
    pub reference: ReferenceConfig,
    /// Similarity matching
    pub matching: MatchingConfig,
    /// Resolution cache
    pub cache: CacheConfig,
    /// Entity extraction
    pub extractor: ExtractorConfig,
}

/// Reference table locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Institute table CSV (registry ID, name)
    pub institutes: Option<PathBuf>,
    /// Address table CSV (registry ID, country)
    pub addresses: Option<PathBuf>,
    /// Newline-delimited country names; the built-in list when absent
    pub countries: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Candidates must score strictly above this
    pub threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-lifetime map
    #[default]
    Memory,
    /// SQLite file persisting across runs
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// SQLite database path; see [`AffiliationConfig::cache_path`]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorBackend {
    /// Built-in gazetteer and keyword rules
    #[default]
    Rules,
    /// External NER process speaking JSON over stdin/stdout
    Command,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub backend: ExtractorBackend,
    /// Program and arguments for the command backend
    pub command: Vec<String>,
    /// Place names recognized in addition to the country registry
    pub extra_places: Vec<String>,
    /// Organization keywords in addition to the built-in ones
    pub extra_org_keywords: Vec<String>,
}

impl AffiliationConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config file, TOML unless the extension is `.json`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `~/.impress/affiliations.toml` if it exists, otherwise defaults
    pub fn load_standard() -> Result<Self, ConfigError> {
        match Self::standard_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `~/.impress/affiliations.toml`
    pub fn standard_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".impress").join(CONFIG_FILE_NAME))
    }

    /// SQLite cache location: the configured path, else
    /// `<cache dir>/impress/affiliations.sqlite`
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache.path.clone().or_else(|| {
            dirs::cache_dir().map(|dir| dir.join("impress").join("affiliations.sqlite"))
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.matching.threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(ConfigError::OutOfRange(format!(
                "matching.threshold must be in [0.0, 1.0), got {}",
                threshold
            )));
        }

        if self.extractor.backend == ExtractorBackend::Command
            && self
                .extractor
                .command
                .first()
                .map_or(true, |program| program.trim().is_empty())
        {
            return Err(ConfigError::MissingField(
                "extractor.command is required for the command backend".to_string(),
            ));
        }

        if self.cache.backend == CacheBackend::Sqlite && self.cache_path().is_none() {
            return Err(ConfigError::MissingField(
                "cache.path (no platform cache directory)".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AffiliationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.matching.threshold, 0.9);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.extractor.backend, ExtractorBackend::Rules);
    }

    #[test]
    fn test_partial_toml() {
        let config = AffiliationConfig::from_toml(
            r#"
[reference]
institutes = "grid/institutes.csv"
addresses = "grid/addresses.csv"

[cache]
backend = "sqlite"
path = "/tmp/affiliations.sqlite"
"#,
        )
        .unwrap();

        assert_eq!(
            config.reference.institutes,
            Some(PathBuf::from("grid/institutes.csv"))
        );
        assert_eq!(config.reference.countries, None);
        assert_eq!(config.matching.threshold, 0.9);
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        assert_eq!(
            config.cache_path(),
            Some(PathBuf::from("/tmp/affiliations.sqlite"))
        );
    }

    #[test]
    fn test_toml_serialization() {
        let mut config = AffiliationConfig::default();
        config.matching.threshold = 0.85;
        config.extractor.extra_places = vec!["Paris".to_string()];
        let toml = config.to_toml().unwrap();
        assert_eq!(AffiliationConfig::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn test_json_serialization() {
        let config = AffiliationConfig::default();
        let json = config.to_json().unwrap();
        let parsed = AffiliationConfig::from_json(&json).unwrap();
        assert_eq!(config.matching.threshold, parsed.matching.threshold);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = AffiliationConfig::default();
        config.matching.threshold = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));

        config.matching.threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_command_backend_needs_program() {
        let mut config = AffiliationConfig::default();
        config.extractor.backend = ExtractorBackend::Command;
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));

        config.extractor.command = vec!["ner-server".to_string(), "--json".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = AffiliationConfig::from_toml("[cache]\nbackend = \"redis\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("affiliations.toml");
        std::fs::write(&toml_path, "[matching]\nthreshold = 0.8\n").unwrap();
        assert_eq!(
            AffiliationConfig::load(&toml_path).unwrap().matching.threshold,
            0.8
        );

        let json_path = dir.path().join("affiliations.json");
        std::fs::write(&json_path, r#"{"matching": {"threshold": 0.75}}"#).unwrap();
        assert_eq!(
            AffiliationConfig::load(&json_path).unwrap().matching.threshold,
            0.75
        );

        assert!(matches!(
            AffiliationConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
