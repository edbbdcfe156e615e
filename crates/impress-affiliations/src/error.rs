//! Error types for impress-affiliations

use thiserror::Error;

/// Result type alias for affiliation operations
pub type Result<T> = std::result::Result<T, AffiliationError>;

/// Main error type for affiliation resolution
///
/// Missing fields and unmatched organizations are not errors; they are
/// modeled as `None` and an empty registry ID on the resolved record.
#[derive(Error, Debug)]
pub enum AffiliationError {
    /// Reference tables could not be loaded
    #[error("Reference data error: {0}")]
    Reference(#[from] ReferenceError),

    /// Entity extraction failed for an affiliation
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    /// The resolution cache store failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Reference-data loading errors
#[derive(Error, Debug)]
pub enum ReferenceError {
    /// Reference file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Required column missing from a reference table
    #[error("Missing column {column} in {table}")]
    MissingColumn { table: String, column: String },

    /// Malformed CSV content
    #[error("Invalid CSV: {0}")]
    Csv(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Entity-extraction errors
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The extraction capability could not be reached or exited abnormally
    #[error("Extractor unavailable: {0}")]
    Unavailable(String),

    /// The extractor produced output that could not be parsed into spans
    #[error("Invalid extractor output: {0}")]
    InvalidOutput(String),

    /// Extraction rules could not be compiled
    #[error("Invalid extraction rules: {0}")]
    InvalidRules(String),
}

/// Resolution cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// A lock guarding the store was poisoned by a panicking thread
    #[error("Cache lock poisoned: {0}")]
    Poisoned(String),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch { expected: u32, actual: u32 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// TOML or JSON parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Required field is missing
    #[error("Missing field: {0}")]
    MissingField(String),
}

impl From<csv::Error> for ReferenceError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            ReferenceError::Io(err.to_string())
        } else {
            ReferenceError::Csv(err.to_string())
        }
    }
}

impl From<std::io::Error> for ReferenceError {
    fn from(err: std::io::Error) -> Self {
        ReferenceError::Io(err.to_string())
    }
}

impl From<std::io::Error> for ExtractorError {
    fn from(err: std::io::Error) -> Self {
        ExtractorError::Unavailable(err.to_string())
    }
}

impl From<regex::Error> for ExtractorError {
    fn from(err: regex::Error) -> Self {
        ExtractorError::InvalidRules(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(err: serde_json::Error) -> Self {
        ExtractorError::InvalidOutput(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Database(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for AffiliationError {
    fn from(err: rusqlite::Error) -> Self {
        AffiliationError::Cache(CacheError::Database(err.to_string()))
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}
