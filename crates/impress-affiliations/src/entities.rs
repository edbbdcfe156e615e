//! Labeled entity spans and the extraction capability
//!
//! The resolver depends only on the [`EntityExtractor`] contract: text in,
//! labeled spans out, in text order. Concrete extractors live in
//! [`crate::rules`] (deterministic gazetteer rules) and [`crate::command`]
//! (an external NER process).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractorError;

/// Category of an extracted entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EntityLabel {
    /// Geopolitical entity (countries, cities, states)
    Gpe,
    /// Organization
    Org,
    /// Non-GPE location
    Loc,
    /// Person
    Person,
    /// Any other label reported by an extractor
    Other(String),
}

impl EntityLabel {
    /// Canonical label string (`GPE`, `ORG`, ...)
    pub fn as_str(&self) -> &str {
        match self {
            EntityLabel::Gpe => "GPE",
            EntityLabel::Org => "ORG",
            EntityLabel::Loc => "LOC",
            EntityLabel::Person => "PERSON",
            EntityLabel::Other(label) => label,
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "GPE" => EntityLabel::Gpe,
            "ORG" | "ORGANIZATION" => EntityLabel::Org,
            "LOC" | "LOCATION" => EntityLabel::Loc,
            "PERSON" | "PER" => EntityLabel::Person,
            _ => EntityLabel::Other(s.trim().to_string()),
        })
    }
}

impl From<String> for EntityLabel {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(label) => label,
            Err(never) => match never {},
        }
    }
}

impl From<EntityLabel> for String {
    fn from(label: EntityLabel) -> Self {
        label.as_str().to_string()
    }
}

/// A labeled substring of an affiliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: EntityLabel,
    /// Byte offset of the span start, when the extractor reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    /// Byte offset one past the span end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

impl EntitySpan {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
            start: None,
            end: None,
        }
    }

    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn is_gpe(&self) -> bool {
        self.label == EntityLabel::Gpe
    }

    pub fn is_org(&self) -> bool {
        self.label == EntityLabel::Org
    }
}

/// Named-entity extraction capability
///
/// Implementations must be deterministic for identical input so that
/// resolution is reproducible, and must return spans in text order.
pub trait EntityExtractor: Send + Sync {
    /// Extract labeled spans from affiliation text
    fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>, ExtractorError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "extractor"
    }
}

impl<T: EntityExtractor + ?Sized> EntityExtractor for Box<T> {
    fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>, ExtractorError> {
        (**self).extract_entities(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Organization name of an affiliation: the text of the last ORG span
///
/// Later spans in an affiliation tend to be the enclosing institution
/// ("Department of X, University of Y"), so the last one wins.
/// Returns an empty string when there is no ORG span.
pub fn resolve_org_name(spans: &[EntitySpan]) -> String {
    spans
        .iter()
        .rev()
        .find(|span| span.is_org())
        .map(|span| span.text.clone())
        .unwrap_or_default()
}
