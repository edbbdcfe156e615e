//! Deterministic gazetteer and keyword entity extractor
//!
//! - **GPE**: whole-word, case-sensitive occurrences of gazetteer place names
//!   (the country registry plus any extra places), longest name first
//! - **ORG**: comma/semicolon separated segments containing an organization
//!   keyword ("University", "Institut", "Hospital", ...), matched as whole
//!   words case-insensitively, with contact details cut off
//!
//! Place names inside an ORG segment ("National University of Singapore")
//! are not reported as GPE spans.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::countries::CountryRegistry;
use crate::entities::{EntityExtractor, EntityLabel, EntitySpan};
use crate::error::ExtractorError;
use crate::extractors::email_span;

/// Default organization keywords
pub const DEFAULT_ORG_KEYWORDS: &[&str] = &[
    // Universities
    "University", "Universidad", "Universidade", "Universität", "Universitat",
    "Università", "Université", "Universiteit", "Universitet", "Uniwersytet",
    "College", "School", "Faculty", "Department", "Dept", "Division",
    // Research institutes
    "Institute", "Institut", "Instituto", "Istituto", "Institutet", "Institution",
    "Laboratory", "Laboratories", "Laboratoire", "Observatory", "Academy",
    "Akademie", "Center", "Centre", "Centro", "Zentrum", "Unit", "Consortium",
    // Clinical
    "Hospital", "Hôpital", "Hospitals", "Clinic", "Klinikum", "Infirmary",
    // Other bodies
    "Foundation", "Council", "Agency", "Ministry", "Museum", "Society",
    "Organisation", "Organization", "Corporation", "Company", "Inc", "Ltd",
    "GmbH", "LLC", "Pharmaceuticals",
];

lazy_static! {
    // Trailing contact label left over after an email is cut from a segment
    static ref CONTACT_LABEL: Regex = Regex::new(
        r"(?i)[\s.]*(?:electronic address|e-?mail|contact)\s*:?\s*$"
    ).unwrap();
}

/// Rule-based [`EntityExtractor`]
#[derive(Debug, Clone)]
pub struct RuleBasedExtractor {
    places: Option<Regex>,
    org_keywords: Regex,
}

impl RuleBasedExtractor {
    /// Extractor over the registry's country names and the default keywords
    pub fn new(registry: &CountryRegistry) -> Result<Self, ExtractorError> {
        Self::with_rules(registry.names(), DEFAULT_ORG_KEYWORDS.iter().copied())
    }

    /// Extractor over explicit place names and organization keywords
    pub fn with_rules<'p, 'k, P, K>(places: P, org_keywords: K) -> Result<Self, ExtractorError>
    where
        P: IntoIterator<Item = &'p str>,
        K: IntoIterator<Item = &'k str>,
    {
        let mut places: Vec<&str> = places
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        // Longest alternatives first so "Guinea-Bissau" beats "Guinea"
        places.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        places.dedup();

        let places = if places.is_empty() {
            None
        } else {
            Some(Regex::new(&word_alternation(&places))?)
        };

        let keywords: Vec<&str> = org_keywords
            .into_iter()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(ExtractorError::InvalidRules(
                "at least one organization keyword is required".to_string(),
            ));
        }
        let org_keywords = RegexBuilder::new(&word_alternation(&keywords))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            places,
            org_keywords,
        })
    }

    /// Extractor over the registry, extra place names and extra keywords
    pub fn extended(
        registry: &CountryRegistry,
        extra_places: &[String],
        extra_org_keywords: &[String],
    ) -> Result<Self, ExtractorError> {
        Self::with_rules(
            registry.names().chain(extra_places.iter().map(String::as_str)),
            DEFAULT_ORG_KEYWORDS
                .iter()
                .copied()
                .chain(extra_org_keywords.iter().map(String::as_str)),
        )
    }

    fn org_spans(&self, text: &str) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        let mut offset = 0;

        for segment in text.split(|c: char| c == ',' || c == ';') {
            let start = offset;
            offset += segment.len() + 1;

            let mut segment = segment;
            if let Some((email_start, _)) = email_span(segment) {
                segment = &segment[..email_start];
            }
            if let Some(label) = CONTACT_LABEL.find(segment) {
                segment = &segment[..label.start()];
            }

            let trimmed_start = segment.len() - segment.trim_start().len();
            let trimmed = segment
                .trim()
                .trim_end_matches(|c: char| c == '.' || c == ':' || c.is_whitespace());
            if trimmed.is_empty() || !self.org_keywords.is_match(trimmed) {
                continue;
            }

            let span_start = start + trimmed_start;
            spans.push(
                EntitySpan::new(trimmed, EntityLabel::Org)
                    .with_offsets(span_start, span_start + trimmed.len()),
            );
        }

        spans
    }

    fn place_spans(&self, text: &str, orgs: &[EntitySpan]) -> Vec<EntitySpan> {
        let Some(places) = &self.places else {
            return Vec::new();
        };

        places
            .find_iter(text)
            .filter(|m| {
                !orgs.iter().any(|org| match (org.start, org.end) {
                    (Some(start), Some(end)) => m.start() < end && start < m.end(),
                    _ => false,
                })
            })
            .map(|m| {
                EntitySpan::new(m.as_str(), EntityLabel::Gpe).with_offsets(m.start(), m.end())
            })
            .collect()
    }
}

impl EntityExtractor for RuleBasedExtractor {
    fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>, ExtractorError> {
        let orgs = self.org_spans(text);
        let mut spans = self.place_spans(text, &orgs);
        spans.extend(orgs);
        spans.sort_by_key(|span| span.start);
        Ok(spans)
    }

    fn name(&self) -> &str {
        "rules"
    }
}

/// `\b(?:a|b|c)\b` over escaped alternatives
fn word_alternation(alternatives: &[&str]) -> String {
    let escaped: Vec<String> = alternatives.iter().map(|a| regex::escape(a)).collect();
    format!(r"\b(?:{})\b", escaped.join("|"))
}
