//! Zipcode and email extraction from affiliation text

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Postal codes, one capture group per alternative:
    // UK ("SW7 2AZ", "CB2 0QQ"), 5-digit US ("10001"), Canadian ("H3A 0G4")
    static ref ZIPCODE_REGEX: Regex = Regex::new(
        r"([A-Z]{1,2}\d{1,2}[A-Z]? \d[A-Z]{2})|(\d{5})|([A-Z]\d[A-Z] \d[A-Z]\d)"
    ).unwrap();

    // Single email address; requires at least one dot in the domain so that
    // trailing sentence punctuation is left out of the match
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)+"
    ).unwrap();
}

/// Extract the postal code from an affiliation
///
/// Only the first match is considered; the first non-empty alternative
/// captured by that match is returned.
pub fn extract_zipcode(text: &str) -> Option<String> {
    let caps = ZIPCODE_REGEX.captures(text)?;
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .find(|code| !code.is_empty())
        .map(str::to_string)
}

/// Extract the first email address from an affiliation
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_REGEX.find(text).map(|m| m.as_str().to_string())
}

/// Byte range of the first email address, used to cut contact details
/// out of organization segments
pub(crate) fn email_span(text: &str) -> Option<(usize, usize)> {
    EMAIL_REGEX.find(text).map(|m| (m.start(), m.end()))
}
