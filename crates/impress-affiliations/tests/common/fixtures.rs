//! Test fixture loading utilities

use std::path::PathBuf;

use impress_affiliations::{read_affiliations, ReferenceData};

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Non-blank lines of the affiliation fixture
#[allow(dead_code)]
pub fn load_affiliations() -> Vec<String> {
    read_affiliations(load_fixture("affiliations.txt").as_bytes())
        .expect("Failed to read affiliation fixture")
}

/// The GRID-layout institute and address fixtures
#[allow(dead_code)]
pub fn load_reference() -> ReferenceData {
    ReferenceData::load(
        fixture_path("institutes.csv"),
        fixture_path("addresses.csv"),
    )
    .expect("Failed to load reference fixtures")
}
