//! Field extraction, entity extraction and matching tests

mod common;

use common::fixtures::load_affiliations;
use impress_affiliations::{
    extract_email, extract_zipcode, find_best_match, normalized_similarity, resolve_org_name,
    CountryRegistry, EntityExtractor, EntityLabel, InstituteRecord, RuleBasedExtractor,
    SimilarityMatcher,
};
use proptest::prelude::*;
use rstest::rstest;

// === Zipcode Extraction ===

#[rstest]
#[case("Example University, New York, NY 10001, USA", Some("10001"))]
#[case("Imperial College London, London SW7 2AZ, United Kingdom", Some("SW7 2AZ"))]
#[case("MRC Laboratory of Molecular Biology, Cambridge CB2 0QH, UK", Some("CB2 0QH"))]
#[case("McGill University, Montreal, QC H3A 0G4, Canada", Some("H3A 0G4"))]
#[case("Institut Pasteur, 75015 Paris, 75724 Paris Cedex 15, France", Some("75015"))]
#[case("Karolinska Institutet, Stockholm, Sweden", None)]
#[case("", None)]
fn test_extract_zipcode(#[case] text: &str, #[case] expected: Option<&str>) {
    assert_eq!(extract_zipcode(text).as_deref(), expected);
}

// === Email Extraction ===

#[rstest]
#[case("Dept. of Biology, Example University, 10001, contact: a@b.com", Some("a@b.com"))]
#[case("Electronic address: jane.doe@example.com.", Some("jane.doe@example.com"))]
#[case("Corresponding author: j_smith+lab@mail.uni-heidelberg.de", Some("j_smith+lab@mail.uni-heidelberg.de"))]
#[case("a.one@inserm.fr; b.two@inserm.fr", Some("a.one@inserm.fr"))]
#[case("Harvard Medical School, Boston, MA", None)]
fn test_extract_email(#[case] text: &str, #[case] expected: Option<&str>) {
    assert_eq!(extract_email(text).as_deref(), expected);
}

#[test]
fn test_spec_style_affiliation_fields() {
    let text = "Dept. of Biology, Example University, 10001, contact: a@b.com";
    assert_eq!(extract_zipcode(text).as_deref(), Some("10001"));
    assert_eq!(extract_email(text).as_deref(), Some("a@b.com"));
}

// === Rule-Based Entity Extraction ===

#[rstest]
#[case(0, "Institut Pasteur", Some("France"))]
#[case(1, "Harvard Medical School", Some("United States"))]
#[case(2, "Karolinska Institutet", Some("Sweden"))]
#[case(3, "Example University", None)]
#[case(4, "University of Cambridge", Some("United Kingdom"))]
#[case(6, "", Some("France"))]
fn test_fixture_entities(
    #[case] line: usize,
    #[case] org: &str,
    #[case] country: Option<&str>,
) {
    let registry = CountryRegistry::builtin();
    let extractor = RuleBasedExtractor::new(&registry).unwrap();
    let text = &load_affiliations()[line];

    let spans = extractor.extract_entities(text).unwrap();
    assert_eq!(resolve_org_name(&spans), org);
    assert_eq!(
        impress_affiliations::resolve_country(&spans, &registry).as_deref(),
        country
    );
}

#[test]
fn test_labels_parse_leniently() {
    assert_eq!("ORG".parse::<EntityLabel>().unwrap(), EntityLabel::Org);
    assert_eq!("GPE".parse::<EntityLabel>().unwrap(), EntityLabel::Gpe);
    assert_eq!(
        "NORP".parse::<EntityLabel>().unwrap(),
        EntityLabel::Other("NORP".to_string())
    );
}

// === Matching ===

#[test]
fn test_exact_name_match() {
    let candidates = vec![
        InstituteRecord::new("G1", "Institut Pasteur"),
        InstituteRecord::new("G2", "Institute of Physics"),
    ];
    let best = find_best_match("Institut Pasteur", &candidates, 0.9).unwrap();
    assert_eq!(best.institute.name, "Institut Pasteur");
    assert_eq!(best.institute.registry_id, "G1");
    assert_eq!(best.score, 1.0);
}

#[rstest]
#[case("Institut Pasteur", "Institut Pasteur", 1.0)]
#[case("", "", 1.0)]
#[case("abc", "", 0.0)]
#[case("Karolinska Institutet", "Karolinska Institute", 1.0 - 1.0 / 21.0)]
fn test_similarity(#[case] a: &str, #[case] b: &str, #[case] expected: f64) {
    assert!((normalized_similarity(a, b) - expected).abs() < 1e-9);
}

// === Properties ===

proptest! {
    #[test]
    fn test_no_at_sign_means_no_email(text in "[a-zA-Z0-9 ,.;:()-]{0,80}") {
        prop_assert_eq!(extract_email(&text), None);
    }

    #[test]
    fn test_embedded_email_returned_exactly(
        local in "[a-z]{1,10}(\\.[a-z]{1,10})?",
        domain in "[a-z]{1,10}",
        tld in "(com|org|fr|edu)",
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        let text = format!("Dept. of Physics, Example University, contact {}, Paris", email);
        prop_assert_eq!(extract_email(&text), Some(email));
    }

    #[test]
    fn test_best_match_comes_from_candidates(
        names in prop::collection::vec("[a-z ]{1,12}", 0..8),
        query in "[a-z ]{1,12}",
        threshold in 0.0f64..0.99,
    ) {
        let candidates: Vec<InstituteRecord> = names
            .iter()
            .enumerate()
            .map(|(i, name)| InstituteRecord::new(format!("grid.{}", i), name.clone()))
            .collect();

        match SimilarityMatcher::new(threshold).find_best_match(&query, &candidates) {
            Some(best) => {
                prop_assert!(candidates.iter().any(|c| std::ptr::eq(c, best.institute)));
                prop_assert!(best.score > threshold);
            }
            None => {
                for candidate in &candidates {
                    prop_assert!(normalized_similarity(&query, &candidate.name) <= threshold);
                }
            }
        }
    }

    #[test]
    fn test_rule_spans_index_the_text(text in "[A-Za-z ,;.]{0,60}") {
        let extractor = RuleBasedExtractor::with_rules(
            ["France", "Canada"],
            ["University", "Institute"],
        )
        .unwrap();
        for span in extractor.extract_entities(&text).unwrap() {
            let (start, end) = (span.start.unwrap(), span.end.unwrap());
            prop_assert_eq!(&text[start..end], span.text.as_str());
        }
    }
}
