//! Fuzzy matching of organization names against reference institutes

use strsim::normalized_levenshtein;

use crate::reference::InstituteRecord;

/// Default acceptance threshold; a candidate must score strictly above it
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Normalized Levenshtein similarity in [0, 1], 1 meaning identical
///
/// Distance is divided by the longer string's length in characters.
/// Two empty strings are identical.
pub fn normalized_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// An accepted candidate and its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstituteMatch<'a> {
    pub institute: &'a InstituteRecord,
    pub score: f64,
}

/// Threshold matcher over a candidate list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityMatcher {
    threshold: f64,
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl SimilarityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Lazily score every candidate against `org_name`, in candidate order
    pub fn score_candidates<'a, 'n, I>(
        &self,
        org_name: &'n str,
        candidates: I,
    ) -> impl Iterator<Item = (&'a InstituteRecord, f64)> + 'n
    where
        'a: 'n,
        I: IntoIterator<Item = &'a InstituteRecord>,
        I::IntoIter: 'n,
    {
        candidates
            .into_iter()
            .map(move |institute| (institute, normalized_similarity(org_name, &institute.name)))
    }

    /// First candidate scoring strictly above the threshold
    ///
    /// Scoring stops at the first accepted candidate; later candidates with
    /// higher scores are not considered.
    pub fn find_best_match<'a, 'n, I>(
        &self,
        org_name: &'n str,
        candidates: I,
    ) -> Option<InstituteMatch<'a>>
    where
        'a: 'n,
        I: IntoIterator<Item = &'a InstituteRecord>,
        I::IntoIter: 'n,
    {
        let threshold = self.threshold;
        self.score_candidates(org_name, candidates)
            .find(|(_, score)| *score > threshold)
            .map(|(institute, score)| InstituteMatch { institute, score })
    }
}

/// [`SimilarityMatcher::find_best_match`] with an explicit threshold
pub fn find_best_match<'a>(
    org_name: &str,
    candidates: &'a [InstituteRecord],
    threshold: f64,
) -> Option<InstituteMatch<'a>> {
    SimilarityMatcher::new(threshold).find_best_match(org_name, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<InstituteRecord> {
        vec![
            InstituteRecord::new("G1", "Institut Pasteur"),
            InstituteRecord::new("G2", "Institute of Physics"),
        ]
    }

    #[test]
    fn test_exact_match() {
        let candidates = candidates();
        let found = find_best_match("Institut Pasteur", &candidates, 0.9).unwrap();
        assert_eq!(found.institute.name, "Institut Pasteur");
        assert_eq!(found.institute.registry_id, "G1");
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_near_match_above_threshold() {
        let candidates = vec![InstituteRecord::new("G3", "Karolinska Institutet")];
        // one substitution over 21 characters
        let found = find_best_match("Karolinska Institutat", &candidates, 0.9);
        assert_eq!(found.map(|m| m.institute.registry_id.as_str()), Some("G3"));
    }

    #[test]
    fn test_threshold_is_strict() {
        // "abcdefghij" vs "abcdefghiX": distance 1 over 10 chars, similarity exactly 0.9
        let candidates = vec![InstituteRecord::new("G1", "abcdefghiX")];
        assert!(find_best_match("abcdefghij", &candidates, 0.9).is_none());
        assert!(find_best_match("abcdefghij", &candidates, 0.89).is_some());
    }

    #[test]
    fn test_first_accepted_candidate_wins() {
        let candidates = vec![
            InstituteRecord::new("A", "University of Oxforx"),
            InstituteRecord::new("B", "University of Oxford"),
        ];
        let found = find_best_match("University of Oxford", &candidates, 0.9).unwrap();
        assert_eq!(found.institute.registry_id, "A");
    }

    #[test]
    fn test_no_match() {
        let candidates = candidates();
        assert!(find_best_match("Max Planck Society", &candidates, 0.9).is_none());
        assert!(find_best_match("anything", &[], 0.9).is_none());
    }

    #[test]
    fn test_score_candidates_is_lazy_and_ordered() {
        let candidates = candidates();
        let matcher = SimilarityMatcher::default();
        let scores: Vec<(&str, f64)> = matcher
            .score_candidates("Institut Pasteur", &candidates)
            .map(|(institute, score)| (institute.registry_id.as_str(), score))
            .collect();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0], ("G1", 1.0));
        assert!(scores[1].1 < 0.9);
    }

    #[test]
    fn test_best_match_stops_at_first_accepted_score() {
        let candidates = vec![
            InstituteRecord::new("A", "Institute of Physics"),
            InstituteRecord::new("B", "Institut Pasteur"),
            InstituteRecord::new("C", "Institut Pasteur"),
        ];
        let matcher = SimilarityMatcher::default();
        let scored = std::cell::Cell::new(0);
        let found = matcher
            .find_best_match(
                "Institut Pasteur",
                candidates.iter().inspect(|_| scored.set(scored.get() + 1)),
            )
            .unwrap();

        let expected = matcher
            .score_candidates("Institut Pasteur", &candidates)
            .find(|(_, score)| *score > matcher.threshold())
            .unwrap();
        assert!(std::ptr::eq(found.institute, expected.0));
        assert_eq!(found.score, expected.1);
        assert_eq!(found.institute.registry_id, "B");
        assert_eq!(scored.get(), 2);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(normalized_similarity("", ""), 1.0);
        assert_eq!(normalized_similarity("abc", ""), 0.0);
        assert_eq!(normalized_similarity("abc", "abc"), 1.0);
    }
}
