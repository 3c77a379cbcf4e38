//! Fuzzy candidate matching: pick one identity out of several by string
//! similarity, with a margin-of-victory guard so two near-equal candidates
//! never silently resolve to the wrong person.

use crate::types::Identity;

/// Minimum similarity score required to auto-select a candidate.
pub const DEFAULT_THRESHOLD: u8 = 90;
/// Minimum gap between the best and second-best score.
pub const DEFAULT_MARGIN: u8 = 5;

/// Scoring backend: similarity of two strings on a 0–100 scale.
pub trait NameScorer: Send + Sync {
    /// Whole-string similarity.
    fn score(&self, a: &str, b: &str) -> u8;

    /// Similarity of `needle` against the best-aligned region of
    /// `haystack`. Defaults to containment, then whole-string similarity.
    fn partial_score(&self, needle: &str, haystack: &str) -> u8 {
        if !needle.is_empty() && haystack.contains(needle) {
            100
        } else {
            self.score(needle, haystack)
        }
    }
}

/// Levenshtein-based scorer, the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct FuzzyScorer;

impl NameScorer for FuzzyScorer {
    fn score(&self, a: &str, b: &str) -> u8 {
        if a.is_empty() && b.is_empty() {
            return 100;
        }
        (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
    }

    fn partial_score(&self, needle: &str, haystack: &str) -> u8 {
        let needle_chars: Vec<char> = needle.chars().collect();
        let haystack_chars: Vec<char> = haystack.chars().collect();
        if needle_chars.is_empty() || haystack_chars.is_empty() {
            return 0;
        }
        if needle_chars.len() >= haystack_chars.len() {
            return self.score(needle, haystack);
        }
        if haystack.contains(needle) {
            return 100;
        }

        let mut best = 0;
        for window in haystack_chars.windows(needle_chars.len()) {
            let slice: String = window.iter().collect();
            best = best.max(self.score(needle, &slice));
            if best == 100 {
                break;
            }
        }
        best
    }
}

/// Pure fallback scorer: exact match, containment, or nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringScorer;

impl NameScorer for SubstringScorer {
    fn score(&self, a: &str, b: &str) -> u8 {
        if a == b {
            100
        } else if !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a)) {
            85
        } else {
            0
        }
    }
}

/// Matching thresholds.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub threshold: u8,
    pub margin_of_victory: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            threshold: DEFAULT_THRESHOLD,
            margin_of_victory: DEFAULT_MARGIN,
        }
    }
}

/// Best score of `term` against one candidate's name fields. Missing given
/// name or surname contributes nothing.
fn candidate_score(scorer: &dyn NameScorer, term: &str, candidate: &Identity) -> u8 {
    let display = candidate.display_name.to_lowercase();
    let mut best = scorer.score(term, &display);

    if let Some(given) = candidate.given_name.as_deref().filter(|g| !g.is_empty()) {
        best = best.max(scorer.score(term, &given.to_lowercase()));
    }
    if let Some(surname) = candidate.surname.as_deref().filter(|s| !s.is_empty()) {
        best = best.max(scorer.score(term, &surname.to_lowercase()));
    }

    best.max(scorer.partial_score(term, &display))
}

/// Pick the best-matching candidate, or `None` when the match is not
/// confident enough to act on.
///
/// A single candidate is returned unconditionally. With two or more, the
/// best score has to clear `threshold` AND beat the runner-up by at least
/// `margin_of_victory`: two nearly-equal names go back to the caller
/// instead of silently resolving to the wrong person.
pub fn find_best_match(
    term: &str,
    candidates: &[Identity],
    config: MatchConfig,
    scorer: &dyn NameScorer,
) -> Option<Identity> {
    if candidates.is_empty() {
        return None;
    }
    if candidates.len() == 1 {
        return Some(candidates[0].clone());
    }

    let term = term.trim().to_lowercase();
    let mut scored: Vec<(&Identity, u8)> = candidates
        .iter()
        .map(|candidate| (candidate, candidate_score(scorer, &term, candidate)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let (best, best_score) = scored[0];
    if best_score < config.threshold {
        log::debug!(
            "fuzzy match: best score {best_score} below threshold {}",
            config.threshold
        );
        return None;
    }

    let (runner_up, second_score) = scored[1];
    if best_score - second_score < config.margin_of_victory {
        log::debug!(
            "fuzzy match ambiguous: '{}' at {best_score} vs '{}' at {second_score}",
            best.display_name,
            runner_up.display_name
        );
        return None;
    }

    Some(best.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn person(display: &str) -> Identity {
        Identity {
            display_name: display.to_string(),
            ..Default::default()
        }
    }

    /// Scorer with fixed scores per (lowercased) display name.
    struct TableScorer(HashMap<String, u8>);

    impl TableScorer {
        fn new(scores: &[(&str, u8)]) -> Self {
            TableScorer(
                scores
                    .iter()
                    .map(|(name, score)| (name.to_lowercase(), *score))
                    .collect(),
            )
        }
    }

    impl NameScorer for TableScorer {
        fn score(&self, _a: &str, b: &str) -> u8 {
            *self.0.get(b).unwrap_or(&0)
        }

        fn partial_score(&self, a: &str, b: &str) -> u8 {
            self.score(a, b)
        }
    }

    #[test]
    fn test_single_candidate_wins_regardless_of_score() {
        let candidates = vec![person("Completely Unrelated")];
        let result = find_best_match(
            "Smith",
            &candidates,
            MatchConfig::default(),
            &FuzzyScorer,
        );
        assert_eq!(result.unwrap().display_name, "Completely Unrelated");
    }

    #[test]
    fn test_empty_candidates() {
        assert!(find_best_match("Smith", &[], MatchConfig::default(), &FuzzyScorer).is_none());
    }

    #[test]
    fn test_clear_winner_with_margin() {
        let candidates = vec![person("Alpha"), person("Beta"), person("Gamma")];
        let scorer = TableScorer::new(&[("Alpha", 95), ("Beta", 70), ("Gamma", 65)]);
        let result = find_best_match("Smith", &candidates, MatchConfig::default(), &scorer);
        assert_eq!(result.unwrap().display_name, "Alpha");
    }

    #[test]
    fn test_margin_of_victory_blocks_close_scores() {
        // Both clear the threshold, but the gap is below the margin
        let candidates = vec![person("Alpha"), person("Beta"), person("Gamma")];
        let scorer = TableScorer::new(&[("Alpha", 91), ("Beta", 88), ("Gamma", 80)]);
        assert!(find_best_match("Smith", &candidates, MatchConfig::default(), &scorer).is_none());
    }

    #[test]
    fn test_below_threshold() {
        let candidates = vec![person("Alpha"), person("Beta")];
        let scorer = TableScorer::new(&[("Alpha", 80), ("Beta", 20)]);
        assert!(find_best_match("Smith", &candidates, MatchConfig::default(), &scorer).is_none());
    }

    #[test]
    fn test_fuzzy_scorer_partial_containment() {
        let scorer = FuzzyScorer;
        assert_eq!(scorer.partial_score("petrenko", "ivan petrenko"), 100);
        assert!(scorer.partial_score("petrenko", "maryna kovalchuk") < 50);
    }

    #[test]
    fn test_fuzzy_scorer_close_names_stay_ambiguous() {
        // Two Annas: both contain the term, so neither wins the margin
        let candidates = vec![person("Anna Kovalenko"), person("Anna Shevchenko")];
        let result = find_best_match(
            "Anna",
            &candidates,
            MatchConfig::default(),
            &FuzzyScorer,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_fuzzy_scorer_distinct_names_resolve() {
        let candidates = vec![person("Anna Kovalenko"), person("Bohdan Shevchenko")];
        let result = find_best_match(
            "Anna",
            &candidates,
            MatchConfig::default(),
            &FuzzyScorer,
        );
        assert_eq!(result.unwrap().display_name, "Anna Kovalenko");
    }

    #[test]
    fn test_missing_name_parts_score_zero() {
        // Surname-only candidate vs a candidate whose given name matches
        let with_given = Identity {
            display_name: "Kovalenko, A.".to_string(),
            given_name: Some("Anna".to_string()),
            ..Default::default()
        };
        let bare = person("Zoryan Melnyk");
        let result = find_best_match(
            "anna",
            &[with_given, bare],
            MatchConfig::default(),
            &FuzzyScorer,
        );
        assert_eq!(result.unwrap().display_name, "Kovalenko, A.");
    }

    #[test]
    fn test_substring_scorer() {
        let scorer = SubstringScorer;
        assert_eq!(scorer.score("anna", "anna"), 100);
        assert_eq!(scorer.score("anna", "anna kovalenko"), 85);
        assert_eq!(scorer.score("anna", "bohdan"), 0);
        assert_eq!(scorer.score("", "bohdan"), 0);
    }
}
