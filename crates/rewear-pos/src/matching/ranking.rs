use serde::{Deserialize, Serialize};

use super::similarity::similarity;

/// Scores below this are not offered as possible duplicates.
pub const DEFAULT_MIN_SCORE: f64 = 0.4;
/// Upper bound on suggestions shown to staff.
pub const DEFAULT_MATCH_LIMIT: usize = 8;

/// A stored customer considered as a duplicate of a freshly extracted name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCustomer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub current_balance: i64,
}

/// Outcome of comparing the query name against one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub current_balance: i64,
    pub score: f64,
    pub is_exact: bool,
}

impl MatchResult {
    pub fn label(&self) -> MatchLabel {
        MatchLabel::classify(self.score, self.is_exact)
    }
}

/// Presentation bucket for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLabel {
    Exact,
    VerySimilar,
    Similar,
    Possible,
}

impl MatchLabel {
    pub fn classify(score: f64, is_exact: bool) -> Self {
        if is_exact {
            Self::Exact
        } else if score >= 0.8 {
            Self::VerySimilar
        } else if score >= 0.6 {
            Self::Similar
        } else {
            Self::Possible
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Exact => "Exact match",
            Self::VerySimilar => "Very similar",
            Self::Similar => "Similar",
            Self::Possible => "Possible match",
        }
    }
}

/// Threshold and size of the ranked shortlist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub min_score: f64,
    pub limit: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            limit: DEFAULT_MATCH_LIMIT,
        }
    }
}

/// Ranks candidates with the default threshold and limit.
pub fn rank_matches(
    query_first: &str,
    query_last: &str,
    candidates: &[CandidateCustomer],
) -> Vec<MatchResult> {
    rank_matches_with(query_first, query_last, candidates, MatchOptions::default())
}

/// Scores every candidate against the query name, also trying the name with
/// first and last swapped, and returns the best-scoring shortlist.
///
/// `is_exact` only reflects the non-swapped pairing. Ties keep candidate order.
pub fn rank_matches_with(
    query_first: &str,
    query_last: &str,
    candidates: &[CandidateCustomer],
    options: MatchOptions,
) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = candidates
        .iter()
        .map(|candidate| score_candidate(query_first, query_last, candidate))
        .filter(|result| result.score >= options.min_score)
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(options.limit);
    results
}

fn score_candidate(
    query_first: &str,
    query_last: &str,
    candidate: &CandidateCustomer,
) -> MatchResult {
    let first_sim = similarity(query_first, &candidate.first_name);
    let last_sim = similarity(query_last, &candidate.last_name);
    let swap_first_sim = similarity(query_first, &candidate.last_name);
    let swap_last_sim = similarity(query_last, &candidate.first_name);

    let normal_score = (first_sim + last_sim) / 2.0;
    let swap_score = (swap_first_sim + swap_last_sim) / 2.0;

    MatchResult {
        customer_id: candidate.id.clone(),
        first_name: candidate.first_name.clone(),
        last_name: candidate.last_name.clone(),
        current_balance: candidate.current_balance,
        score: normal_score.max(swap_score),
        is_exact: first_sim == 1.0 && last_sim == 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, first: &str, last: &str) -> CandidateCustomer {
        CandidateCustomer {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            current_balance: 0,
        }
    }

    #[test]
    fn exact_and_near_duplicates_are_ranked() {
        let candidates = vec![
            candidate("1", "Maria", "Muster"),
            candidate("2", "Mario", "Musterli"),
            candidate("3", "Peter", "Meier"),
        ];

        let results = rank_matches("Maria", "Muster", &candidates);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].customer_id, "1");
        assert_eq!(results[0].score, 1.0);
        assert!(results[0].is_exact);
        assert_eq!(results[1].customer_id, "2");
        assert!(results[1].score >= 0.4 && results[1].score < 1.0);
        assert!(!results[1].is_exact);
    }

    #[test]
    fn swapped_name_order_scores_full_but_is_not_exact() {
        let candidates = vec![candidate("7", "Muster", "Hans")];

        let results = rank_matches("Hans", "Muster", &candidates);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 1.0);
        assert!(!results[0].is_exact);
        assert_eq!(results[0].label(), MatchLabel::VerySimilar);
    }

    #[test]
    fn empty_candidate_list_yields_nothing() {
        assert!(rank_matches("Maria", "Muster", &[]).is_empty());
        assert!(rank_matches("", "", &[]).is_empty());
    }

    #[test]
    fn shortlist_is_bounded_sorted_and_thresholded() {
        let candidates: Vec<CandidateCustomer> = [
            ("Anna", "Meier"),
            ("Anne", "Meyer"),
            ("Anna", "Maier"),
            ("Hanna", "Meier"),
            ("Ana", "Meier"),
            ("Anja", "Mayer"),
            ("Anna", "Meierhans"),
            ("Annika", "Meier"),
            ("Nina", "Meier"),
            ("Anna", "Mei"),
            ("Otto", "Kunz"),
            ("Anna", "Meier"),
        ]
        .iter()
        .enumerate()
        .map(|(idx, (first, last))| candidate(&idx.to_string(), first, last))
        .collect();

        let results = rank_matches("Anna", "Meier", &candidates);

        assert!(results.len() <= DEFAULT_MATCH_LIMIT);
        assert!(results.iter().all(|result| result.score >= DEFAULT_MIN_SCORE));
        assert!(results.windows(2).all(|pair| pair[0].score >= pair[1].score));
        assert!(results.iter().all(|result| result.customer_id != "10"));
    }

    #[test]
    fn ties_keep_candidate_order() {
        let candidates = vec![
            candidate("a", "Maria", "Muster"),
            candidate("b", "Maria", "Muster"),
            candidate("c", "maria", "muster"),
        ];

        let ids: Vec<String> = rank_matches("Maria", "Muster", &candidates)
            .into_iter()
            .map(|result| result.customer_id)
            .collect();

        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn custom_options_change_threshold_and_limit() {
        let candidates = vec![
            candidate("1", "Maria", "Muster"),
            candidate("2", "Mario", "Musterli"),
        ];
        let options = MatchOptions {
            min_score: 0.9,
            limit: 8,
        };
        let results = rank_matches_with("Maria", "Muster", &candidates, options);
        assert_eq!(results.len(), 1);

        let options = MatchOptions {
            min_score: 0.0,
            limit: 1,
        };
        let results = rank_matches_with("Maria", "Muster", &candidates, options);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].customer_id, "1");
    }

    #[test]
    fn labels_follow_score_bands() {
        assert_eq!(MatchLabel::classify(1.0, true), MatchLabel::Exact);
        assert_eq!(MatchLabel::classify(0.4, true), MatchLabel::Exact);
        assert_eq!(MatchLabel::classify(0.8, false), MatchLabel::VerySimilar);
        assert_eq!(MatchLabel::classify(0.79, false), MatchLabel::Similar);
        assert_eq!(MatchLabel::classify(0.6, false), MatchLabel::Similar);
        assert_eq!(MatchLabel::classify(0.59, false), MatchLabel::Possible);
        assert_eq!(MatchLabel::Possible.label(), "Possible match");
        assert_eq!(MatchLabel::Exact.label(), "Exact match");
    }
}
