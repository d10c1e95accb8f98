//! Approximate customer-identity matching.
//!
//! When a paper receipt is digitized the extracted name is noisy: letters get
//! misread and first/last name are sometimes transposed. This module scores
//! stored customers against the extracted name so staff can credit an
//! existing customer instead of creating a duplicate. It is pure, read-only
//! logic with no knowledge of storage or HTTP.

mod ranking;
mod similarity;

pub use ranking::{
    rank_matches, rank_matches_with, CandidateCustomer, MatchLabel, MatchOptions, MatchResult,
    DEFAULT_MATCH_LIMIT, DEFAULT_MIN_SCORE,
};
pub use similarity::{levenshtein, normalize, similarity};

/// Name comparison capability used by the digitization workflow.
pub trait NameMatcher: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;

    fn rank_matches(
        &self,
        query_first: &str,
        query_last: &str,
        candidates: &[CandidateCustomer],
    ) -> Vec<MatchResult>;
}

/// Edit-distance matcher with configurable threshold and shortlist size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevenshteinMatcher {
    options: MatchOptions,
}

impl LevenshteinMatcher {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }
}

impl NameMatcher for LevenshteinMatcher {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        similarity(a, b)
    }

    fn rank_matches(
        &self,
        query_first: &str,
        query_last: &str,
        candidates: &[CandidateCustomer],
    ) -> Vec<MatchResult> {
        rank_matches_with(query_first, query_last, candidates, self.options)
    }
}
