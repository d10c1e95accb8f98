use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::customers::{Customer, CustomerId, Transaction};
use crate::matching::{MatchLabel, MatchResult};

/// Photo of a paper receipt as uploaded by staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Fields the vision service could read off a receipt. Any may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Cents.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(flatten)]
    pub result: MatchResult,
    pub label: MatchLabel,
    pub label_text: &'static str,
}

impl From<MatchResult> for Suggestion {
    fn from(result: MatchResult) -> Self {
        let label = result.label();
        Self {
            result,
            label,
            label_text: label.label(),
        }
    }
}

/// Ranked duplicate candidates for an extracted name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSuggestions {
    /// Set when the name was incomplete and no search ran.
    pub skipped: bool,
    pub matches: Vec<Suggestion>,
}

/// Staff decision after reviewing the suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MatchDecision {
    Existing { customer_id: CustomerId },
    CreateNew,
}

/// Confirmed receipt data, possibly corrected by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptCommit {
    pub first_name: String,
    pub last_name: String,
    pub amount: i64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub decision: MatchDecision,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub customer: Customer,
    pub transaction: Transaction,
    pub created_customer: bool,
}
