//! Paper receipt digitization.
//!
//! A photo goes to a [`ReceiptExtractor`], the extracted name is compared
//! against the customer directory through a [`crate::matching::NameMatcher`],
//! and once staff confirm a customer (or ask for a new one) the receipt amount
//! is booked as a credit.

pub mod domain;
pub mod extractor;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CommitOutcome, ExtractedReceipt, MatchDecision, MatchSuggestions, ReceiptCommit, ReceiptImage,
    Suggestion,
};
pub use extractor::{DisabledExtractor, ExtractionError, ReceiptExtractor};
pub use router::digitize_router;
pub use service::{DigitizeError, DigitizeService, DIGITIZED_ADDRESS};
