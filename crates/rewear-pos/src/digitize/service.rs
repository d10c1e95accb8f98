use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    CommitOutcome, ExtractedReceipt, MatchDecision, MatchSuggestions, ReceiptCommit, ReceiptImage,
    Suggestion,
};
use super::extractor::{ExtractionError, ReceiptExtractor};
use crate::customers::{
    Customer, CustomerRepository, CustomerService, CustomerServiceError, NewCustomer,
    NewTransaction, RepositoryError, TransactionKind, TransactionLedger,
};
use crate::matching::NameMatcher;

pub const DIGITIZED_ADDRESS: &str = "Digitalisiert";
const DEFAULT_NOTE: &str = "Beleg eingescannt";

/// Receipt digitization: extraction, duplicate suggestions, and the credit booking.
pub struct DigitizeService<R, L, E> {
    customers: Arc<CustomerService<R, L>>,
    extractor: Arc<E>,
    matcher: Arc<dyn NameMatcher>,
}

impl<R, L, E> DigitizeService<R, L, E>
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
    E: ReceiptExtractor + 'static,
{
    pub fn new(
        customers: Arc<CustomerService<R, L>>,
        extractor: Arc<E>,
        matcher: Arc<dyn NameMatcher>,
    ) -> Self {
        Self {
            customers,
            extractor,
            matcher,
        }
    }

    pub fn analyze(&self, image: &ReceiptImage) -> Result<ExtractedReceipt, DigitizeError> {
        if image.bytes.is_empty() {
            return Err(DigitizeError::Validation("receipt image is empty".to_string()));
        }
        let receipt = self.extractor.extract(image)?;
        info!(
            has_name = receipt.first_name.is_some() && receipt.last_name.is_some(),
            has_amount = receipt.amount.is_some(),
            "receipt analyzed"
        );
        Ok(receipt)
    }

    /// Ranks existing customers that could be the person on the receipt.
    ///
    /// Three directory searches run side by side: first name, last name, and
    /// the full name. A search that fails is logged and left out, so the
    /// result is only ever smaller, never an error.
    pub fn suggest_matches(&self, first_name: &str, last_name: &str) -> MatchSuggestions {
        let first = first_name.trim();
        let last = last_name.trim();
        if first.is_empty() || last.is_empty() {
            debug!("name incomplete, skipping duplicate search");
            return MatchSuggestions {
                skipped: true,
                matches: Vec::new(),
            };
        }

        let full = format!("{first} {last}");
        let queries = [first, last, full.as_str()];
        let customers = &self.customers;
        let outcomes: Vec<Result<Vec<Customer>, CustomerServiceError>> = thread::scope(|scope| {
            let handles: Vec<_> = queries
                .iter()
                .map(|query| scope.spawn(move || customers.search(query)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(RepositoryError::Unavailable("directory search panicked".to_string())
                            .into())
                    })
                })
                .collect()
        });

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for (query, outcome) in queries.iter().zip(outcomes) {
            match outcome {
                Ok(found) => {
                    for customer in found {
                        if seen.insert(customer.id.clone()) {
                            candidates.push(customer.to_candidate());
                        }
                    }
                }
                Err(err) => {
                    warn!(query = %query, error = %err, "directory search failed, continuing without it");
                }
            }
        }

        let matches: Vec<Suggestion> = self
            .matcher
            .rank_matches(first, last, &candidates)
            .into_iter()
            .map(Suggestion::from)
            .collect();
        debug!(
            candidates = candidates.len(),
            matches = matches.len(),
            "duplicate suggestions ranked"
        );
        MatchSuggestions {
            skipped: false,
            matches,
        }
    }

    /// Books the receipt amount as a credit, creating the customer if asked to.
    pub fn commit(
        &self,
        receipt: ReceiptCommit,
        staff_username: &str,
    ) -> Result<CommitOutcome, DigitizeError> {
        let first_name = receipt.first_name.trim();
        let last_name = receipt.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(DigitizeError::Validation(
                "first and last name are required".to_string(),
            ));
        }
        if receipt.amount <= 0 {
            return Err(DigitizeError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }

        let (customer, created_customer) = match receipt.decision {
            MatchDecision::Existing { customer_id } => (self.customers.get(&customer_id)?, false),
            MatchDecision::CreateNew => {
                let created = self.customers.create(NewCustomer {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: None,
                    phone: receipt.phone.clone(),
                    address: Some(DIGITIZED_ADDRESS.to_string()),
                })?;
                (created, true)
            }
        };

        let note = receipt
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .unwrap_or(DEFAULT_NOTE);
        let credit = NewTransaction {
            amount: receipt.amount,
            kind: TransactionKind::Credit,
            description: format!("Digitalisiert: {note}"),
            reference_id: Some(format!("DIGIT-{}", Utc::now().timestamp_millis())),
        };
        let transaction = self
            .customers
            .record_transaction(&customer.id, credit, staff_username)?;
        let customer = self.customers.get(&customer.id)?;

        info!(
            customer_id = %customer.id,
            amount = transaction.amount,
            created_customer,
            "digitized receipt booked"
        );
        Ok(CommitOutcome {
            customer,
            transaction,
            created_customer,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigitizeError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Customer(#[from] CustomerServiceError),
}
