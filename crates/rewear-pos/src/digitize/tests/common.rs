use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::customers::{
    Customer, CustomerId, CustomerRepository, CustomerService, CustomerUpdate,
    InMemoryCustomerStore, NewCustomer, RepositoryError, Transaction, TransactionLedger,
};
use crate::digitize::domain::{ExtractedReceipt, ReceiptImage};
use crate::digitize::extractor::{ExtractionError, ReceiptExtractor};
use crate::digitize::service::DigitizeService;
use crate::matching::LevenshteinMatcher;

/// Directory whose searches fail for selected queries.
#[derive(Default, Clone)]
pub(super) struct FlakyDirectory {
    pub(super) inner: InMemoryCustomerStore,
    pub(super) failing: HashSet<String>,
    pub(super) fail_all: bool,
    /// When set, every search waits for a release signal.
    pub(super) gate: Option<Arc<Mutex<Receiver<()>>>>,
}

impl FlakyDirectory {
    pub(super) fn failing_on(queries: &[&str]) -> Self {
        Self {
            failing: queries.iter().map(|q| q.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(super) fn always_failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Searches block until the returned sender releases them, or fail after
    /// two seconds without a release.
    pub(super) fn gated() -> (Self, Sender<()>) {
        let (release, gate) = mpsc::channel();
        let directory = Self {
            gate: Some(Arc::new(Mutex::new(gate))),
            ..Self::default()
        };
        (directory, release)
    }
}

impl CustomerRepository for FlakyDirectory {
    fn insert(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        self.inner.insert(customer)
    }

    fn update_profile(
        &self,
        id: &CustomerId,
        changes: &CustomerUpdate,
    ) -> Result<Customer, RepositoryError> {
        self.inner.update_profile(id, changes)
    }

    fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn delete(&self, id: &CustomerId) -> Result<Customer, RepositoryError> {
        self.inner.delete(id)
    }

    fn search(&self, query: &str) -> Result<Vec<Customer>, RepositoryError> {
        if self.fail_all || self.failing.contains(query) {
            return Err(RepositoryError::Unavailable("directory offline".to_string()));
        }
        if let Some(gate) = &self.gate {
            let gate = gate
                .lock()
                .map_err(|_| RepositoryError::Unavailable("gate poisoned".to_string()))?;
            gate.recv_timeout(Duration::from_secs(2))
                .map_err(|_| RepositoryError::Unavailable("never released".to_string()))?;
        }
        self.inner.search(query)
    }

    fn adjust_balance(&self, id: &CustomerId, delta: i64) -> Result<Customer, RepositoryError> {
        self.inner.adjust_balance(id, delta)
    }
}

impl TransactionLedger for FlakyDirectory {
    fn append(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        self.inner.append(transaction)
    }

    fn for_customer(&self, id: &CustomerId) -> Result<Vec<Transaction>, RepositoryError> {
        self.inner.for_customer(id)
    }
}

/// Extractor returning a canned result.
pub(super) struct StubExtractor {
    pub(super) outcome: Result<ExtractedReceipt, String>,
}

impl ReceiptExtractor for StubExtractor {
    fn extract(&self, _image: &ReceiptImage) -> Result<ExtractedReceipt, ExtractionError> {
        self.outcome.clone().map_err(ExtractionError::Failed)
    }
}

pub(super) type TestService = DigitizeService<FlakyDirectory, FlakyDirectory, StubExtractor>;

pub(super) fn extracted(first: &str, last: &str, amount: i64) -> ExtractedReceipt {
    ExtractedReceipt {
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        amount: Some(amount),
        ..ExtractedReceipt::default()
    }
}

pub(super) fn build(
    directory: FlakyDirectory,
    extractor: StubExtractor,
) -> (Arc<TestService>, Arc<CustomerService<FlakyDirectory, FlakyDirectory>>) {
    let directory = Arc::new(directory);
    let customers = Arc::new(CustomerService::new(directory.clone(), directory));
    let service = Arc::new(DigitizeService::new(
        customers.clone(),
        Arc::new(extractor),
        Arc::new(LevenshteinMatcher::default()),
    ));
    (service, customers)
}

pub(super) fn seed(
    customers: &CustomerService<FlakyDirectory, FlakyDirectory>,
    first: &str,
    last: &str,
) -> Customer {
    customers
        .create(NewCustomer {
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..NewCustomer::default()
        })
        .expect("seed customer")
}

pub(super) fn no_extraction() -> StubExtractor {
    StubExtractor {
        outcome: Err("not used".to_string()),
    }
}
