use super::domain::{Customer, CustomerId, CustomerUpdate, Transaction};

/// Storage abstraction for the customer directory.
pub trait CustomerRepository: Send + Sync {
    fn insert(&self, customer: Customer) -> Result<Customer, RepositoryError>;
    /// Applies profile changes to the stored record, leaving its balance as stored.
    fn update_profile(
        &self,
        id: &CustomerId,
        changes: &CustomerUpdate,
    ) -> Result<Customer, RepositoryError>;
    fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    fn delete(&self, id: &CustomerId) -> Result<Customer, RepositoryError>;
    /// Substring search over name fields; an empty query lists everyone.
    fn search(&self, query: &str) -> Result<Vec<Customer>, RepositoryError>;
    /// Atomically adds `delta` cents to the balance and returns the updated customer.
    /// Fails with `BalanceOutOfRange` instead of overflowing.
    fn adjust_balance(&self, id: &CustomerId, delta: i64) -> Result<Customer, RepositoryError>;
}

/// Append-only record of balance adjustments.
pub trait TransactionLedger: Send + Sync {
    fn append(&self, transaction: Transaction) -> Result<Transaction, RepositoryError>;
    fn for_customer(&self, id: &CustomerId) -> Result<Vec<Transaction>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("balance would leave the supported range")]
    BalanceOutOfRange,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
