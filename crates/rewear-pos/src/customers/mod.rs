//! Credit customers and their balance ledger.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Customer, CustomerDetail, CustomerId, CustomerUpdate, NewCustomer, NewTransaction,
    Transaction, TransactionId, TransactionKind,
};
pub use memory::InMemoryCustomerStore;
pub use repository::{CustomerRepository, RepositoryError, TransactionLedger};
pub use router::customer_router;
pub use service::{CustomerService, CustomerServiceError, MAX_TRANSACTION_AMOUNT};
