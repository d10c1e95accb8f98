use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Customer, CustomerDetail, CustomerId, CustomerUpdate, NewCustomer, NewTransaction,
    Transaction, TransactionId,
};
use super::repository::{CustomerRepository, RepositoryError, TransactionLedger};
use crate::export::{format_amount, render_csv, sanitize_cell, ExportError};

const EXPORT_HEADER: [&str; 8] = [
    "ID",
    "Vorname",
    "Nachname",
    "E-Mail",
    "Telefon",
    "Adresse",
    "Guthaben",
    "Erstellt",
];

/// Largest single credit or payout in cents (1,000,000.00 CHF).
pub const MAX_TRANSACTION_AMOUNT: i64 = 100_000_000;

static CUSTOMER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TRANSACTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_customer_id() -> CustomerId {
    let id = CUSTOMER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CustomerId(format!("cust-{id:06}"))
}

fn next_transaction_id() -> TransactionId {
    let id = TRANSACTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TransactionId(format!("txn-{id:06}"))
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Service composing the customer directory with the credit ledger.
pub struct CustomerService<R, L> {
    repository: Arc<R>,
    ledger: Arc<L>,
}

impl<R, L> CustomerService<R, L>
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    pub fn new(repository: Arc<R>, ledger: Arc<L>) -> Self {
        Self { repository, ledger }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Register a customer with a zero balance.
    pub fn create(&self, new_customer: NewCustomer) -> Result<Customer, CustomerServiceError> {
        let first_name = new_customer.first_name.trim().to_string();
        let last_name = new_customer.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(CustomerServiceError::Validation(
                "first and last name are required".to_string(),
            ));
        }

        let customer = Customer {
            id: next_customer_id(),
            first_name,
            last_name,
            email: clean_optional(new_customer.email),
            phone: clean_optional(new_customer.phone),
            address: clean_optional(new_customer.address),
            current_balance: 0,
            created_at: Utc::now(),
        };

        let stored = self.repository.insert(customer)?;
        info!(customer_id = %stored.id, "customer created");
        Ok(stored)
    }

    pub fn search(&self, query: &str) -> Result<Vec<Customer>, CustomerServiceError> {
        Ok(self.repository.search(query)?)
    }

    pub fn get(&self, id: &CustomerId) -> Result<Customer, CustomerServiceError> {
        let customer = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(customer)
    }

    pub fn detail(&self, id: &CustomerId) -> Result<CustomerDetail, CustomerServiceError> {
        let customer = self.get(id)?;
        let transactions = self.ledger.for_customer(id)?;
        Ok(CustomerDetail {
            customer,
            transactions,
        })
    }

    pub fn update(
        &self,
        id: &CustomerId,
        changes: CustomerUpdate,
    ) -> Result<Customer, CustomerServiceError> {
        if changes
            .first_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(CustomerServiceError::Validation(
                "first name cannot be blank".to_string(),
            ));
        }
        if changes
            .last_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(CustomerServiceError::Validation(
                "last name cannot be blank".to_string(),
            ));
        }

        let customer = self.repository.update_profile(id, &changes)?;
        info!(customer_id = %customer.id, "customer profile updated");
        Ok(customer)
    }

    pub fn delete(&self, id: &CustomerId) -> Result<Customer, CustomerServiceError> {
        let removed = self.repository.delete(id)?;
        if removed.current_balance != 0 {
            warn!(
                customer_id = %removed.id,
                balance = removed.current_balance,
                "customer deleted with outstanding balance"
            );
        }
        Ok(removed)
    }

    /// Apply a credit or debit and append it to the ledger.
    ///
    /// The balance change is reverted when the ledger rejects the entry so the
    /// balance always equals the sum of recorded transactions.
    pub fn record_transaction(
        &self,
        id: &CustomerId,
        request: NewTransaction,
        staff_username: &str,
    ) -> Result<Transaction, CustomerServiceError> {
        if request.amount <= 0 {
            return Err(CustomerServiceError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if request.amount > MAX_TRANSACTION_AMOUNT {
            return Err(CustomerServiceError::Validation(format!(
                "amount cannot exceed {}",
                format_amount(MAX_TRANSACTION_AMOUNT)
            )));
        }

        let delta = request.kind.signed(request.amount);
        let customer = self.repository.adjust_balance(id, delta)?;

        let transaction = Transaction {
            id: next_transaction_id(),
            customer_id: customer.id.clone(),
            amount: request.amount,
            kind: request.kind,
            description: match request.description.trim() {
                "" => request.kind.label().to_string(),
                description => description.to_string(),
            },
            reference_id: clean_optional(request.reference_id),
            staff_username: staff_username.to_string(),
            balance_after: customer.current_balance,
            created_at: Utc::now(),
        };

        match self.ledger.append(transaction) {
            Ok(stored) => {
                info!(
                    customer_id = %stored.customer_id,
                    amount = stored.amount,
                    kind = ?stored.kind,
                    balance = stored.balance_after,
                    staff = %stored.staff_username,
                    "credit transaction recorded"
                );
                Ok(stored)
            }
            Err(err) => {
                if let Err(rollback) = self.repository.adjust_balance(id, -delta) {
                    warn!(customer_id = %id, error = %rollback, "balance rollback failed");
                }
                Err(err.into())
            }
        }
    }

    /// CSV of every customer with text cells guarded against formula injection.
    pub fn export_csv(&self) -> Result<Vec<u8>, CustomerServiceError> {
        let customers = self.repository.search("")?;
        let rows = customers.into_iter().map(|customer| {
            vec![
                customer.id.0,
                sanitize_cell(&customer.first_name),
                sanitize_cell(&customer.last_name),
                sanitize_cell(customer.email.as_deref().unwrap_or_default()),
                sanitize_cell(customer.phone.as_deref().unwrap_or_default()),
                sanitize_cell(customer.address.as_deref().unwrap_or_default()),
                format_amount(customer.current_balance),
                customer.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        });
        Ok(render_csv(&EXPORT_HEADER, rows)?)
    }
}

/// Error raised by the customer service.
#[derive(Debug, thiserror::Error)]
pub enum CustomerServiceError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::domain::TransactionKind;
    use crate::customers::memory::InMemoryCustomerStore;

    fn service() -> CustomerService<InMemoryCustomerStore, InMemoryCustomerStore> {
        let store = Arc::new(InMemoryCustomerStore::default());
        CustomerService::new(store.clone(), store)
    }

    fn customer(service: &CustomerService<InMemoryCustomerStore, InMemoryCustomerStore>, first: &str, last: &str) -> Customer {
        service
            .create(NewCustomer {
                first_name: first.to_string(),
                last_name: last.to_string(),
                ..NewCustomer::default()
            })
            .expect("customer created")
    }

    /// Directory that lets a credit land between the service reading a customer
    /// and its profile write reaching the store.
    struct CreditDuringUpdate {
        inner: InMemoryCustomerStore,
        credit: i64,
    }

    impl CustomerRepository for CreditDuringUpdate {
        fn insert(&self, customer: Customer) -> Result<Customer, RepositoryError> {
            self.inner.insert(customer)
        }

        fn update_profile(
            &self,
            id: &CustomerId,
            changes: &CustomerUpdate,
        ) -> Result<Customer, RepositoryError> {
            self.inner.adjust_balance(id, self.credit)?;
            self.inner.update_profile(id, changes)
        }

        fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
            self.inner.fetch(id)
        }

        fn delete(&self, id: &CustomerId) -> Result<Customer, RepositoryError> {
            self.inner.delete(id)
        }

        fn search(&self, query: &str) -> Result<Vec<Customer>, RepositoryError> {
            self.inner.search(query)
        }

        fn adjust_balance(&self, id: &CustomerId, delta: i64) -> Result<Customer, RepositoryError> {
            self.inner.adjust_balance(id, delta)
        }
    }

    fn credit(amount: i64) -> NewTransaction {
        NewTransaction {
            amount,
            kind: TransactionKind::Credit,
            description: String::new(),
            reference_id: None,
        }
    }

    #[test]
    fn create_trims_names_and_starts_at_zero() {
        let service = service();
        let created = customer(&service, "  Anna ", " Muster ");
        assert_eq!(created.first_name, "Anna");
        assert_eq!(created.last_name, "Muster");
        assert_eq!(created.current_balance, 0);
        assert!(created.id.0.starts_with("cust-"));
    }

    #[test]
    fn create_rejects_blank_names() {
        let err = service()
            .create(NewCustomer {
                first_name: "Anna".to_string(),
                last_name: "   ".to_string(),
                ..NewCustomer::default()
            })
            .expect_err("blank last name");
        assert!(matches!(err, CustomerServiceError::Validation(_)));
    }

    #[test]
    fn credit_then_debit_moves_balance_and_ledger() {
        let service = service();
        let anna = customer(&service, "Anna", "Muster");

        let first = service
            .record_transaction(&anna.id, credit(2500), "kasse")
            .expect("credit");
        assert_eq!(first.balance_after, 2500);
        assert_eq!(first.description, "Gutschrift");
        assert_eq!(first.staff_username, "kasse");

        let debit = NewTransaction {
            amount: 1000,
            kind: TransactionKind::Debit,
            description: "Auszahlung bar".to_string(),
            reference_id: None,
        };
        let second = service
            .record_transaction(&anna.id, debit, "admin")
            .expect("debit");
        assert_eq!(second.balance_after, 1500);

        let detail = service.detail(&anna.id).expect("detail");
        assert_eq!(detail.customer.current_balance, 1500);
        assert_eq!(detail.transactions.len(), 2);
        assert_eq!(detail.transactions[0].id, second.id);
        let ledger_sum: i64 = detail
            .transactions
            .iter()
            .map(|txn| txn.kind.signed(txn.amount))
            .sum();
        assert_eq!(ledger_sum, detail.customer.current_balance);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let service = service();
        let anna = customer(&service, "Anna", "Muster");
        for amount in [0, -100] {
            let err = service
                .record_transaction(&anna.id, credit(amount), "kasse")
                .expect_err("invalid amount");
            assert!(matches!(err, CustomerServiceError::Validation(_)));
        }
        assert_eq!(service.get(&anna.id).expect("get").current_balance, 0);
    }

    #[test]
    fn transaction_for_unknown_customer_is_not_found() {
        let err = service()
            .record_transaction(&CustomerId("cust-missing".to_string()), credit(100), "kasse")
            .expect_err("missing customer");
        assert!(matches!(
            err,
            CustomerServiceError::Repository(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn update_keeps_absent_fields() {
        let service = service();
        let anna = customer(&service, "Anna", "Muster");
        let updated = service
            .update(
                &anna.id,
                CustomerUpdate {
                    phone: Some("079 123 45 67".to_string()),
                    ..CustomerUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(updated.first_name, "Anna");
        assert_eq!(updated.phone.as_deref(), Some("079 123 45 67"));

        let err = service
            .update(
                &anna.id,
                CustomerUpdate {
                    first_name: Some(" ".to_string()),
                    ..CustomerUpdate::default()
                },
            )
            .expect_err("blank first name");
        assert!(matches!(err, CustomerServiceError::Validation(_)));
    }

    #[test]
    fn delete_removes_customer() {
        let service = service();
        let anna = customer(&service, "Anna", "Muster");
        service.delete(&anna.id).expect("delete");
        assert!(matches!(
            service.get(&anna.id),
            Err(CustomerServiceError::Repository(RepositoryError::NotFound))
        ));
    }

    #[test]
    fn export_escapes_formula_names() {
        let service = service();
        let evil = customer(&service, "=HYPERLINK(\"x\")", "Muster");
        service
            .record_transaction(&evil.id, credit(1250), "kasse")
            .expect("credit");

        let csv = String::from_utf8(service.export_csv().expect("export")).expect("utf8");
        assert!(csv.starts_with("ID,Vorname,Nachname"));
        assert!(csv.contains("'=HYPERLINK"));
        assert!(csv.contains("12.50"));
    }

    #[test]
    fn profile_update_keeps_a_concurrent_credit() {
        let store = InMemoryCustomerStore::default();
        let service = CustomerService::new(
            Arc::new(CreditDuringUpdate {
                inner: store.clone(),
                credit: 500,
            }),
            Arc::new(store.clone()),
        );
        let anna = service
            .create(NewCustomer {
                first_name: "Anna".to_string(),
                last_name: "Muster".to_string(),
                ..NewCustomer::default()
            })
            .expect("customer created");

        let updated = service
            .update(
                &anna.id,
                CustomerUpdate {
                    phone: Some(" 079 123 45 67 ".to_string()),
                    ..CustomerUpdate::default()
                },
            )
            .expect("update");

        assert_eq!(updated.phone.as_deref(), Some("079 123 45 67"));
        assert_eq!(updated.current_balance, 500);
        let stored = store.fetch(&anna.id).expect("fetch").expect("present");
        assert_eq!(stored.current_balance, 500);
        assert_eq!(stored.phone.as_deref(), Some("079 123 45 67"));
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let service = service();
        let anna = customer(&service, "Anna", "Muster");

        let err = service
            .record_transaction(&anna.id, credit(MAX_TRANSACTION_AMOUNT + 1), "kasse")
            .expect_err("above the cap");
        assert!(matches!(err, CustomerServiceError::Validation(_)));

        service
            .record_transaction(&anna.id, credit(MAX_TRANSACTION_AMOUNT), "kasse")
            .expect("cap itself is allowed");
        assert_eq!(
            service.get(&anna.id).expect("get").current_balance,
            MAX_TRANSACTION_AMOUNT
        );
    }

    #[test]
    fn balance_overflow_is_refused_and_store_stays_usable() {
        let service = service();
        let anna = customer(&service, "Anna", "Muster");
        let store = service.repository().clone();

        store
            .adjust_balance(&anna.id, i64::MAX)
            .expect("first credit fits");
        let err = store
            .adjust_balance(&anna.id, i64::MAX)
            .expect_err("second credit overflows");
        assert!(matches!(err, RepositoryError::BalanceOutOfRange));

        assert_eq!(service.get(&anna.id).expect("get").current_balance, i64::MAX);
        assert_eq!(service.search("anna").expect("search").len(), 1);
        service
            .record_transaction(
                &anna.id,
                NewTransaction {
                    amount: 100,
                    kind: TransactionKind::Debit,
                    description: String::new(),
                    reference_id: None,
                },
                "kasse",
            )
            .expect("store still accepts writes");
    }
}
