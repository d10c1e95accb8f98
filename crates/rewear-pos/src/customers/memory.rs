use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{Customer, CustomerId, CustomerUpdate, Transaction};
use super::repository::{CustomerRepository, RepositoryError, TransactionLedger};

/// Process-local directory and ledger used by the service binary and tests.
#[derive(Default, Clone)]
pub struct InMemoryCustomerStore {
    customers: Arc<Mutex<BTreeMap<CustomerId, Customer>>>,
    transactions: Arc<Mutex<Vec<Transaction>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("customer store mutex poisoned".to_string()))
}

impl InMemoryCustomerStore {
    pub fn len(&self) -> usize {
        self.customers.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CustomerRepository for InMemoryCustomerStore {
    fn insert(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        let mut guard = lock(&self.customers)?;
        if guard.contains_key(&customer.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    fn update_profile(
        &self,
        id: &CustomerId,
        changes: &CustomerUpdate,
    ) -> Result<Customer, RepositoryError> {
        let mut guard = lock(&self.customers)?;
        let customer = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        customer.apply_profile(changes);
        Ok(customer.clone())
    }

    fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let guard = lock(&self.customers)?;
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &CustomerId) -> Result<Customer, RepositoryError> {
        let mut guard = lock(&self.customers)?;
        guard.remove(id).ok_or(RepositoryError::NotFound)
    }

    fn search(&self, query: &str) -> Result<Vec<Customer>, RepositoryError> {
        let guard = lock(&self.customers)?;
        let mut found: Vec<Customer> = guard
            .values()
            .filter(|customer| customer.matches_search(query))
            .cloned()
            .collect();
        found.sort_by_key(|customer| {
            (
                customer.last_name.to_lowercase(),
                customer.first_name.to_lowercase(),
            )
        });
        Ok(found)
    }

    fn adjust_balance(&self, id: &CustomerId, delta: i64) -> Result<Customer, RepositoryError> {
        let mut guard = lock(&self.customers)?;
        let customer = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        customer.current_balance = customer
            .current_balance
            .checked_add(delta)
            .ok_or(RepositoryError::BalanceOutOfRange)?;
        Ok(customer.clone())
    }
}

impl TransactionLedger for InMemoryCustomerStore {
    fn append(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let mut guard = lock(&self.transactions)?;
        guard.push(transaction.clone());
        Ok(transaction)
    }

    fn for_customer(&self, id: &CustomerId) -> Result<Vec<Transaction>, RepositoryError> {
        let guard = lock(&self.transactions)?;
        Ok(guard
            .iter()
            .rev()
            .filter(|transaction| &transaction.customer_id == id)
            .cloned()
            .collect())
    }
}
