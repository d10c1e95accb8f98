use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{Purchase, PurchaseId};
use crate::customers::RepositoryError;

/// Storage abstraction for purchase history.
pub trait PurchaseRepository: Send + Sync {
    fn insert(&self, purchase: Purchase) -> Result<Purchase, RepositoryError>;
    fn fetch(&self, id: &PurchaseId) -> Result<Option<Purchase>, RepositoryError>;
    fn delete(&self, id: &PurchaseId) -> Result<(), RepositoryError>;
    /// Purchases inside the inclusive window, newest first.
    fn list(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Purchase>, RepositoryError>;
}

#[derive(Default, Clone)]
pub struct InMemoryPurchaseRepository {
    purchases: Arc<Mutex<Vec<Purchase>>>,
}

impl InMemoryPurchaseRepository {
    fn guard(&self) -> Result<MutexGuard<'_, Vec<Purchase>>, RepositoryError> {
        self.purchases
            .lock()
            .map_err(|_| RepositoryError::Unavailable("purchase store mutex poisoned".to_string()))
    }
}

impl PurchaseRepository for InMemoryPurchaseRepository {
    fn insert(&self, purchase: Purchase) -> Result<Purchase, RepositoryError> {
        let mut guard = self.guard()?;
        if guard.iter().any(|existing| existing.id == purchase.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(purchase.clone());
        Ok(purchase)
    }

    fn fetch(&self, id: &PurchaseId) -> Result<Option<Purchase>, RepositoryError> {
        let guard = self.guard()?;
        Ok(guard.iter().find(|purchase| &purchase.id == id).cloned())
    }

    fn delete(&self, id: &PurchaseId) -> Result<(), RepositoryError> {
        let mut guard = self.guard()?;
        let before = guard.len();
        guard.retain(|purchase| &purchase.id != id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn list(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Purchase>, RepositoryError> {
        let guard = self.guard()?;
        let mut selected: Vec<Purchase> = guard
            .iter()
            .filter(|purchase| from.map_or(true, |from| purchase.timestamp >= from))
            .filter(|purchase| until.map_or(true, |until| purchase.timestamp <= until))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(selected)
    }
}
