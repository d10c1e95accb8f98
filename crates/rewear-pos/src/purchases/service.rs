use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{CheckoutRequest, Purchase, PurchaseId, PurchaseItem};
use super::repository::PurchaseRepository;
use super::stats::{self, DailyStats, MonthlyStats, TodayStats};
use crate::customers::{
    CustomerRepository, CustomerService, CustomerServiceError, NewTransaction, RepositoryError,
    TransactionKind, TransactionLedger,
};
use crate::export::{format_amount, render_csv, sanitize_cell, ExportError};

const EXPORT_HEADER: [&str; 8] = [
    "Datum",
    "Ankauf-Nr",
    "Kategorie",
    "Preisniveau",
    "Zustand",
    "Relevanz",
    "Preis (CHF)",
    "Mitarbeiter",
];

static PURCHASE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_purchase_id() -> PurchaseId {
    let id = PURCHASE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PurchaseId(format!("pur-{id:06}"))
}

/// Checkout and reporting over the purchase history.
pub struct PurchaseService<P, R, L> {
    purchases: Arc<P>,
    customers: Arc<CustomerService<R, L>>,
}

impl<P, R, L> PurchaseService<P, R, L>
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    pub fn new(purchases: Arc<P>, customers: Arc<CustomerService<R, L>>) -> Self {
        Self {
            purchases,
            customers,
        }
    }

    /// Record a purchase; when a credit customer is named, the total is
    /// booked to their balance instead of being paid out.
    pub fn checkout(
        &self,
        request: CheckoutRequest,
        staff_username: Option<&str>,
    ) -> Result<Purchase, PurchaseError> {
        if request.items.is_empty() {
            return Err(PurchaseError::EmptyCart);
        }
        if let Some(item) = request.items.iter().find(|item| item.price < 0) {
            return Err(PurchaseError::NegativePrice(item.category.clone()));
        }
        let total = request
            .items
            .iter()
            .try_fold(0i64, |sum, item| sum.checked_add(item.price))
            .ok_or(PurchaseError::TotalOutOfRange)?;

        if let Some(customer_id) = &request.credit_customer_id {
            self.customers.get(customer_id)?;
        }

        let id = next_purchase_id();
        let items: Vec<PurchaseItem> = request
            .items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| PurchaseItem {
                id: format!("{}-{}", id.0, idx + 1),
                category: item.category,
                price_level: item.price_level,
                condition: item.condition,
                relevance: item.relevance,
                price: item.price,
            })
            .collect();

        let purchase = Purchase {
            id,
            items,
            total,
            credit_customer_id: request.credit_customer_id,
            staff_username: staff_username.map(str::to_string),
            timestamp: Utc::now(),
        };
        let stored = self.purchases.insert(purchase)?;

        if let Some(customer_id) = &stored.credit_customer_id {
            if stored.total > 0 {
                let credit = NewTransaction {
                    amount: stored.total,
                    kind: TransactionKind::Credit,
                    description: format!("Ankauf-Gutschrift {}", stored.id),
                    reference_id: Some(stored.id.0.clone()),
                };
                let staff = staff_username.unwrap_or("system");
                if let Err(err) = self.customers.record_transaction(customer_id, credit, staff) {
                    if let Err(rollback) = self.purchases.delete(&stored.id) {
                        warn!(purchase_id = %stored.id, error = %rollback, "purchase rollback failed");
                    }
                    return Err(err.into());
                }
            }
        }

        info!(
            purchase_id = %stored.id,
            total = stored.total,
            items = stored.items.len(),
            credited = stored.credit_customer_id.is_some(),
            "purchase completed"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &PurchaseId) -> Result<Purchase, PurchaseError> {
        let purchase = self.purchases.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(purchase)
    }

    pub fn list(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Purchase>, PurchaseError> {
        Ok(self.purchases.list(from, until)?)
    }

    /// CSV with one row per purchased item inside the window, newest purchase first.
    pub fn export_csv(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<u8>, PurchaseError> {
        let purchases = self.purchases.list(from, until)?;
        let rows = purchases.into_iter().flat_map(|purchase| {
            let date = purchase.timestamp.format("%Y-%m-%d %H:%M").to_string();
            let staff = sanitize_cell(purchase.staff_username.as_deref().unwrap_or_default());
            let purchase_id = purchase.id.0;
            purchase.items.into_iter().map(move |item| {
                vec![
                    date.clone(),
                    purchase_id.clone(),
                    sanitize_cell(&item.category),
                    sanitize_cell(&item.price_level),
                    sanitize_cell(&item.condition),
                    sanitize_cell(&item.relevance),
                    format_amount(item.price),
                    staff.clone(),
                ]
            })
        });
        Ok(render_csv(&EXPORT_HEADER, rows)?)
    }

    pub fn delete(&self, id: &PurchaseId) -> Result<(), PurchaseError> {
        self.purchases.delete(id)?;
        info!(purchase_id = %id, "purchase deleted");
        Ok(())
    }

    pub fn daily_stats(&self, now: DateTime<Utc>, days: i64) -> Result<Vec<DailyStats>, PurchaseError> {
        let purchases = self.purchases.list(None, None)?;
        Ok(stats::daily(&purchases, now, days))
    }

    pub fn monthly_stats(&self, months: usize) -> Result<Vec<MonthlyStats>, PurchaseError> {
        let purchases = self.purchases.list(None, None)?;
        Ok(stats::monthly(&purchases, months))
    }

    pub fn today_stats(&self, now: DateTime<Utc>) -> Result<TodayStats, PurchaseError> {
        let purchases = self.purchases.list(None, None)?;
        Ok(stats::today(&purchases, now))
    }
}

/// Error raised by the purchase service.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("a purchase needs at least one item")]
    EmptyCart,
    #[error("item '{0}' has a negative price")]
    NegativePrice(String),
    #[error("purchase total exceeds the supported range")]
    TotalOutOfRange,
    #[error(transparent)]
    Customer(#[from] CustomerServiceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
