use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customers::CustomerId;

/// Identifier wrapper for completed purchases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseId(pub String);

impl std::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_relevance() -> String {
    "Wichtig".to_string()
}

/// Item as staff put it into the cart; `price` is in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItemInput {
    pub category: String,
    pub price_level: String,
    pub condition: String,
    #[serde(default = "default_relevance")]
    pub relevance: String,
    pub price: i64,
}

/// Item as recorded on a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: String,
    pub category: String,
    pub price_level: String,
    pub condition: String,
    pub relevance: String,
    pub price: i64,
}

/// A completed buy-in from a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub items: Vec<PurchaseItem>,
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_username: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Checkout payload. Staff identity comes from the session, never the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<PurchaseItemInput>,
    #[serde(default)]
    pub credit_customer_id: Option<CustomerId>,
}
