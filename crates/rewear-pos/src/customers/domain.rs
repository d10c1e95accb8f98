use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::CandidateCustomer;

/// Identifier wrapper for credit customers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A customer holding a running credit balance, in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub current_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match on first, last, and full name.
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.first_name.to_lowercase().contains(&needle)
            || self.last_name.to_lowercase().contains(&needle)
            || self.full_name().to_lowercase().contains(&needle)
    }

    /// Applies the profile fields present in `changes`. The balance is never touched.
    pub fn apply_profile(&mut self, changes: &CustomerUpdate) {
        if let Some(first_name) = &changes.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &changes.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(email) = &changes.email {
            self.email = non_blank(email);
        }
        if let Some(phone) = &changes.phone {
            self.phone = non_blank(phone);
        }
        if let Some(address) = &changes.address {
            self.address = non_blank(address);
        }
    }

    pub fn to_candidate(&self) -> CandidateCustomer {
        CandidateCustomer {
            id: self.id.0.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            current_balance: self.current_balance,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Payload for registering a customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Direction of a balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Signed balance change for a positive amount.
    pub fn signed(self, amount: i64) -> i64 {
        match self {
            TransactionKind::Credit => amount,
            TransactionKind::Debit => -amount,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionKind::Credit => "Gutschrift",
            TransactionKind::Debit => "Auszahlung",
        }
    }
}

/// Identifier wrapper for ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

/// One entry of a customer's credit ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub customer_id: CustomerId,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub staff_username: String,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

/// Request body for a manual or workflow-driven adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference_id: Option<String>,
}

/// Customer together with its ledger, newest entry first.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub transactions: Vec<Transaction>,
}
