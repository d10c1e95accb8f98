use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::purchases::PurchaseItemInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "staff" | "mitarbeiter" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// Credentials as configured for the shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// The signed-in staff member as seen by request handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    pub username: String,
    pub role: Role,
}

impl StaffUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Opaque bearer token identifying a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

/// Items collected before checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<PurchaseItemInput>,
}

impl Cart {
    pub fn add(&mut self, item: PurchaseItemInput) {
        self.items.push(item);
    }

    pub fn remove(&mut self, index: usize) -> Option<PurchaseItemInput> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |sum, item| sum.saturating_add(item.price))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Empties the cart, handing back what it held.
    pub fn take(&mut self) -> Vec<PurchaseItemInput> {
        std::mem::take(&mut self.items)
    }
}

/// Everything the shop front keeps between requests for one login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub token: SessionToken,
    pub user: StaffUser,
    pub cart: Cart,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64) -> PurchaseItemInput {
        PurchaseItemInput {
            category: "Hoodie".to_string(),
            price_level: "Günstig".to_string(),
            condition: "Gebraucht/Gut".to_string(),
            relevance: "Wichtig".to_string(),
            price,
        }
    }

    #[test]
    fn cart_tracks_total_and_removal() {
        let mut cart = Cart::default();
        cart.add(item(400));
        cart.add(item(650));
        assert_eq!(cart.total(), 1050);

        let removed = cart.remove(0).expect("first item");
        assert_eq!(removed.price, 400);
        assert!(cart.remove(5).is_none());
        assert_eq!(cart.total(), 650);

        let taken = cart.take();
        assert_eq!(taken.len(), 1);
        assert!(cart.is_empty());
    }

    #[test]
    fn role_accepts_legacy_staff_name() {
        assert_eq!(Role::parse("Mitarbeiter"), Some(Role::Staff));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("owner"), None);
    }
}
