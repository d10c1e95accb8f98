//! Buy-in checkout, purchase history, and sales statistics.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;

pub use domain::{CheckoutRequest, Purchase, PurchaseId, PurchaseItem, PurchaseItemInput};
pub use repository::{InMemoryPurchaseRepository, PurchaseRepository};
pub use router::{purchase_error_response, purchase_router};
pub use service::{PurchaseError, PurchaseService};
pub use stats::{DailyStats, MonthlyStats, TodayStats};
