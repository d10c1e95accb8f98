use metrics_exporter_prometheus::PrometheusHandle;
use rewear_pos::catalog::CatalogService;
use rewear_pos::customers::{CustomerService, InMemoryCustomerStore};
use rewear_pos::digitize::{DigitizeService, DisabledExtractor, ReceiptExtractor};
use rewear_pos::matching::{CandidateCustomer, LevenshteinMatcher, MatchOptions};
use rewear_pos::purchases::{InMemoryPurchaseRepository, PurchaseService};
use rewear_pos::session::{InMemorySessionStore, SessionService, StaffAccount, StaffDirectory};
use rewear_pos::settings::{AppSettings, SettingsService};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Customers = CustomerService<InMemoryCustomerStore, InMemoryCustomerStore>;
pub(crate) type Purchases =
    PurchaseService<InMemoryPurchaseRepository, InMemoryCustomerStore, InMemoryCustomerStore>;
pub(crate) type Sessions = SessionService<InMemorySessionStore>;

/// Every service of the shop, wired to in-memory storage.
pub(crate) struct Services<E> {
    pub(crate) customers: Arc<Customers>,
    pub(crate) purchases: Arc<Purchases>,
    pub(crate) digitize: Arc<DigitizeService<InMemoryCustomerStore, InMemoryCustomerStore, E>>,
    pub(crate) sessions: Arc<Sessions>,
    pub(crate) catalog: Arc<CatalogService>,
    pub(crate) settings: Arc<SettingsService>,
}

impl<E> Services<E>
where
    E: ReceiptExtractor + 'static,
{
    pub(crate) fn in_memory(staff: Vec<StaffAccount>, matching: MatchOptions, extractor: E) -> Self {
        let store = Arc::new(InMemoryCustomerStore::default());
        let customers = Arc::new(CustomerService::new(store.clone(), store));
        let purchases = Arc::new(PurchaseService::new(
            Arc::new(InMemoryPurchaseRepository::default()),
            customers.clone(),
        ));
        let digitize = Arc::new(DigitizeService::new(
            customers.clone(),
            Arc::new(extractor),
            Arc::new(LevenshteinMatcher::new(matching)),
        ));
        let sessions = Arc::new(SessionService::new(
            StaffDirectory::new(staff),
            Arc::new(InMemorySessionStore::default()),
        ));

        Self {
            customers,
            purchases,
            digitize,
            sessions,
            catalog: Arc::new(CatalogService::new()),
            settings: Arc::new(SettingsService::new(AppSettings::default())),
        }
    }
}

/// Service set used by `serve`: no vision service is wired in.
pub(crate) fn production_services(
    staff: Vec<StaffAccount>,
    matching: MatchOptions,
) -> Services<DisabledExtractor> {
    Services::in_memory(staff, matching, DisabledExtractor)
}

/// Reads a JSON array of customers for the `match` command.
pub(crate) fn load_candidates(path: &Path) -> std::io::Result<Vec<CandidateCustomer>> {
    let contents = std::fs::read_to_string(path)?;
    let candidates = serde_json::from_str(&contents)?;
    Ok(candidates)
}
