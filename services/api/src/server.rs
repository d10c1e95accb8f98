use crate::cli::ServeArgs;
use crate::infra::{production_services, AppState};
use crate::routes::with_pos_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rewear_pos::config::AppConfig;
use rewear_pos::error::AppError;
use rewear_pos::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let staff_accounts = config.staff.len();
    let services = production_services(config.staff.clone(), config.matching);

    let app = with_pos_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        staff_accounts,
        min_score = config.matching.min_score,
        "rewear point of sale ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
