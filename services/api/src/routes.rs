use crate::infra::{AppState, Purchases, Services, Sessions};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use rewear_pos::catalog::catalog_router;
use rewear_pos::customers::{customer_router, CustomerId};
use rewear_pos::digitize::{digitize_router, ReceiptExtractor};
use rewear_pos::error::json_error;
use rewear_pos::purchases::{purchase_error_response, purchase_router, CheckoutRequest};
use rewear_pos::session::{
    resolve_session, session_router, InMemorySessionStore, SessionError, SessionToken, StaffUser,
};
use rewear_pos::settings::settings_router;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct CartCheckout {
    sessions: Arc<Sessions>,
    purchases: Arc<Purchases>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CartCheckoutRequest {
    #[serde(default)]
    credit_customer_id: Option<CustomerId>,
}

/// The complete HTTP surface with session resolution in front of it.
pub(crate) fn with_pos_routes<E>(services: &Services<E>) -> Router
where
    E: ReceiptExtractor + 'static,
{
    let checkout = CartCheckout {
        sessions: services.sessions.clone(),
        purchases: services.purchases.clone(),
    };

    Router::new()
        .merge(session_router(services.sessions.clone()))
        .merge(customer_router(services.customers.clone()))
        .merge(purchase_router(services.purchases.clone()))
        .merge(digitize_router(services.digitize.clone()))
        .merge(catalog_router(services.catalog.clone()))
        .merge(settings_router(services.settings.clone()))
        .merge(
            Router::new()
                .route("/api/session/checkout", post(cart_checkout_endpoint))
                .with_state(checkout),
        )
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(middleware::from_fn_with_state(
            services.sessions.clone(),
            resolve_session::<InMemorySessionStore>,
        ))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Checks out the session cart; the cart is restored when checkout fails.
pub(crate) async fn cart_checkout_endpoint(
    State(checkout): State<CartCheckout>,
    user: Option<Extension<StaffUser>>,
    token: Option<Extension<SessionToken>>,
    Json(request): Json<CartCheckoutRequest>,
) -> Response {
    let (Some(Extension(user)), Some(Extension(token))) = (user, token) else {
        return json_error(
            StatusCode::UNAUTHORIZED,
            SessionError::UnknownSession.to_string(),
        );
    };

    let items = match checkout.sessions.update_cart(&token, |cart| cart.take()) {
        Ok(items) => items,
        Err(err) => return json_error(StatusCode::UNAUTHORIZED, err.to_string()),
    };

    let request = CheckoutRequest {
        items: items.clone(),
        credit_customer_id: request.credit_customer_id,
    };
    match checkout.purchases.checkout(request, Some(&user.username)) {
        Ok(purchase) => (StatusCode::CREATED, Json(purchase)).into_response(),
        Err(err) => {
            if let Err(restore) = checkout.sessions.update_cart(&token, |cart| {
                for item in items {
                    cart.add(item);
                }
            }) {
                warn!(error = %restore, "cart could not be restored after failed checkout");
            }
            purchase_error_response(err)
        }
    }
}
