use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{ReceiptCommit, ReceiptImage};
use super::extractor::{ExtractionError, ReceiptExtractor};
use super::service::{DigitizeError, DigitizeService};
use crate::customers::router::customer_error_response;
use crate::customers::{CustomerRepository, TransactionLedger};
use crate::error::json_error;
use crate::session::router::session_error_response;
use crate::session::{require_staff, StaffUser};

#[derive(Debug, Deserialize)]
pub(crate) struct NameQuery {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

/// Router builder for the receipt digitization workflow.
pub fn digitize_router<R, L, E>(service: Arc<DigitizeService<R, L, E>>) -> Router
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
    E: ReceiptExtractor + 'static,
{
    Router::new()
        .route("/api/digitize/analyze", post(analyze_handler::<R, L, E>))
        .route("/api/digitize/matches", post(matches_handler::<R, L, E>))
        .route("/api/digitize/commit", post(commit_handler::<R, L, E>))
        .with_state(service)
}

pub(crate) fn digitize_error_response(err: DigitizeError) -> Response {
    match err {
        DigitizeError::Validation(message) => json_error(StatusCode::UNPROCESSABLE_ENTITY, message),
        DigitizeError::Extraction(ExtractionError::Unavailable(_)) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        DigitizeError::Extraction(ExtractionError::Failed(_)) => {
            json_error(StatusCode::BAD_GATEWAY, err.to_string())
        }
        DigitizeError::Customer(inner) => customer_error_response(inner),
    }
}

/// Runs extraction and directory fan-out on the blocking pool so slow
/// searches never stall the async workers.
async fn on_blocking_pool<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        error!(error = %err, "digitize worker did not finish");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "digitize worker did not finish")
    })
}

/// Extracts the receipt and immediately ranks duplicates for the read name.
pub(crate) async fn analyze_handler<R, L, E>(
    State(service): State<Arc<DigitizeService<R, L, E>>>,
    user: Option<Extension<StaffUser>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
    E: ReceiptExtractor + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    let image = ReceiptImage {
        bytes: body.to_vec(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };
    let outcome = on_blocking_pool(move || {
        let receipt = service.analyze(&image)?;
        let suggestions = service.suggest_matches(
            receipt.first_name.as_deref().unwrap_or_default(),
            receipt.last_name.as_deref().unwrap_or_default(),
        );
        Ok::<_, DigitizeError>((receipt, suggestions))
    })
    .await;
    match outcome {
        Ok(Ok((receipt, suggestions))) => {
            let body = json!({ "receipt": receipt, "suggestions": suggestions });
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(Err(err)) => digitize_error_response(err),
        Err(response) => response,
    }
}

pub(crate) async fn matches_handler<R, L, E>(
    State(service): State<Arc<DigitizeService<R, L, E>>>,
    user: Option<Extension<StaffUser>>,
    Json(query): Json<NameQuery>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
    E: ReceiptExtractor + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    let outcome =
        on_blocking_pool(move || service.suggest_matches(&query.first_name, &query.last_name))
            .await;
    match outcome {
        Ok(suggestions) => (StatusCode::OK, Json(suggestions)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn commit_handler<R, L, E>(
    State(service): State<Arc<DigitizeService<R, L, E>>>,
    user: Option<Extension<StaffUser>>,
    Json(receipt): Json<ReceiptCommit>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
    E: ReceiptExtractor + 'static,
{
    let staff = match require_staff(user.as_deref()) {
        Ok(staff) => staff.username.clone(),
        Err(err) => return session_error_response(err),
    };
    match service.commit(receipt, &staff) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(err) => digitize_error_response(err),
    }
}
