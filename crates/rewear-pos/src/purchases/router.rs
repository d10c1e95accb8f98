use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use super::domain::{CheckoutRequest, PurchaseId};
use super::repository::PurchaseRepository;
use super::service::{PurchaseError, PurchaseService};
use crate::customers::router::customer_error_response;
use crate::customers::{CustomerRepository, RepositoryError, TransactionLedger};
use crate::error::json_error;
use crate::session::router::session_error_response;
use crate::session::{require_admin, require_staff, StaffUser};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryParams {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DailyParams {
    days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MonthlyParams {
    months: Option<usize>,
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn end_of(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last))
}

/// Router builder for checkout, purchase history, and statistics.
pub fn purchase_router<P, R, L>(service: Arc<PurchaseService<P, R, L>>) -> Router
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    Router::new()
        .route(
            "/api/purchases",
            get(list_handler::<P, R, L>).post(checkout_handler::<P, R, L>),
        )
        .route("/api/purchases/export", get(export_handler::<P, R, L>))
        .route(
            "/api/purchases/:purchase_id",
            get(get_handler::<P, R, L>).delete(delete_handler::<P, R, L>),
        )
        .route("/api/stats/daily", get(daily_handler::<P, R, L>))
        .route("/api/stats/monthly", get(monthly_handler::<P, R, L>))
        .route("/api/stats/today", get(today_handler::<P, R, L>))
        .with_state(service)
}

pub fn purchase_error_response(err: PurchaseError) -> Response {
    match err {
        PurchaseError::Customer(inner) => customer_error_response(inner),
        PurchaseError::EmptyCart
        | PurchaseError::NegativePrice(_)
        | PurchaseError::TotalOutOfRange
        | PurchaseError::Repository(RepositoryError::BalanceOutOfRange) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        PurchaseError::Repository(RepositoryError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "purchase not found")
        }
        PurchaseError::Repository(RepositoryError::Conflict) => {
            json_error(StatusCode::CONFLICT, err.to_string())
        }
        PurchaseError::Repository(RepositoryError::Unavailable(_)) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        PurchaseError::Export(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub(crate) async fn checkout_handler<P, R, L>(
    State(service): State<Arc<PurchaseService<P, R, L>>>,
    user: Option<Extension<StaffUser>>,
    Json(request): Json<CheckoutRequest>,
) -> Response
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    let staff = match require_staff(user.as_deref()) {
        Ok(staff) => staff.username.clone(),
        Err(err) => return session_error_response(err),
    };
    match service.checkout(request, Some(&staff)) {
        Ok(purchase) => (StatusCode::CREATED, Json(purchase)).into_response(),
        Err(err) => purchase_error_response(err),
    }
}

pub(crate) async fn list_handler<P, R, L>(
    State(service): State<Arc<PurchaseService<P, R, L>>>,
    user: Option<Extension<StaffUser>>,
    Query(params): Query<HistoryParams>,
) -> Response
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    let from = params.start_date.map(start_of);
    let until = params.end_date.map(end_of);
    match service.list(from, until) {
        Ok(purchases) => (StatusCode::OK, Json(purchases)).into_response(),
        Err(err) => purchase_error_response(err),
    }
}

pub(crate) async fn export_handler<P, R, L>(
    State(service): State<Arc<PurchaseService<P, R, L>>>,
    user: Option<Extension<StaffUser>>,
    Query(params): Query<HistoryParams>,
) -> Response
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    let from = params.start_date.map(start_of);
    let until = params.end_date.map(end_of);
    match service.export_csv(from, until) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"ankaeufe.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => purchase_error_response(err),
    }
}

pub(crate) async fn get_handler<P, R, L>(
    State(service): State<Arc<PurchaseService<P, R, L>>>,
    user: Option<Extension<StaffUser>>,
    Path(purchase_id): Path<String>,
) -> Response
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    match service.get(&PurchaseId(purchase_id)) {
        Ok(purchase) => (StatusCode::OK, Json(purchase)).into_response(),
        Err(err) => purchase_error_response(err),
    }
}

pub(crate) async fn delete_handler<P, R, L>(
    State(service): State<Arc<PurchaseService<P, R, L>>>,
    user: Option<Extension<StaffUser>>,
    Path(purchase_id): Path<String>,
) -> Response
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.delete(&PurchaseId(purchase_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => purchase_error_response(err),
    }
}

pub(crate) async fn daily_handler<P, R, L>(
    State(service): State<Arc<PurchaseService<P, R, L>>>,
    user: Option<Extension<StaffUser>>,
    Query(params): Query<DailyParams>,
) -> Response
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    match service.daily_stats(Utc::now(), params.days.unwrap_or(30)) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => purchase_error_response(err),
    }
}

pub(crate) async fn monthly_handler<P, R, L>(
    State(service): State<Arc<PurchaseService<P, R, L>>>,
    user: Option<Extension<StaffUser>>,
    Query(params): Query<MonthlyParams>,
) -> Response
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    match service.monthly_stats(params.months.unwrap_or(12)) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => purchase_error_response(err),
    }
}

pub(crate) async fn today_handler<P, R, L>(
    State(service): State<Arc<PurchaseService<P, R, L>>>,
    user: Option<Extension<StaffUser>>,
) -> Response
where
    P: PurchaseRepository + 'static,
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    match service.today_stats(Utc::now()) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => purchase_error_response(err),
    }
}
