use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::domain::{CustomerId, CustomerUpdate, NewCustomer, NewTransaction};
use super::repository::{CustomerRepository, RepositoryError, TransactionLedger};
use super::service::{CustomerService, CustomerServiceError};
use crate::error::json_error;
use crate::session::router::session_error_response;
use crate::session::{require_admin, require_staff, StaffUser};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    search: String,
}

/// Router builder for the customer directory and credit ledger.
pub fn customer_router<R, L>(service: Arc<CustomerService<R, L>>) -> Router
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    Router::new()
        .route(
            "/api/customers",
            get(search_handler::<R, L>).post(create_handler::<R, L>),
        )
        .route("/api/customers/export", get(export_handler::<R, L>))
        .route(
            "/api/customers/:customer_id",
            get(detail_handler::<R, L>)
                .put(update_handler::<R, L>)
                .delete(delete_handler::<R, L>),
        )
        .route(
            "/api/customers/:customer_id/transactions",
            post(transaction_handler::<R, L>),
        )
        .with_state(service)
}

pub(crate) fn customer_error_response(err: CustomerServiceError) -> Response {
    let status = match &err {
        CustomerServiceError::Validation(_)
        | CustomerServiceError::Repository(RepositoryError::BalanceOutOfRange) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CustomerServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CustomerServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        CustomerServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CustomerServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.to_string())
}

pub(crate) async fn search_handler<R, L>(
    State(service): State<Arc<CustomerService<R, L>>>,
    user: Option<Extension<StaffUser>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    match service.search(&params.search) {
        Ok(customers) => (StatusCode::OK, Json(customers)).into_response(),
        Err(err) => customer_error_response(err),
    }
}

pub(crate) async fn create_handler<R, L>(
    State(service): State<Arc<CustomerService<R, L>>>,
    user: Option<Extension<StaffUser>>,
    Json(new_customer): Json<NewCustomer>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    match service.create(new_customer) {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(err) => customer_error_response(err),
    }
}

pub(crate) async fn detail_handler<R, L>(
    State(service): State<Arc<CustomerService<R, L>>>,
    user: Option<Extension<StaffUser>>,
    Path(customer_id): Path<String>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    match service.detail(&CustomerId(customer_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => customer_error_response(err),
    }
}

pub(crate) async fn update_handler<R, L>(
    State(service): State<Arc<CustomerService<R, L>>>,
    user: Option<Extension<StaffUser>>,
    Path(customer_id): Path<String>,
    Json(changes): Json<CustomerUpdate>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_staff(user.as_deref()) {
        return session_error_response(err);
    }
    match service.update(&CustomerId(customer_id), changes) {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(err) => customer_error_response(err),
    }
}

pub(crate) async fn delete_handler<R, L>(
    State(service): State<Arc<CustomerService<R, L>>>,
    user: Option<Extension<StaffUser>>,
    Path(customer_id): Path<String>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.delete(&CustomerId(customer_id)) {
        Ok(removed) => (StatusCode::OK, Json(removed)).into_response(),
        Err(err) => customer_error_response(err),
    }
}

pub(crate) async fn transaction_handler<R, L>(
    State(service): State<Arc<CustomerService<R, L>>>,
    user: Option<Extension<StaffUser>>,
    Path(customer_id): Path<String>,
    Json(request): Json<NewTransaction>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    let staff = match require_staff(user.as_deref()) {
        Ok(staff) => staff.username.clone(),
        Err(err) => return session_error_response(err),
    };
    match service.record_transaction(&CustomerId(customer_id), request, &staff) {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(err) => customer_error_response(err),
    }
}

pub(crate) async fn export_handler<R, L>(
    State(service): State<Arc<CustomerService<R, L>>>,
    user: Option<Extension<StaffUser>>,
) -> Response
where
    R: CustomerRepository + 'static,
    L: TransactionLedger + 'static,
{
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.export_csv() {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"kunden.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => customer_error_response(err),
    }
}
