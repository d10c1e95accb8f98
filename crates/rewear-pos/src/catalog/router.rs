use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::matrix::{PriceKey, PriceMatrixEntry};
use super::service::{CatalogError, CatalogService};
use super::vocabulary::CustomCategory;
use crate::error::json_error;
use crate::session::router::session_error_response;
use crate::session::{require_admin, StaffUser};

#[derive(Debug, Deserialize)]
pub(crate) struct ImageUpdate {
    #[serde(default)]
    image: Option<String>,
}

/// Router builder for vocabularies, custom categories, and the price matrix.
pub fn catalog_router(service: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/api/categories", get(vocabulary_handler))
        .route(
            "/api/custom-categories",
            get(custom_list_handler).post(custom_add_handler),
        )
        .route("/api/custom-categories/:name", delete(custom_remove_handler))
        .route("/api/custom-categories/:name/image", put(custom_image_handler))
        .route(
            "/api/price-matrix",
            get(entries_handler).put(upsert_handler).delete(clear_handler),
        )
        .route("/api/price-matrix/lookup", get(lookup_handler))
        .route("/api/price-matrix/export", get(export_handler))
        .route("/api/price-matrix/import", post(import_handler))
        .with_state(service)
}

pub(crate) fn catalog_error_response(err: CatalogError) -> Response {
    let status = match &err {
        CatalogError::Validation(_) | CatalogError::Grid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::Conflict(_) => StatusCode::CONFLICT,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        CatalogError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.to_string())
}

pub(crate) async fn vocabulary_handler(State(service): State<Arc<CatalogService>>) -> Response {
    match service.vocabulary() {
        Ok(vocabulary) => (StatusCode::OK, Json(vocabulary)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn custom_list_handler(State(service): State<Arc<CatalogService>>) -> Response {
    match service.custom_categories() {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn custom_add_handler(
    State(service): State<Arc<CatalogService>>,
    user: Option<Extension<StaffUser>>,
    Json(category): Json<CustomCategory>,
) -> Response {
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.add_custom_category(category) {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn custom_image_handler(
    State(service): State<Arc<CatalogService>>,
    user: Option<Extension<StaffUser>>,
    Path(name): Path<String>,
    Json(update): Json<ImageUpdate>,
) -> Response {
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.set_category_image(&name, update.image) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn custom_remove_handler(
    State(service): State<Arc<CatalogService>>,
    user: Option<Extension<StaffUser>>,
    Path(name): Path<String>,
) -> Response {
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.remove_custom_category(&name) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn entries_handler(State(service): State<Arc<CatalogService>>) -> Response {
    match service.entries() {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn lookup_handler(
    State(service): State<Arc<CatalogService>>,
    Query(key): Query<PriceKey>,
) -> Response {
    match service.lookup(&key) {
        Ok(lookup) => (StatusCode::OK, Json(lookup)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn upsert_handler(
    State(service): State<Arc<CatalogService>>,
    user: Option<Extension<StaffUser>>,
    Json(entry): Json<PriceMatrixEntry>,
) -> Response {
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.upsert(entry) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn clear_handler(
    State(service): State<Arc<CatalogService>>,
    user: Option<Extension<StaffUser>>,
) -> Response {
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.clear() {
        Ok(removed) => (StatusCode::OK, Json(json!({ "removed": removed }))).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn export_handler(State(service): State<Arc<CatalogService>>) -> Response {
    match service.export_csv() {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"preismatrix.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn import_handler(
    State(service): State<Arc<CatalogService>>,
    user: Option<Extension<StaffUser>>,
    body: Bytes,
) -> Response {
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.import_csv(&body) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}
