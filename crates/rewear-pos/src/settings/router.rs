use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};

use super::{SettingsError, SettingsOverride, SettingsService};
use crate::error::json_error;
use crate::session::router::session_error_response;
use crate::session::{require_admin, StaffUser};

pub fn settings_router(service: Arc<SettingsService>) -> Router {
    Router::new()
        .route("/api/settings", get(get_handler).put(update_handler))
        .with_state(service)
}

fn settings_error_response(err: SettingsError) -> Response {
    let status = match err {
        SettingsError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SettingsError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    json_error(status, err.to_string())
}

async fn get_handler(State(service): State<Arc<SettingsService>>) -> Response {
    match service.get() {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(err) => settings_error_response(err),
    }
}

async fn update_handler(
    State(service): State<Arc<SettingsService>>,
    user: Option<Extension<StaffUser>>,
    Json(changes): Json<SettingsOverride>,
) -> Response {
    if let Err(err) = require_admin(user.as_deref()) {
        return session_error_response(err);
    }
    match service.update(changes) {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(err) => settings_error_response(err),
    }
}
