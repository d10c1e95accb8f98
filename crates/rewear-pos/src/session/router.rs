use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Cart, Role, SessionToken, StaffUser};
use super::service::{SessionError, SessionService};
use super::store::SessionStore;
use crate::error::json_error;
use crate::purchases::PurchaseItemInput;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    token: String,
    username: String,
    role: Role,
}

#[derive(Debug, Serialize)]
pub(crate) struct CartView {
    items: Vec<PurchaseItemInput>,
    total: i64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.clone(),
            total: cart.total(),
        }
    }
}

/// Router builder for login, logout, and the session cart.
pub fn session_router<S>(service: Arc<SessionService<S>>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/auth/login", post(login_handler::<S>))
        .route("/api/auth/logout", post(logout_handler::<S>))
        .route("/api/session", get(session_handler::<S>))
        .route("/api/session/cart", delete(clear_cart_handler::<S>))
        .route("/api/session/cart/items", post(add_item_handler::<S>))
        .route(
            "/api/session/cart/items/:index",
            delete(remove_item_handler::<S>),
        )
        .with_state(service)
}

/// Middleware resolving `Authorization: Bearer <token>` into request extensions.
///
/// Requests without a token pass through anonymously; an unknown token is
/// rejected with 401 so clients drop their stale login.
pub async fn resolve_session<S>(
    State(service): State<Arc<SessionService<S>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: SessionStore + 'static,
{
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| SessionToken(value.trim().to_string()));

    if let Some(token) = token {
        match service.resolve(&token) {
            Ok(context) => {
                request.extensions_mut().insert(context.user);
                request.extensions_mut().insert(context.token);
            }
            Err(err) => return session_error_response(err),
        }
    }

    next.run(request).await
}

/// Signed-in staff member; audit usernames come from here, never from a body.
pub fn require_staff(user: Option<&StaffUser>) -> Result<&StaffUser, SessionError> {
    user.ok_or(SessionError::UnknownSession)
}

pub fn require_admin(user: Option<&StaffUser>) -> Result<(), SessionError> {
    match user {
        Some(user) if user.is_admin() => Ok(()),
        Some(_) => Err(SessionError::Forbidden),
        None => Err(SessionError::UnknownSession),
    }
}

pub(crate) fn session_error_response(err: SessionError) -> Response {
    let status = match err {
        SessionError::InvalidCredentials | SessionError::UnknownSession => StatusCode::UNAUTHORIZED,
        SessionError::Forbidden => StatusCode::FORBIDDEN,
        SessionError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    json_error(status, err.to_string())
}

pub(crate) async fn login_handler<S>(
    State(service): State<Arc<SessionService<S>>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.login(&request.username, &request.password) {
        Ok(context) => {
            let body = LoginResponse {
                token: context.token.0,
                username: context.user.username,
                role: context.user.role,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn logout_handler<S>(
    State(service): State<Arc<SessionService<S>>>,
    token: Option<Extension<SessionToken>>,
) -> Response
where
    S: SessionStore + 'static,
{
    let Some(Extension(token)) = token else {
        return session_error_response(SessionError::UnknownSession);
    };
    match service.logout(&token) {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "signed_out" }))).into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn session_handler<S>(
    State(service): State<Arc<SessionService<S>>>,
    token: Option<Extension<SessionToken>>,
) -> Response
where
    S: SessionStore + 'static,
{
    let Some(Extension(token)) = token else {
        return session_error_response(SessionError::UnknownSession);
    };
    match service.resolve(&token) {
        Ok(context) => {
            let body = json!({
                "user": context.user,
                "cart": CartView::from(&context.cart),
                "started_at": context.started_at,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn add_item_handler<S>(
    State(service): State<Arc<SessionService<S>>>,
    token: Option<Extension<SessionToken>>,
    Json(item): Json<PurchaseItemInput>,
) -> Response
where
    S: SessionStore + 'static,
{
    let Some(Extension(token)) = token else {
        return session_error_response(SessionError::UnknownSession);
    };
    if item.price < 0 {
        return json_error(StatusCode::UNPROCESSABLE_ENTITY, "price cannot be negative");
    }
    match service.update_cart(&token, |cart| {
        cart.add(item);
        CartView::from(&*cart)
    }) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn remove_item_handler<S>(
    State(service): State<Arc<SessionService<S>>>,
    token: Option<Extension<SessionToken>>,
    Path(index): Path<usize>,
) -> Response
where
    S: SessionStore + 'static,
{
    let Some(Extension(token)) = token else {
        return session_error_response(SessionError::UnknownSession);
    };
    match service.update_cart(&token, |cart| cart.remove(index).map(|_| CartView::from(&*cart))) {
        Ok(Some(view)) => (StatusCode::OK, Json(view)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "cart item not found"),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn clear_cart_handler<S>(
    State(service): State<Arc<SessionService<S>>>,
    token: Option<Extension<SessionToken>>,
) -> Response
where
    S: SessionStore + 'static,
{
    let Some(Extension(token)) = token else {
        return session_error_response(SessionError::UnknownSession);
    };
    match service.update_cart(&token, |cart| {
        cart.take();
        CartView::from(&*cart)
    }) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => session_error_response(err),
    }
}
