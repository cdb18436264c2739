use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{
    RequireAuth, clear_session_cookie, session_cookie, session_token_from_cookie_header,
};
use crate::server::AppState;
use crate::server::dto::{ChangePasswordRequest, LoginRequest, PrincipalSummary, RegisterRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation;
use crate::types::{Role, User};

pub fn account_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/password", put(change_password))
        .route("/me", get(me))
}

fn with_session_cookie(mut response: Response, token: &str) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(&session_cookie(token))
        .map_err(|_| ApiError::internal("Failed to build session cookie"))?;
    response.headers_mut().insert(SET_COOKIE, value);
    Ok(response)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let mut violations = Vec::new();
    validation::check_name(&mut violations, &req.name);
    validation::check_email(&mut violations, &req.email);
    validation::check_address(&mut violations, &req.address);
    validation::check_password(&mut violations, &req.password);
    validation::finish(violations)?;

    let hash = state.hasher.hash(&req.password)?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        address: req.address,
        credential_hash: Some(hash),
        role: Role::Rater,
        created_at: now,
        updated_at: now,
    };

    // The UNIQUE email constraint surfaces as Conflict here.
    state.db.create_user(&user).api_err("Failed to create user")?;

    let token = state
        .sessions
        .create(&user.id, user.role, state.session_ttl);

    let response = (
        StatusCode::CREATED,
        Json(ApiResponse::success(PrincipalSummary::from(&user))),
    )
        .into_response();
    with_session_cookie(response, &token)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    // Same rejection for unknown email, federated account, and wrong
    // password; the caller learns nothing about which it was.
    let denied = || ApiError::unauthenticated("Invalid email or password");

    let user = state
        .db
        .get_user_by_email(&req.email)
        .api_err("Failed to look up user")?
        .ok_or_else(denied)?;

    let hash = user.credential_hash.as_deref().ok_or_else(denied)?;

    if !state.hasher.verify(&req.password, hash)? {
        return Err(denied());
    }

    let token = state
        .sessions
        .create(&user.id, user.role, state.session_ttl);

    let response = Json(ApiResponse::success(PrincipalSummary::from(&user))).into_response();
    with_session_cookie(response, &token)
}

pub async fn logout(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = headers
        .get(axum::http::header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_token_from_cookie_header)
    {
        state.sessions.destroy(&token);
    }

    let mut response = Json(ApiResponse::success(serde_json::json!({
        "logged_out": true
    })))
    .into_response();
    let value = HeaderValue::from_str(&clear_session_cookie())
        .map_err(|_| ApiError::internal("Failed to build session cookie"))?;
    response.headers_mut().insert(SET_COOKIE, value);
    Ok(response)
}

pub async fn change_password(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = auth.0;

    // Reject a malformed new password before touching credentials.
    let mut violations = Vec::new();
    validation::check_password(&mut violations, &req.new_password);
    validation::finish(violations)?;

    let user = state
        .db
        .get_user(&principal.id)
        .api_err("Failed to look up user")?
        .or_not_found("User not found")?;

    let hash = user
        .credential_hash
        .as_deref()
        .ok_or_else(|| ApiError::forbidden("Account has no password credential"))?;

    if !state.hasher.verify(&req.current_password, hash)? {
        return Err(ApiError::forbidden("Current password is incorrect"));
    }

    let new_hash = state.hasher.hash(&req.new_password)?;
    state
        .db
        .update_user_password(&user.id, &new_hash)
        .api_err("Failed to update password")?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "password_changed": true
    }))))
}

pub async fn me(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user(&auth.0.id)
        .api_err("Failed to look up user")?
        .or_not_found("User not found")?;

    Ok(Json(ApiResponse::success(PrincipalSummary::from(&user))))
}
