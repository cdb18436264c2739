use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireAuth, require_role};
use crate::server::AppState;
use crate::server::dto::{CreateUserRequest, PaginationParams, SetRoleRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation;
use crate::types::{Role, User};

pub async fn list_users(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&auth.0, &[Role::Admin])?;

    let cursor = params.cursor.as_deref().unwrap_or("");

    let users = state
        .db
        .list_users(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list users")?;

    let (users, next_cursor, has_more) =
        paginate(users, DEFAULT_PAGE_SIZE as usize, |u| u.id.clone());

    Ok(Json(PaginatedResponse::new(users, next_cursor, has_more)))
}

pub async fn create_user(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&auth.0, &[Role::Admin])?;

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
        role: req.role,
        created_at: now,
        updated_at: now,
    };

    state.db.create_user(&user).api_err("Failed to create user")?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn set_role(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&auth.0, &[Role::Admin])?;

    // Already-issued sessions keep their role snapshot; the new role takes
    // effect at the user's next login.
    state
        .db
        .update_user_role(&id, req.role)
        .api_err("Failed to update role")?;

    let user = state
        .db
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&auth.0, &[Role::Admin])?;

    if id == auth.0.id {
        return Err(ApiError::bad_request("Cannot delete the current account"));
    }

    let deleted = state
        .db
        .delete_user(&id)
        .api_err("Failed to delete user")?;

    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
