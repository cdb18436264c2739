use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireAuth, require_role};
use crate::server::AppState;
use crate::server::dto::CreateStoreRequest;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation;
use crate::types::{Role, Store};

pub async fn create_store(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStoreRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&auth.0, &[Role::Admin])?;

    let mut violations = Vec::new();
    validation::check_name(&mut violations, &req.name);
    if !req.email.is_empty() {
        validation::check_email(&mut violations, &req.email);
    }
    validation::check_address(&mut violations, &req.address);
    validation::finish(violations)?;

    if let Some(owner_id) = &req.owner_id {
        let owner = state
            .db
            .get_user(owner_id)
            .api_err("Failed to look up owner")?
            .ok_or_else(|| ApiError::not_found("Owner not found"))?;

        // A plain rater given a store becomes a store owner; admins keep
        // their role.
        if owner.role == Role::Rater {
            state
                .db
                .update_user_role(&owner.id, Role::StoreOwner)
                .api_err("Failed to update owner role")?;
        }
    }

    let now = Utc::now();
    let store = Store {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        address: req.address,
        owner_id: req.owner_id,
        created_at: now,
        updated_at: now,
    };

    state
        .db
        .create_store(&store)
        .api_err("Failed to create store")?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(store))))
}

pub async fn delete_store(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&auth.0, &[Role::Admin])?;

    // Cascade removes every rating referencing the store.
    let deleted = state
        .db
        .delete_store(&id)
        .api_err("Failed to delete store")?;

    if !deleted {
        return Err(ApiError::not_found("Store not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
