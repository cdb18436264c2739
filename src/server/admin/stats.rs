use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::{RequireAuth, require_role};
use crate::server::AppState;
use crate::server::dto::AdminStats;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::Role;

pub async fn get_stats(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&auth.0, &[Role::Admin])?;

    let stats = AdminStats {
        total_users: state.db.count_users().api_err("Failed to count users")?,
        total_stores: state.db.count_stores().api_err("Failed to count stores")?,
        total_ratings: state
            .db
            .count_ratings()
            .api_err("Failed to count ratings")?,
    };

    Ok(Json(ApiResponse::success(stats)))
}
