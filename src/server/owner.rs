use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::{RequireAuth, require_ownership, require_role};
use crate::server::AppState;
use crate::server::dto::{OwnerStoreRatings, StoreListing};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::Role;

pub async fn list_owned_stores(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = auth.0;
    require_role(&principal, &[Role::StoreOwner])?;

    let stores = state
        .db
        .list_stores_by_owner(&principal.id)
        .api_err("Failed to list stores")?;

    let mut listings = Vec::with_capacity(stores.len());
    for store in stores {
        let aggregate = state
            .db
            .store_aggregate(&store.id)
            .api_err("Failed to compute store aggregate")?;

        listings.push(StoreListing {
            store,
            average_rating: aggregate.average_rating,
            total_ratings: aggregate.total_ratings,
            user_rating: None,
        });
    }

    Ok(Json(ApiResponse::success(listings)))
}

pub async fn store_ratings(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = auth.0;
    require_role(&principal, &[Role::StoreOwner])?;

    // A missing store takes the same path as a store owned by someone else:
    // the ownership check fails with PermissionDenied, so the error code
    // never reveals whether the id exists.
    let owner_id = state
        .db
        .get_store(&store_id)
        .api_err("Failed to look up store")?
        .and_then(|s| s.owner_id);
    require_ownership(&principal, owner_id.as_deref())?;

    let ratings = state
        .db
        .list_store_ratings(&store_id)
        .api_err("Failed to list ratings")?;
    let aggregate = state
        .db
        .store_aggregate(&store_id)
        .api_err("Failed to compute store aggregate")?;

    Ok(Json(ApiResponse::success(OwnerStoreRatings {
        ratings,
        aggregate,
    })))
}
