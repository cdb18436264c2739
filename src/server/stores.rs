use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::auth::{RequireAuth, require_role};
use crate::server::AppState;
use crate::server::dto::{ListStoresParams, StoreListing, SubmitRatingRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::Role;

pub async fn list_stores(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListStoresParams>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = auth.0;
    require_role(&principal, &[Role::Admin, Role::Rater, Role::StoreOwner])?;

    let stores = state
        .db
        .list_stores(params.search.as_deref(), params.address.as_deref())
        .api_err("Failed to list stores")?;

    let mut listings = Vec::with_capacity(stores.len());
    for store in stores {
        let aggregate = state
            .db
            .store_aggregate(&store.id)
            .api_err("Failed to compute store aggregate")?;
        let user_rating = state
            .db
            .get_user_rating(&principal.id, &store.id)
            .api_err("Failed to look up rating")?
            .map(|r| r.value);

        listings.push(StoreListing {
            store,
            average_rating: aggregate.average_rating,
            total_ratings: aggregate.total_ratings,
            user_rating,
        });
    }

    Ok(Json(ApiResponse::success(listings)))
}

pub async fn submit_rating(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<String>,
    Json(req): Json<SubmitRatingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = auth.0;
    require_role(&principal, &[Role::Rater])?;

    // Value range and store existence are the repository's own
    // preconditions; the role check above is the only gate here.
    let rating = state
        .db
        .upsert_rating(&principal.id, &store_id, req.value)
        .api_err("Failed to submit rating")?;

    Ok(Json(ApiResponse::success(rating)))
}
