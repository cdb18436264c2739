mod stats;
mod stores;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Platform stats
        .route("/stats", get(stats::get_stats))
        // User management
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}/role", patch(users::set_role))
        .route("/users/{id}", delete(users::delete_user))
        // Store management
        .route("/stores", post(stores::create_store))
        .route("/stores/{id}", delete(stores::delete_store))
}
