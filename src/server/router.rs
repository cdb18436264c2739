use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, put},
};

use super::admin::admin_router;
use super::{account, owner, stores};
use crate::auth::{CredentialHasher, SessionStore};
use crate::db::Db;

pub struct AppState {
    pub db: Arc<dyn Db>,
    pub sessions: Arc<SessionStore>,
    pub hasher: CredentialHasher,
    /// TTL applied to sessions issued by login and registration.
    pub session_ttl: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(db: Arc<dyn Db>, sessions: Arc<SessionStore>, session_ttl: Duration) -> Self {
        Self {
            db,
            sessions,
            hasher: CredentialHasher::new(),
            session_ttl,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/auth", account::account_router())
        .route("/api/v1/stores", get(stores::list_stores))
        .route("/api/v1/stores/{id}/rating", put(stores::submit_rating))
        .route("/api/v1/owner/stores", get(owner::list_owned_stores))
        .route(
            "/api/v1/owner/stores/{id}/ratings",
            get(owner::store_ratings),
        )
        .nest("/api/v1/admin", admin_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
