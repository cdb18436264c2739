use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    /// Argon2id PHC string. Absent for externally-federated accounts, which
    /// cannot log in with a password.
    #[serde(skip)]
    pub credential_hash: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    /// Weak reference to the owning user. NULL for stores without an owner
    /// (including stores whose owner was later deleted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: String,
    pub user_id: String,
    pub store_id: String,
    pub value: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal user view attached to ratings returned to store owners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaterView {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingWithUser {
    #[serde(flatten)]
    pub rating: Rating,
    pub user: RaterView,
}

/// Live (average, count) summary over a store's current ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub total_ratings: i64,
}

/// The authenticated identity and role snapshot attached to a request.
/// Derived from a live session; never persisted independently.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}
