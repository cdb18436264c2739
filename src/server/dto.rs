use serde::{Deserialize, Serialize};

use crate::types::{RatingAggregate, RatingWithUser, Role, Store, User};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub value: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListStoresParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// What an authenticated caller learns about themselves. The credential hash
/// never leaves the server.
#[derive(Debug, Serialize)]
pub struct PrincipalSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PrincipalSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// A store as seen in listings: record fields plus the live aggregate and the
/// caller's own rating, when one exists.
#[derive(Debug, Serialize)]
pub struct StoreListing {
    #[serde(flatten)]
    pub store: Store,
    pub average_rating: f64,
    pub total_ratings: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct OwnerStoreRatings {
    pub ratings: Vec<RatingWithUser>,
    pub aggregate: RatingAggregate,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}
