mod schema;
mod sqlite;

pub use sqlite::SqliteDb;

use crate::error::Result;
use crate::types::*;

/// Db defines the database interface.
pub trait Db: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>>;
    fn update_user_role(&self, id: &str, role: Role) -> Result<()>;
    fn update_user_password(&self, id: &str, credential_hash: &str) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;
    fn count_users(&self) -> Result<i64>;

    // Store operations
    fn create_store(&self, store: &Store) -> Result<()>;
    fn get_store(&self, id: &str) -> Result<Option<Store>>;
    fn list_stores(&self, search: Option<&str>, address: Option<&str>) -> Result<Vec<Store>>;
    fn list_stores_by_owner(&self, owner_id: &str) -> Result<Vec<Store>>;
    fn delete_store(&self, id: &str) -> Result<bool>;
    fn count_stores(&self) -> Result<i64>;

    // Rating operations. The upsert is the sole write path for ratings and
    // owns the one-rating-per-(user, store) invariant.
    fn upsert_rating(&self, user_id: &str, store_id: &str, value: i32) -> Result<Rating>;
    fn get_user_rating(&self, user_id: &str, store_id: &str) -> Result<Option<Rating>>;
    fn list_store_ratings(&self, store_id: &str) -> Result<Vec<RatingWithUser>>;
    fn store_aggregate(&self, store_id: &str) -> Result<RatingAggregate>;
    fn count_ratings(&self) -> Result<i64>;

    // Bootstrap check
    fn has_admin_user(&self) -> Result<bool>;
}
