mod account;
mod admin;
pub mod dto;
mod owner;
pub mod response;
mod router;
mod stores;
pub mod validation;

pub use admin::admin_router;
pub use router::{AppState, create_router};
