//! # Rately
//!
//! A store rating server, usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! rately = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rately::auth::SessionStore;
//! use rately::db::SqliteDb;
//! use rately::server::{AppState, create_router};
//!
//! let db = SqliteDb::new("./data/rately.db").unwrap();
//! db.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(db),
//!     Arc::new(SessionStore::new()),
//!     Duration::from_secs(24 * 60 * 60),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the binary's CLI dependencies. Disable with
//!   `default-features = false`.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod types;
