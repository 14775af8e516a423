//! API module
//!
//! HTTP API endpoints and middleware.

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::storage::LocalFileStore;

pub mod middleware;
pub mod routes;

pub use routes::create_router;

/// Shared state for the HTTP layer.
#[derive(Debug, Clone, FromRef)]
pub struct AppState {
    pub pool: PgPool,
    pub store: LocalFileStore,
}
