//! # jobly-server
//!
//! The Jobly HTTP API: configuration, bearer-token auth, and the axum routes
//! over the [`jobly`] data layer.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
mod routes;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;

use auth::TokenKeys;
use jobly::TracingClient;
use jobly::deadpool_postgres::{self, Pool};

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub tokens: TokenKeys,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(pool: Pool, config: &ServerConfig) -> Self {
        Self {
            pool,
            tokens: TokenKeys::new(&config.auth.secret_key, config.auth.token_ttl_secs),
            bcrypt_cost: config.auth.bcrypt_work_factor,
        }
    }

    /// Borrow a pooled connection for one request.
    pub async fn conn(&self) -> ApiResult<TracingClient<deadpool_postgres::Client>> {
        let client = self.pool.get().await.map_err(jobly::JoblyError::from)?;
        Ok(TracingClient::new(client))
    }
}
