//! deadpool-backed connection pool.

use crate::error::{JoblyError, JoblyResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Default maximum number of pooled connections.
pub const DEFAULT_MAX_SIZE: usize = 16;

/// Build a pool for `database_url`. No connection is opened until the first checkout.
///
/// # Example
///
/// ```ignore
/// let pool = jobly::create_pool("postgresql:///jobly", 16)?;
/// let client = pool.get().await?;
/// ```
pub fn create_pool(database_url: &str, max_size: usize) -> JoblyResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| JoblyError::Pool(format!("invalid database url: {e}")))?;

    let mgr = Manager::from_config(pg_config, NoTls, default_manager_config());
    Pool::builder(mgr)
        .max_size(max_size)
        .build()
        .map_err(|e| JoblyError::Pool(e.to_string()))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}
