//! Statement logging for any [`GenericClient`].
//!
//! [`TracingClient`] wraps a client and emits one `tracing` event per statement
//! under the `jobly.sql` target, after the statement completes:
//!
//! ```ignore
//! let conn = TracingClient::new(pool.get().await?).level(Level::INFO);
//! let jobs = Job::find_all(&conn, None).await?;
//! ```

use crate::client::GenericClient;
use crate::error::JoblyResult;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::Level;

/// Default truncation length for logged SQL, in bytes.
pub const DEFAULT_MAX_SQL_LENGTH: usize = 200;

/// A client wrapper that logs every statement it runs.
#[derive(Debug, Clone)]
pub struct TracingClient<C> {
    client: C,
    level: Level,
    max_sql_length: Option<usize>,
}

impl<C: GenericClient> TracingClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            level: Level::DEBUG,
            max_sql_length: Some(DEFAULT_MAX_SQL_LENGTH),
        }
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn display_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    fn record<T>(&self, sql: &str, param_count: usize, elapsed: Duration, result: &JoblyResult<T>) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.display_sql(sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        match result {
            Ok(_) => emit_at_level!(
                self.level,
                target: "jobly.sql",
                param_count,
                elapsed_ms,
                sql = %sql,
            ),
            Err(err) => tracing::warn!(
                target: "jobly.sql",
                param_count,
                elapsed_ms,
                sql = %sql,
                error = %err,
                "statement failed"
            ),
        }
    }
}

/// Cut `sql` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

impl<C: GenericClient> GenericClient for TracingClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<Vec<Row>> {
        let start = Instant::now();
        let result = self.client.query(sql, params).await;
        self.record(sql, params.len(), start.elapsed(), &result);
        result
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<u64> {
        let start = Instant::now();
        let result = self.client.execute(sql, params).await;
        self.record(sql, params.len(), start.elapsed(), &result);
        result
    }
}
