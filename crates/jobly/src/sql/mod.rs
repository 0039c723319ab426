//! Parameterized SQL construction.
//!
//! - [`Query`] wraps SQL that is already numbered (`$1, $2, ...`) plus its values.
//! - [`Sql`] composes SQL dynamically and numbers placeholders itself.
//! - [`sql_for_partial_update`] turns an ordered set of [`Changes`] into the
//!   `SET` list of an `UPDATE`.
//!
//! # Example
//!
//! ```ignore
//! use jobly::sql;
//!
//! let mut q = sql("SELECT handle, name FROM companies");
//! if let Some(name) = name {
//!     q.push(" WHERE name ILIKE ").push_bind(format!("%{name}%"));
//! }
//! q.push(" ORDER BY name");
//!
//! let companies: Vec<Company> = q.fetch_all_as(&conn).await?;
//! ```

#[macro_use]
mod exec_macros;

mod builder;
mod partial_update;
mod query;

#[cfg(test)]
mod tests;

pub use builder::Sql;
pub use partial_update::{Changes, PartialUpdate, sql_for_partial_update};
pub use query::Query;

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A type-erased bind parameter.
pub type Param = Arc<dyn ToSql + Sync + Send>;

/// Box a value as a [`Param`].
pub fn param<T>(value: T) -> Param
where
    T: ToSql + Sync + Send + 'static,
{
    Arc::new(value)
}

/// Build a SQL query from a pre-numbered SQL string (`$1, $2, ...`).
pub fn query(initial_sql: impl Into<String>) -> Query {
    Query::new(initial_sql)
}

/// Start building a SQL statement.
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}
