//! # jobly
//!
//! Data layer for the Jobly job board, on top of PostgreSQL.
//!
//! ## Features
//!
//! - **Partial updates**: [`sql_for_partial_update`] turns an ordered [`Changes`] list into a
//!   parameterized `SET` clause
//! - **Filter composition**: list endpoints describe their searchable columns once as a
//!   [`filter::FilterSpec`] and [`filter::compose`] builds the `WHERE` clause
//! - **Injected clients**: every model function takes `&impl GenericClient`, so a pooled
//!   connection, a plain client, or a transaction all work
//! - **Statement logging**: wrap any client in [`TracingClient`]
//!
//! ## Example
//!
//! ```ignore
//! use jobly::models::{Job, JobFilter};
//!
//! let pool = jobly::create_pool("postgresql:///jobly", 16)?;
//! let conn = jobly::TracingClient::new(pool.get().await?);
//!
//! let filter = JobFilter { title: Some("engineer".into()), ..Default::default() };
//! let jobs = Job::find_all(&conn, Some(&filter)).await?;
//! ```

pub mod changeset;
pub mod client;
pub mod error;
pub mod filter;
pub mod migrate;
pub mod models;
pub mod monitor;
pub mod pool;
pub mod row;
pub mod sql;
pub mod validate;

pub use changeset::{Validate, ValidationCode, ValidationError, ValidationErrors};
pub use client::GenericClient;
pub use error::{ErrorKind, JoblyError, JoblyResult};
pub use monitor::TracingClient;
pub use pool::create_pool;
pub use row::{FromRow, RowExt};
pub use sql::{Changes, PartialUpdate, Query, Sql, query, sql, sql_for_partial_update};

pub use deadpool_postgres;
pub use tokio_postgres;
