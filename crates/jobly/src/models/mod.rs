//! Entity access for companies, jobs, users and applications.
//!
//! Every function takes an injected `&impl GenericClient`, validates its input
//! before touching the database, and maps storage failures into
//! [`crate::JoblyError`]. Authorization is the caller's job.

mod company;
mod job;
mod user;

pub use company::{
    COMPANY_COLUMNS, Company, CompanyDetail, CompanyFilter, CompanyJob, CompanyUpdate, NewCompany,
};
pub use job::{JOB_COLUMNS, Job, JobDetail, JobFilter, JobUpdate, NewJob};
pub use user::{
    NewUser, USER_COLUMNS, User, UserDetail, UserUpdate, hash_password, verify_password,
};

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable patch field so that an explicit `null` becomes
/// `Some(None)` while a missing key stays `None` (via `#[serde(default)]`).
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[cfg(test)]
pub(crate) mod fake {
    use crate::client::GenericClient;
    use crate::error::JoblyResult;
    use std::sync::Mutex;
    use tokio_postgres::Row;
    use tokio_postgres::types::ToSql;

    /// A client that records statements, returns no rows, and reports a fixed
    /// affected-row count.
    #[derive(Default)]
    pub(crate) struct RecordingClient {
        pub statements: Mutex<Vec<(String, usize)>>,
        pub affected: u64,
    }

    impl RecordingClient {
        pub fn affecting(affected: u64) -> Self {
            Self {
                affected,
                ..Default::default()
            }
        }

        pub fn statements(&self) -> Vec<(String, usize)> {
            self.statements.lock().unwrap().clone()
        }

        pub fn last_sql(&self) -> String {
            self.statements()
                .last()
                .map(|(sql, _)| sql.clone())
                .unwrap_or_default()
        }
    }

    impl GenericClient for RecordingClient {
        async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<Vec<Row>> {
            self.statements
                .lock()
                .unwrap()
                .push((sql.to_string(), params.len()));
            Ok(Vec::new())
        }

        async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<u64> {
            self.statements
                .lock()
                .unwrap()
                .push((sql.to_string(), params.len()));
            Ok(self.affected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        logo_url: Option<Option<String>>,
    }

    #[test]
    fn double_option_separates_null_from_missing() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.logo_url, None);

        let null: Patch = serde_json::from_str(r#"{"logo_url": null}"#).unwrap();
        assert_eq!(null.logo_url, Some(None));

        let set: Patch = serde_json::from_str(r#"{"logo_url": "http://x.img"}"#).unwrap();
        assert_eq!(set.logo_url, Some(Some("http://x.img".to_string())));
    }
}
