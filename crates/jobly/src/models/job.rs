use super::double_option;
use crate::changeset::{Validate, ValidationErrors};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{FilterField, FilterSpec, Predicate, compose};
use crate::row::{FromRow, RowExt};
use crate::sql::{Changes, Sql, param, query, sql_for_partial_update};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Job fields share their column names.
pub const JOB_COLUMNS: &[(&str, &str)] = &[];

const RETURNING: &str = "id, title, salary, equity, company_handle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

/// A job plus the name of the company offering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
}

impl FromRow for JobDetail {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            job: Job::from_row(row)?,
            company_name: row.try_get_column("company_name")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

fn check_pay(errs: &mut ValidationErrors, salary: Option<i32>, equity: Option<Decimal>) {
    if let Some(salary) = salary {
        errs.check_min("salary", salary, 0);
    }
    if let Some(equity) = equity {
        errs.check_range("equity", equity, Decimal::ZERO, Decimal::ONE);
    }
}

impl Validate for NewJob {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        errs.check_len("title", &self.title, 1, 255);
        check_pay(&mut errs, self.salary, self.equity);
        errs.check_len("companyHandle", &self.company_handle, 1, 25);
        errs
    }
}

/// Patch for a job. `id` and `companyHandle` are fixed once created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equity: Option<Option<Decimal>>,
}

impl JobUpdate {
    pub fn into_changes(self) -> Changes {
        let mut changes = Changes::new();
        changes
            .push_opt("title", self.title.flatten())
            .push_opt("salary", self.salary)
            .push_opt("equity", self.equity);
        changes
    }
}

impl Validate for JobUpdate {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        errs.check_not_null("title", &self.title);
        if let Some(Some(title)) = &self.title {
            errs.check_len("title", title, 1, 255);
        }
        check_pay(&mut errs, self.salary.flatten(), self.equity.flatten());
        errs
    }
}

/// Optional narrowing for [`Job::find_all`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

impl Validate for JobFilter {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        if let Some(title) = &self.title {
            errs.check_len("title", title, 1, 255);
        }
        if let Some(min) = self.min_salary {
            errs.check_min("minSalary", min, 0);
        }
        errs
    }
}

static JOB_FILTERS: FilterSpec<JobFilter> = FilterSpec {
    base: "SELECT j.id, j.title, j.salary, j.equity, j.company_handle, c.name AS company_name \
           FROM jobs j JOIN companies c ON c.handle = j.company_handle",
    fields: &[
        FilterField::new("j.salary", Predicate::AtLeast(|f| f.min_salary.map(param))),
        FilterField::new("j.title", Predicate::Contains(|f| f.title.as_deref())),
        FilterField::new("j.equity", Predicate::Flag(|f| f.has_equity == Some(true), "> 0")),
    ],
    order_by: "j.title, j.id",
};

impl Job {
    /// Insert a job. An unknown company handle is rejected as invalid input.
    pub async fn create(conn: &impl GenericClient, data: NewJob) -> JoblyResult<Job> {
        let data = data.validated()?;
        query(format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) RETURNING {RETURNING}"
        ))
        .bind(data.title)
        .bind(data.salary)
        .bind(data.equity)
        .bind(data.company_handle)
        .fetch_one_as(conn)
        .await
    }

    /// All jobs ordered by title, optionally narrowed by `filters`.
    ///
    /// `hasEquity: false` is the same as leaving the flag out.
    pub async fn find_all(
        conn: &impl GenericClient,
        filters: Option<&JobFilter>,
    ) -> JoblyResult<Vec<JobDetail>> {
        if let Some(filters) = filters {
            filters.validate().into_result()?;
        }
        Self::list_query(filters).fetch_all_as(conn).await
    }

    /// The unvalidated list query behind [`Job::find_all`].
    pub fn list_query(filters: Option<&JobFilter>) -> Sql {
        compose(&JOB_FILTERS, filters)
    }

    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<JobDetail> {
        query(format!("{} WHERE j.id = $1", JOB_FILTERS.base))
            .bind(id)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))
    }

    pub async fn update(conn: &impl GenericClient, id: i32, data: JobUpdate) -> JoblyResult<Job> {
        let data = data.validated()?;
        sql_for_partial_update(data.into_changes(), JOB_COLUMNS)?
            .into_update("jobs", "id", id, RETURNING)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))
    }

    pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
        let deleted = query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        if deleted == 0 {
            return Err(JoblyError::not_found(format!("No job: {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fake::RecordingClient;
    use pretty_assertions::assert_eq;

    const BASE: &str = "SELECT j.id, j.title, j.salary, j.equity, j.company_handle, \
                        c.name AS company_name FROM jobs j JOIN companies c ON c.handle = j.company_handle";

    #[test]
    fn equity_must_be_a_fraction() {
        let data = NewJob {
            title: "CEO".into(),
            salary: Some(-5),
            equity: Some(Decimal::new(15, 1)),
            company_handle: "c1".into(),
        };
        let errs = data.validate();
        assert!(errs.has("salary"));
        assert!(errs.has("equity"));
    }

    #[test]
    fn update_rejects_fixed_fields() {
        for body in [
            serde_json::json!({ "id": 7 }),
            serde_json::json!({ "companyHandle": "c2" }),
        ] {
            assert!(serde_json::from_value::<JobUpdate>(body).is_err());
        }
    }

    #[test]
    fn update_rejects_wrongly_typed_values() {
        let body = serde_json::json!({ "salary": "lots" });
        assert!(serde_json::from_value::<JobUpdate>(body).is_err());
    }

    #[test]
    fn update_allows_null_pay_but_not_null_title() {
        let update: JobUpdate =
            serde_json::from_value(serde_json::json!({ "salary": null, "equity": null })).unwrap();
        assert!(update.validate().is_empty());

        let update: JobUpdate =
            serde_json::from_value(serde_json::json!({ "title": null, "salary": 10 })).unwrap();
        assert_eq!(update.title, Some(None));
        let errs = update.validate();
        assert_eq!(errs.len(), 1);
        assert!(errs.has("title"));
    }

    #[tokio::test]
    async fn find_all_without_filters_orders_by_title() {
        let conn = RecordingClient::default();
        Job::find_all(&conn, None).await.unwrap();
        assert_eq!(
            conn.statements(),
            vec![(format!("{BASE} ORDER BY j.title, j.id"), 0)]
        );
    }

    #[tokio::test]
    async fn find_all_joins_threshold_and_title() {
        let conn = RecordingClient::default();
        let filter = JobFilter {
            title: Some("ceo".into()),
            min_salary: Some(150_000),
            has_equity: None,
        };
        Job::find_all(&conn, Some(&filter)).await.unwrap();
        assert_eq!(
            conn.statements(),
            vec![(
                format!("{BASE} WHERE j.salary >= $1 AND j.title ILIKE $2 ORDER BY j.title, j.id"),
                2
            )]
        );
    }

    #[tokio::test]
    async fn has_equity_adds_a_literal_predicate() {
        let conn = RecordingClient::default();
        let filter = JobFilter {
            has_equity: Some(true),
            ..Default::default()
        };
        Job::find_all(&conn, Some(&filter)).await.unwrap();
        assert_eq!(
            conn.last_sql(),
            format!("{BASE} WHERE j.equity > 0 ORDER BY j.title, j.id")
        );

        let filter = JobFilter {
            has_equity: Some(false),
            ..Default::default()
        };
        Job::find_all(&conn, Some(&filter)).await.unwrap();
        assert_eq!(conn.last_sql(), format!("{BASE} ORDER BY j.title, j.id"));
    }

    #[tokio::test]
    async fn missing_job_is_not_found_everywhere() {
        let conn = RecordingClient::default();
        assert!(Job::get(&conn, 0).await.unwrap_err().is_not_found());

        let update = JobUpdate {
            title: Some(Some("New".into())),
            ..Default::default()
        };
        let err = Job::update(&conn, 0, update).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: No job: 0");

        assert!(Job::remove(&conn, 0).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_binds_id_after_changes() {
        let conn = RecordingClient::default();
        let update = JobUpdate {
            title: Some(Some("New".into())),
            salary: Some(None),
            equity: Some(Some(Decimal::new(5, 1))),
        };
        let _ = Job::update(&conn, 300, update).await;
        assert_eq!(
            conn.statements(),
            vec![(
                "UPDATE jobs SET \"title\"=$1, \"salary\"=$2, \"equity\"=$3 WHERE id = $4 \
                 RETURNING id, title, salary, equity, company_handle"
                    .to_string(),
                4
            )]
        );
    }
}
