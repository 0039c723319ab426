use super::double_option;
use crate::changeset::{Validate, ValidationCode, ValidationError, ValidationErrors};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{FilterField, FilterSpec, Predicate, compose};
use crate::row::{FromRow, RowExt};
use crate::sql::{Changes, Sql, param, query, sql_for_partial_update};
use crate::validate::is_handle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// API field name → `companies` column, for partial updates.
pub const COMPANY_COLUMNS: &[(&str, &str)] =
    &[("numEmployees", "num_employees"), ("logoUrl", "logo_url")];

const RETURNING: &str = "handle, name, description, num_employees, logo_url";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// A job as listed under its company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

impl FromRow for CompanyJob {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
        })
    }
}

/// A company together with its jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<CompanyJob>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Validate for NewCompany {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        errs.check_len("handle", &self.handle, 1, 25);
        if !self.handle.is_empty() && !is_handle(&self.handle) {
            errs.push(ValidationError::new(
                "handle",
                ValidationCode::Format,
                "must be lowercase letters, digits, '-' or '_'",
            ));
        }
        errs.check_len("name", &self.name, 1, 255);
        if let Some(n) = self.num_employees {
            errs.check_min("numEmployees", n, 0);
        }
        if let Some(url) = &self.logo_url {
            errs.check_url("logoUrl", url);
        }
        errs
    }
}

/// Patch for a company. The handle cannot change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyUpdate {
    /// Present fields, keyed by API name, in declaration order.
    pub fn into_changes(self) -> Changes {
        let mut changes = Changes::new();
        changes
            .push_opt("name", self.name.flatten())
            .push_opt("description", self.description.flatten())
            .push_opt("numEmployees", self.num_employees)
            .push_opt("logoUrl", self.logo_url);
        changes
    }
}

impl Validate for CompanyUpdate {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        errs.check_not_null("name", &self.name);
        errs.check_not_null("description", &self.description);
        if let Some(Some(name)) = &self.name {
            errs.check_len("name", name, 1, 255);
        }
        if let Some(Some(n)) = self.num_employees {
            errs.check_min("numEmployees", n, 0);
        }
        if let Some(Some(url)) = &self.logo_url {
            errs.check_url("logoUrl", url);
        }
        errs
    }
}

/// Optional narrowing for [`Company::find_all`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

impl Validate for CompanyFilter {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        if let Some(name) = &self.name {
            errs.check_len("name", name, 1, 255);
        }
        if let Some(min) = self.min_employees {
            errs.check_min("minEmployees", min, 0);
        }
        if let Some(max) = self.max_employees {
            errs.check_min("maxEmployees", max, 0);
        }
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees)
            && min > max
        {
            errs.push(ValidationError::new(
                "minEmployees",
                ValidationCode::Range,
                "cannot be greater than maxEmployees",
            ));
        }
        errs
    }
}

static COMPANY_FILTERS: FilterSpec<CompanyFilter> = FilterSpec {
    base: "SELECT handle, name, description, num_employees, logo_url FROM companies",
    fields: &[
        FilterField::new("num_employees", Predicate::AtLeast(|f| f.min_employees.map(param))),
        FilterField::new("num_employees", Predicate::AtMost(|f| f.max_employees.map(param))),
        FilterField::new("name", Predicate::Contains(|f| f.name.as_deref())),
    ],
    order_by: "name",
};

impl Company {
    /// Insert a company. A taken handle or name is a [`JoblyError::Conflict`].
    pub async fn create(conn: &impl GenericClient, data: NewCompany) -> JoblyResult<Company> {
        let data = data.validated()?;
        query(format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {RETURNING}"
        ))
        .bind(data.handle)
        .bind(data.name)
        .bind(data.description)
        .bind(data.num_employees)
        .bind(data.logo_url)
        .fetch_one_as(conn)
        .await
    }

    /// All companies ordered by name, optionally narrowed by `filters`.
    pub async fn find_all(
        conn: &impl GenericClient,
        filters: Option<&CompanyFilter>,
    ) -> JoblyResult<Vec<Company>> {
        if let Some(filters) = filters {
            filters.validate().into_result()?;
        }
        Self::list_query(filters).fetch_all_as(conn).await
    }

    /// The unvalidated list query behind [`Company::find_all`].
    pub fn list_query(filters: Option<&CompanyFilter>) -> Sql {
        compose(&COMPANY_FILTERS, filters)
    }

    /// One company with its jobs.
    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let company: Company = query(format!("SELECT {RETURNING} FROM companies WHERE handle = $1"))
            .bind(handle.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;

        let jobs = query(
            "SELECT id, title, salary, equity FROM jobs WHERE company_handle = $1 ORDER BY id",
        )
        .bind(handle.to_string())
        .fetch_all_as(conn)
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Apply a partial update and return the stored row.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        data: CompanyUpdate,
    ) -> JoblyResult<Company> {
        let data = data.validated()?;
        sql_for_partial_update(data.into_changes(), COMPANY_COLUMNS)?
            .into_update("companies", "handle", handle.to_string(), RETURNING)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))
    }

    /// Delete a company; its jobs go with it.
    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        let deleted = query("DELETE FROM companies WHERE handle = $1")
            .bind(handle.to_string())
            .execute(conn)
            .await?;
        if deleted == 0 {
            return Err(JoblyError::not_found(format!("No company: {handle}")));
        }
        Ok(())
    }
}
