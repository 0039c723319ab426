use super::double_option;
use crate::changeset::{Validate, ValidationErrors};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::row::{FromRow, RowExt};
use crate::sql::{Changes, query, sql_for_partial_update};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_postgres::Row;

/// API field name → `users` column, for partial updates.
pub const USER_COLUMNS: &[(&str, &str)] = &[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
];

const RETURNING: &str = "username, first_name, last_name, email, is_admin";

/// A user as seen outside the model layer. The password hash is never loaded
/// into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

impl FromRow for User {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            username: row.try_get_column("username")?,
            first_name: row.try_get_column("first_name")?,
            last_name: row.try_get_column("last_name")?,
            email: row.try_get_column("email")?,
            is_admin: row.try_get_column("is_admin")?,
        })
    }
}

/// A user plus the ids of the jobs they applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub applications: Vec<i32>,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

fn check_password(errs: &mut ValidationErrors, password: &str) {
    errs.check_len("password", password, 5, 20);
}

fn check_email(errs: &mut ValidationErrors, email: &str) {
    errs.check_len("email", email, 6, 60);
    errs.check_email("email", email);
}

impl Validate for NewUser {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        errs.check_len("username", &self.username, 1, 25);
        check_password(&mut errs, &self.password);
        errs.check_len("firstName", &self.first_name, 1, 30);
        errs.check_len("lastName", &self.last_name, 1, 30);
        check_email(&mut errs, &self.email);
        errs
    }
}

/// Patch for a user. `isAdmin` is accepted here; only admins may send it.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub password: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub is_admin: Option<Option<bool>>,
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        errs.check_not_null("firstName", &self.first_name);
        errs.check_not_null("lastName", &self.last_name);
        errs.check_not_null("password", &self.password);
        errs.check_not_null("email", &self.email);
        errs.check_not_null("isAdmin", &self.is_admin);
        if let Some(Some(first_name)) = &self.first_name {
            errs.check_len("firstName", first_name, 1, 30);
        }
        if let Some(Some(last_name)) = &self.last_name {
            errs.check_len("lastName", last_name, 1, 30);
        }
        if let Some(Some(password)) = &self.password {
            check_password(&mut errs, password);
        }
        if let Some(Some(email)) = &self.email {
            check_email(&mut errs, email);
        }
        errs
    }
}

/// Hash `password` with bcrypt at `cost`, off the async runtime.
pub async fn hash_password(password: String, cost: u32) -> JoblyResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| JoblyError::internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| JoblyError::internal(format!("password hashing failed: {e}")))
}

/// Check `password` against a stored bcrypt hash, off the async runtime.
pub async fn verify_password(password: String, hash: String) -> JoblyResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| JoblyError::internal(format!("password check task failed: {e}")))?
        .map_err(|e| JoblyError::internal(format!("password check failed: {e}")))
}

impl User {
    /// Store a new user with a bcrypt-hashed password.
    ///
    /// A taken username is a [`JoblyError::Conflict`].
    pub async fn register(
        conn: &impl GenericClient,
        data: NewUser,
        bcrypt_cost: u32,
    ) -> JoblyResult<User> {
        let data = data.validated()?;
        let hashed = hash_password(data.password, bcrypt_cost).await?;
        let user: User = query(format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {RETURNING}"
        ))
        .bind(data.username)
        .bind(hashed)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.is_admin)
        .fetch_one_as(conn)
        .await?;

        tracing::info!(target: "jobly.models", username = %user.username, "registered user");
        Ok(user)
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn authenticate(
        conn: &impl GenericClient,
        username: &str,
        password: &str,
    ) -> JoblyResult<User> {
        let row = query(format!("SELECT password, {RETURNING} FROM users WHERE username = $1"))
            .bind(username.to_string())
            .fetch_opt(conn)
            .await?;

        if let Some(row) = row {
            let hash: String = row.try_get_column("password")?;
            if verify_password(password.to_string(), hash).await? {
                return User::from_row(&row);
            }
        }
        Err(JoblyError::unauthorized("Invalid username/password"))
    }

    /// All users ordered by username.
    pub async fn find_all(conn: &impl GenericClient) -> JoblyResult<Vec<User>> {
        query(format!("SELECT {RETURNING} FROM users ORDER BY username"))
            .fetch_all_as(conn)
            .await
    }

    /// One user with the jobs they applied to.
    pub async fn get(conn: &impl GenericClient, username: &str) -> JoblyResult<UserDetail> {
        let user: User = query(format!("SELECT {RETURNING} FROM users WHERE username = $1"))
            .bind(username.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No user: {username}")))?;

        let rows = query("SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id")
            .bind(username.to_string())
            .fetch_all(conn)
            .await?;
        let applications = rows
            .iter()
            .map(|row| row.try_get_column("job_id"))
            .collect::<JoblyResult<Vec<i32>>>()?;

        Ok(UserDetail { user, applications })
    }

    /// Apply a partial update; a new password is re-hashed first.
    pub async fn update(
        conn: &impl GenericClient,
        username: &str,
        data: UserUpdate,
        bcrypt_cost: u32,
    ) -> JoblyResult<User> {
        let data = data.validated()?;
        let password = match data.password.flatten() {
            Some(password) => Some(hash_password(password, bcrypt_cost).await?),
            None => None,
        };

        let mut changes = Changes::new();
        changes
            .push_opt("firstName", data.first_name.flatten())
            .push_opt("lastName", data.last_name.flatten())
            .push_opt("password", password)
            .push_opt("email", data.email.flatten())
            .push_opt("isAdmin", data.is_admin.flatten());

        sql_for_partial_update(changes, USER_COLUMNS)?
            .into_update("users", "username", username.to_string(), RETURNING)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No user: {username}")))
    }

    pub async fn remove(conn: &impl GenericClient, username: &str) -> JoblyResult<()> {
        let deleted = query("DELETE FROM users WHERE username = $1")
            .bind(username.to_string())
            .execute(conn)
            .await?;
        if deleted == 0 {
            return Err(JoblyError::not_found(format!("No user: {username}")));
        }
        Ok(())
    }

    /// Record that `username` applied to job `job_id`.
    ///
    /// Both must exist; applying twice is a [`JoblyError::Conflict`].
    pub async fn apply_to_job(
        conn: &impl GenericClient,
        username: &str,
        job_id: i32,
    ) -> JoblyResult<()> {
        query("SELECT id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_opt(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {job_id}")))?;

        query("SELECT username FROM users WHERE username = $1")
            .bind(username.to_string())
            .fetch_opt(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No user: {username}")))?;

        query("INSERT INTO applications (job_id, username) VALUES ($1, $2)")
            .bind(job_id)
            .bind(username.to_string())
            .execute(conn)
            .await
            .map_err(|e| match e {
                JoblyError::Conflict(_) => {
                    JoblyError::conflict(format!("{username} already applied to job {job_id}"))
                }
                other => other,
            })?;
        Ok(())
    }
}
