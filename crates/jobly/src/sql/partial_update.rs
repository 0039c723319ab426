//! `SET` clause generation for partial updates.

use super::{Param, Query};
use crate::error::{JoblyError, JoblyResult};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// An ordered list of field updates.
///
/// Each entry pairs an external (API) field name with the value to store.
/// Entries keep insertion order, which decides placeholder positions in the
/// generated `SET` list. A field that is not present is left unchanged; a field
/// set to `None::<T>` is written as `NULL`.
#[derive(Debug, Clone, Default)]
pub struct Changes {
    entries: Vec<(String, Param)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field update, consuming and returning `self`.
    pub fn set<T>(mut self, field: impl Into<String>, value: T) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.push(field, value);
        self
    }

    /// Add a field update.
    ///
    /// Setting the same field twice replaces the earlier value but keeps its
    /// original position.
    pub fn push<T>(&mut self, field: impl Into<String>, value: T) -> &mut Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        let field = field.into();
        let value: Param = Arc::new(value);
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    /// Add a field update only when `value` is present.
    pub fn push_opt<T>(&mut self, field: impl Into<String>, value: Option<T>) -> &mut Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        if let Some(value) = value {
            self.push(field, value);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// External field names, in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

/// The `SET` list of an `UPDATE` plus its values.
#[derive(Debug, Clone)]
pub struct PartialUpdate {
    /// `"col_a"=$1, "col_b"=$2, ...`
    pub set_cols: String,
    /// Values in placeholder order.
    pub values: Vec<Param>,
}

impl PartialUpdate {
    /// Position of the first placeholder after the `SET` list.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    /// Finish the statement as
    /// `UPDATE <table> SET ... WHERE <key_column> = $<next> RETURNING <returning>`,
    /// binding `key` as the last parameter.
    ///
    /// `table`, `key_column` and `returning` are interpolated verbatim and must
    /// be trusted constants.
    pub fn into_update<K>(self, table: &str, key_column: &str, key: K, returning: &str) -> Query
    where
        K: ToSql + Sync + Send + 'static,
    {
        let key_idx = self.next_placeholder();
        let sql = format!(
            "UPDATE {table} SET {} WHERE {key_column} = ${key_idx} RETURNING {returning}",
            self.set_cols
        );
        Query::new(sql).bind_all(self.values).bind(key)
    }
}

/// Build the `SET` list for a partial update.
///
/// Each field name is mapped through `translation` (external name → column
/// name); untranslated fields use their external name. Column names are wrapped
/// in double quotes but not escaped, so translation entries must never come from
/// user input.
///
/// Returns [`JoblyError::InvalidInput`] when `changes` is empty.
///
/// ```ignore
/// let changes = Changes::new().set("firstName", "Aliya").set("age", 32_i32);
/// let update = sql_for_partial_update(changes, &[("firstName", "first_name")])?;
/// assert_eq!(update.set_cols, r#""first_name"=$1, "age"=$2"#);
/// ```
pub fn sql_for_partial_update(
    changes: Changes,
    translation: &[(&str, &str)],
) -> JoblyResult<PartialUpdate> {
    if changes.is_empty() {
        return Err(JoblyError::invalid_input("No data"));
    }

    let mut set_cols = String::new();
    let mut values = Vec::with_capacity(changes.len());
    for (idx, (field, value)) in changes.entries.into_iter().enumerate() {
        let column = translation
            .iter()
            .find(|(external, _)| *external == field)
            .map_or(field.as_str(), |&(_, column)| column);
        if idx > 0 {
            set_cols.push_str(", ");
        }
        let _ = write!(set_cols, "\"{column}\"=${}", idx + 1);
        values.push(value);
    }

    Ok(PartialUpdate { set_cols, values })
}
