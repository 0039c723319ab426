use super::{Param, param};
use tokio_postgres::types::ToSql;

/// Hand-written SQL whose placeholders are already numbered.
///
/// The text is sent as-is; [`Query::bind`] only appends values, so the caller
/// keeps the `$n` markers and the bind order in step.
#[must_use]
#[derive(Debug, Clone)]
pub struct Query {
    text: String,
    values: Vec<Param>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            values: Vec::new(),
        }
    }

    /// Value for the next `$n`.
    pub fn bind<T>(self, value: T) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.bind_all([param(value)])
    }

    pub fn bind_all(mut self, values: impl IntoIterator<Item = Param>) -> Self {
        self.values.extend(values);
        self
    }

    pub fn sql(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[Param] {
        &self.values
    }

    fn borrowed(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }

    impl_query_exec! {
        prepare(self) {
            (self.text.clone(), self.borrowed())
        }
    }
}
