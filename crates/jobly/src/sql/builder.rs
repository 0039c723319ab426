use super::Param;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Self-numbering SQL builder.
///
/// Text and values are kept apart: `segments` holds the raw SQL *between*
/// placeholders, so there is always exactly one more segment than bound value.
/// Placeholders are numbered only when rendering, which lets independently
/// built fragments be spliced together with [`Sql::push_sql`].
#[must_use]
#[derive(Debug, Clone)]
pub struct Sql {
    segments: Vec<String>,
    params: Vec<Param>,
}

impl Default for Sql {
    fn default() -> Self {
        Self::empty()
    }
}

impl Sql {
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            segments: vec![initial_sql.into()],
            params: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(String::new())
    }

    fn tail(&mut self) -> &mut String {
        if self.segments.is_empty() {
            self.segments.push(String::new());
        }
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }

    /// Append raw SQL. Never pass user input here.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.tail().push_str(sql);
        self
    }

    /// Append a placeholder bound to `value`.
    pub fn push_bind<T>(&mut self, value: T) -> &mut Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.push_bind_value(Arc::new(value))
    }

    /// [`Sql::push_bind`] for a value that is already a [`Param`].
    pub fn push_bind_value(&mut self, value: Param) -> &mut Self {
        self.tail();
        self.params.push(value);
        self.segments.push(String::new());
        self
    }

    /// Splice `other` onto the end; its placeholders are renumbered after ours.
    pub fn push_sql(&mut self, other: Sql) -> &mut Self {
        let mut segments = other.segments.into_iter();
        if let Some(head) = segments.next() {
            self.tail().push_str(&head);
        }
        self.segments.extend(segments);
        self.params.extend(other.params);
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Render with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                let _ = write!(out, "${idx}");
            }
            out.push_str(segment);
        }
        out
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Borrowed values in the shape `tokio-postgres` expects.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }

    impl_query_exec! {
        prepare(self) {
            debug_assert_eq!(self.segments.len(), self.params.len() + 1);
            (self.to_sql(), self.params_ref())
        }
    }
}
