//! Declarative filter composition for list queries.
//!
//! Each entity describes its searchable columns once, as a [`FilterSpec`], and
//! [`compose`] turns a filter value into a parameterized `SELECT`:
//!
//! ```ignore
//! static JOB_FILTERS: FilterSpec<JobFilter> = FilterSpec {
//!     base: "SELECT ... FROM jobs j",
//!     fields: &[
//!         FilterField::new("j.salary", Predicate::AtLeast(|f| f.min_salary.map(param))),
//!         FilterField::new("j.title", Predicate::Contains(|f| f.title.as_deref())),
//!         FilterField::new("j.equity", Predicate::Flag(|f| f.has_equity == Some(true), "> 0")),
//!     ],
//!     order_by: "j.title",
//! };
//!
//! let q = compose(&JOB_FILTERS, Some(&filter));
//! ```
//!
//! Clauses are emitted in a fixed order whatever the declaration order:
//! thresholds first, then text matches, then flags. Within a group the
//! declaration order is kept, so the same set of active filters always yields
//! the same SQL and the same parameter positions.

use crate::sql::{Param, Sql};

/// How a filter value constrains its column.
pub enum Predicate<F> {
    /// `<column> >= $n`
    AtLeast(fn(&F) -> Option<Param>),
    /// `<column> <= $n`
    AtMost(fn(&F) -> Option<Param>),
    /// `<column> ILIKE $n`, bound to `%value%`
    Contains(fn(&F) -> Option<&str>),
    /// `<column> <literal>` when the flag is set; binds nothing.
    Flag(fn(&F) -> bool, &'static str),
}

impl<F> Predicate<F> {
    fn rank(&self) -> u8 {
        match self {
            Self::AtLeast(_) | Self::AtMost(_) => 0,
            Self::Contains(_) => 1,
            Self::Flag(..) => 2,
        }
    }
}

/// One searchable column.
pub struct FilterField<F> {
    /// Column expression, e.g. `j.salary`. Interpolated verbatim.
    pub column: &'static str,
    pub predicate: Predicate<F>,
}

impl<F> FilterField<F> {
    pub const fn new(column: &'static str, predicate: Predicate<F>) -> Self {
        Self { column, predicate }
    }

    /// Append this field's clause when the filter activates it.
    ///
    /// Returns `false` if the filter leaves this field inactive.
    fn append_to(&self, filters: &F, q: &mut Sql) -> bool {
        match &self.predicate {
            Predicate::AtLeast(get) => get(filters).is_some_and(|v| {
                q.push(self.column).push(" >= ").push_bind_value(v);
                true
            }),
            Predicate::AtMost(get) => get(filters).is_some_and(|v| {
                q.push(self.column).push(" <= ").push_bind_value(v);
                true
            }),
            Predicate::Contains(get) => get(filters).is_some_and(|text| {
                q.push(self.column)
                    .push(" ILIKE ")
                    .push_bind(format!("%{text}%"));
                true
            }),
            Predicate::Flag(get, literal) => {
                if !get(filters) {
                    return false;
                }
                q.push(self.column).push(" ").push(literal);
                true
            }
        }
    }
}

/// Base query, searchable columns, and default ordering of one list endpoint.
///
/// `base`, the column expressions, and `order_by` are trusted constants.
pub struct FilterSpec<F: 'static> {
    pub base: &'static str,
    pub fields: &'static [FilterField<F>],
    pub order_by: &'static str,
}

/// Build the list query for `spec`, narrowed by `filters` when present.
pub fn compose<F: 'static>(spec: &FilterSpec<F>, filters: Option<&F>) -> Sql {
    let mut q = Sql::new(spec.base);

    if let Some(filters) = filters {
        let mut ordered: Vec<&FilterField<F>> = spec.fields.iter().collect();
        // Stable: keeps declaration order within a rank.
        ordered.sort_by_key(|field| field.predicate.rank());

        let mut clauses = Sql::empty();
        let mut active = 0;
        for field in ordered {
            let mut clause = Sql::empty();
            if field.append_to(filters, &mut clause) {
                if active > 0 {
                    clauses.push(" AND ");
                }
                clauses.push_sql(clause);
                active += 1;
            }
        }

        if active > 0 {
            q.push(" WHERE ");
            q.push_sql(clauses);
        }
    }

    q.push(" ORDER BY ").push(spec.order_by);
    q
}
