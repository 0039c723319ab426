// Shared execution surface for `Sql` and `Query`.
//
// The `prepare` block renders `(String, Vec<&(dyn ToSql + Sync)>)`; every
// method below runs it and hands the pair to a `GenericClient`.
macro_rules! impl_query_exec {
    (prepare($this:ident) $prepare:block) => {
        /// Run and return every row.
        pub async fn fetch_all(
            &$this,
            conn: &impl $crate::client::GenericClient,
        ) -> $crate::error::JoblyResult<Vec<tokio_postgres::Row>> {
            let (text, values) = $prepare;
            conn.query(&text, &values).await
        }

        pub async fn fetch_all_as<T: $crate::row::FromRow>(
            &$this,
            conn: &impl $crate::client::GenericClient,
        ) -> $crate::error::JoblyResult<Vec<T>> {
            $this.fetch_all(conn).await?.iter().map(T::from_row).collect()
        }

        /// Exactly one row expected; no rows is `NotFound`.
        pub async fn fetch_one(
            &$this,
            conn: &impl $crate::client::GenericClient,
        ) -> $crate::error::JoblyResult<tokio_postgres::Row> {
            let (text, values) = $prepare;
            conn.query_one(&text, &values).await
        }

        pub async fn fetch_one_as<T: $crate::row::FromRow>(
            &$this,
            conn: &impl $crate::client::GenericClient,
        ) -> $crate::error::JoblyResult<T> {
            T::from_row(&$this.fetch_one(conn).await?)
        }

        pub async fn fetch_opt(
            &$this,
            conn: &impl $crate::client::GenericClient,
        ) -> $crate::error::JoblyResult<Option<tokio_postgres::Row>> {
            let (text, values) = $prepare;
            conn.query_opt(&text, &values).await
        }

        pub async fn fetch_opt_as<T: $crate::row::FromRow>(
            &$this,
            conn: &impl $crate::client::GenericClient,
        ) -> $crate::error::JoblyResult<Option<T>> {
            match $this.fetch_opt(conn).await? {
                Some(row) => T::from_row(&row).map(Some),
                None => Ok(None),
            }
        }

        /// Run for its effect; returns the affected row count.
        pub async fn execute(
            &$this,
            conn: &impl $crate::client::GenericClient,
        ) -> $crate::error::JoblyResult<u64> {
            let (text, values) = $prepare;
            conn.execute(&text, &values).await
        }
    };
}
