//! Execution engine trait.
//!
//! The builder never talks to a database directly. It hands a finished SQL
//! string and its [`Bindings`] to an [`Executor`]. Implementations are provided
//! for `tokio-postgres` clients and transactions (and for pooled clients with
//! the `pool` feature); anything else, including test doubles, can implement
//! the trait.

use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::qb::Bindings;
use crate::row::Row;
use tokio_postgres::Statement;

/// A database that runs parameterized statements.
///
/// Engines must bind parameters server-side (prepared execution), never by
/// interpolating values into the SQL text.
pub trait Executor: Send + Sync {
    /// Handle returned by [`Executor::prepare`].
    type Statement: Send;

    /// Dialect the engine understands. Builders created with
    /// [`QueryBuilder::new`](crate::QueryBuilder::new) render for it.
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    /// Execute a query and return all rows.
    fn fetch_all(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = QbResult<Vec<Row>>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// Multiple rows are not an error; the first one wins.
    fn fetch_opt(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = QbResult<Option<Row>>> + Send {
        async move {
            let rows = self.fetch_all(sql, bindings).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = QbResult<u64>> + Send;

    /// Prepare a statement without executing it.
    fn prepare(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = QbResult<Self::Statement>> + Send;
}

impl<T: Executor> Executor for &T {
    type Statement = T::Statement;

    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn fetch_all(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = QbResult<Vec<Row>>> + Send {
        (**self).fetch_all(sql, bindings)
    }

    fn fetch_opt(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = QbResult<Option<Row>>> + Send {
        (**self).fetch_opt(sql, bindings)
    }

    fn execute(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = QbResult<u64>> + Send {
        (**self).execute(sql, bindings)
    }

    fn prepare(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = QbResult<Self::Statement>> + Send {
        (**self).prepare(sql)
    }
}

impl Executor for tokio_postgres::Client {
    type Statement = Statement;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_all(&self, sql: &str, bindings: &Bindings) -> QbResult<Vec<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &bindings.as_pg_params())
            .await
            .map_err(QbError::from_db_error)?;
        rows.iter().map(Row::from_pg).collect()
    }

    // `query_opt` rejects more than one row; the first one wins here.
    async fn fetch_opt(&self, sql: &str, bindings: &Bindings) -> QbResult<Option<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &bindings.as_pg_params())
            .await
            .map_err(QbError::from_db_error)?;
        rows.first().map(Row::from_pg).transpose()
    }

    async fn execute(&self, sql: &str, bindings: &Bindings) -> QbResult<u64> {
        tokio_postgres::Client::execute(self, sql, &bindings.as_pg_params())
            .await
            .map_err(QbError::from_db_error)
    }

    async fn prepare(&self, sql: &str) -> QbResult<Statement> {
        tokio_postgres::Client::prepare(self, sql)
            .await
            .map_err(QbError::from_db_error)
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    type Statement = Statement;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_all(&self, sql: &str, bindings: &Bindings) -> QbResult<Vec<Row>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &bindings.as_pg_params())
            .await
            .map_err(QbError::from_db_error)?;
        rows.iter().map(Row::from_pg).collect()
    }

    // `query_opt` rejects more than one row; the first one wins here.
    async fn fetch_opt(&self, sql: &str, bindings: &Bindings) -> QbResult<Option<Row>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &bindings.as_pg_params())
            .await
            .map_err(QbError::from_db_error)?;
        rows.first().map(Row::from_pg).transpose()
    }

    async fn execute(&self, sql: &str, bindings: &Bindings) -> QbResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, &bindings.as_pg_params())
            .await
            .map_err(QbError::from_db_error)
    }

    async fn prepare(&self, sql: &str) -> QbResult<Statement> {
        tokio_postgres::Transaction::prepare(self, sql)
            .await
            .map_err(QbError::from_db_error)
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    type Statement = Statement;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_all(&self, sql: &str, bindings: &Bindings) -> QbResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        Executor::fetch_all(client, sql, bindings).await
    }

    async fn fetch_opt(&self, sql: &str, bindings: &Bindings) -> QbResult<Option<Row>> {
        let client: &tokio_postgres::Client = self;
        Executor::fetch_opt(client, sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &Bindings) -> QbResult<u64> {
        let client: &tokio_postgres::Client = self;
        Executor::execute(client, sql, bindings).await
    }

    async fn prepare(&self, sql: &str) -> QbResult<Statement> {
        // Goes through deadpool's per-connection statement cache.
        self.prepare_cached(sql)
            .await
            .map_err(QbError::from_db_error)
    }
}
