//! The fluent SELECT builder.

use crate::client::Executor;
use crate::condition::{Condition, Connector};
use crate::config::BuilderConfig;
use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::ident::Ident;
use crate::monitor::{QueryKind, log_statement};
use crate::qb::clause::{Columns, Fragment, StructuralState};
use crate::qb::param::{Bindings, ParamBinder};
use crate::row::Row;
use crate::value::{FromValue, Value};
use std::fmt;

/// Column alias used by [`QueryBuilder::list`].
pub const LIST_ALIAS: &str = "col_list";

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// JOIN flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

#[derive(Clone, Copy)]
enum ConditionClause {
    Where,
    Having,
}

/// A reusable, stateful SELECT builder bound to one execution engine.
///
/// Fluent methods take `&mut self` and return it for chaining. A terminal call
/// (`get`, `row`, `list`, `count`, ...) builds the statement, clears all state
/// and bindings, and runs it, so the same builder can be reused for the next
/// statement. One statement is in flight per builder at a time.
///
/// # Example
/// ```ignore
/// use sqlchain::{CompareOp, Condition, QueryBuilder};
///
/// let mut db = QueryBuilder::new(&client);
/// let rows = db
///     .table("users")
///     .where_(Condition::all_eq([("status", 1)]))
///     .where_(("age", CompareOp::Gt, 18))
///     .get()
///     .await?;
/// ```
pub struct QueryBuilder<C> {
    client: C,
    dialect: Dialect,
    config: BuilderConfig,
    pub(crate) state: StructuralState,
    pub(crate) binder: ParamBinder,
    pub(crate) depth: usize,
}

impl<C> fmt::Debug for QueryBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("dialect", &self.dialect)
            .field("state", &self.state)
            .field("bindings", self.binder.bindings())
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<C: Executor> QueryBuilder<C> {
    /// Create a builder that renders for the executor's native dialect.
    pub fn new(client: C) -> Self {
        Self::with_config(client, BuilderConfig::default())
    }

    /// Create a builder with explicit configuration.
    pub fn with_config(client: C, config: BuilderConfig) -> Self {
        let dialect = config.dialect.unwrap_or_else(|| client.dialect());
        Self::from_parts(client, dialect, config)
    }
}

impl QueryBuilder<()> {
    /// A builder with no engine attached, for rendering SQL only.
    pub fn detached(dialect: Dialect) -> Self {
        Self::from_parts((), dialect, BuilderConfig::default().dialect(dialect))
    }
}

impl<C> QueryBuilder<C> {
    fn from_parts(client: C, dialect: Dialect, config: BuilderConfig) -> Self {
        Self {
            client,
            dialect,
            config,
            state: StructuralState::default(),
            binder: ParamBinder::new(),
            depth: 0,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The execution engine.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Structural state of the statement being built.
    pub fn state(&self) -> &StructuralState {
        &self.state
    }

    /// Everything bound so far, including values bound inside subqueries.
    pub fn bindings(&self) -> &Bindings {
        self.binder.bindings()
    }

    pub(crate) fn quote(&self, ident: impl Into<Ident>) -> String {
        ident.into().to_sql(self.dialect)
    }

    // ==================== FROM / SELECT ====================

    /// Set the table to select from.
    pub fn table(&mut self, name: impl Into<Ident>) -> &mut Self {
        self.state.table = self.quote(name);
        self
    }

    /// Set the selected columns. An empty list or a `*` entry selects all.
    pub fn select<I, S>(&mut self, cols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Ident>,
    {
        let idents: Vec<Ident> = cols.into_iter().map(Into::into).collect();
        let star = idents
            .iter()
            .any(|i| matches!(i, Ident::Raw(s) if s == "*"));

        self.state.columns = if idents.is_empty() || star {
            Columns::All
        } else {
            Columns::List(idents.iter().map(|i| i.to_sql(self.dialect)).collect())
        };
        self
    }

    // ==================== WHERE / HAVING conditions ====================

    fn push_condition(
        &mut self,
        clause: ConditionClause,
        connector: Connector,
        cond: Condition,
    ) -> &mut Self {
        if cond.is_empty() {
            return self;
        }
        let term = cond.render(connector, self.dialect, &mut self.binder);
        self.condition_fragment(clause)
            .push(connector.separator(), &term);
        self
    }

    fn condition_fragment(&mut self, clause: ConditionClause) -> &mut Fragment {
        match clause {
            ConditionClause::Where => &mut self.state.where_clause,
            ConditionClause::Having => &mut self.state.having,
        }
    }

    pub(crate) fn push_where(&mut self, connector: Connector, term: &str) -> &mut Self {
        self.state.where_clause.push(connector.separator(), term);
        self
    }

    /// Add a WHERE condition joined with `AND`.
    pub fn where_(&mut self, cond: impl Into<Condition>) -> &mut Self {
        self.push_condition(ConditionClause::Where, Connector::And, cond.into())
    }

    /// Add a WHERE condition joined with `OR`.
    pub fn or_where(&mut self, cond: impl Into<Condition>) -> &mut Self {
        self.push_condition(ConditionClause::Where, Connector::Or, cond.into())
    }

    /// Add a WHERE condition from positional arguments (see [`Condition::from_args`]).
    pub fn where_args(&mut self, args: &[serde_json::Value]) -> QbResult<&mut Self> {
        let cond = Condition::from_args(args)?;
        Ok(self.push_condition(ConditionClause::Where, Connector::And, cond))
    }

    /// `OR` variant of [`QueryBuilder::where_args`].
    pub fn or_where_args(&mut self, args: &[serde_json::Value]) -> QbResult<&mut Self> {
        let cond = Condition::from_args(args)?;
        Ok(self.push_condition(ConditionClause::Where, Connector::Or, cond))
    }

    /// Add a HAVING condition joined with `AND`.
    pub fn having(&mut self, cond: impl Into<Condition>) -> &mut Self {
        self.push_condition(ConditionClause::Having, Connector::And, cond.into())
    }

    /// Add a HAVING condition joined with `OR`.
    pub fn or_having(&mut self, cond: impl Into<Condition>) -> &mut Self {
        self.push_condition(ConditionClause::Having, Connector::Or, cond.into())
    }

    /// Add a HAVING condition from positional arguments.
    pub fn having_args(&mut self, args: &[serde_json::Value]) -> QbResult<&mut Self> {
        let cond = Condition::from_args(args)?;
        Ok(self.push_condition(ConditionClause::Having, Connector::And, cond))
    }

    /// `OR` variant of [`QueryBuilder::having_args`].
    pub fn or_having_args(&mut self, args: &[serde_json::Value]) -> QbResult<&mut Self> {
        let cond = Condition::from_args(args)?;
        Ok(self.push_condition(ConditionClause::Having, Connector::Or, cond))
    }

    // ==================== IN / BETWEEN / NULL ====================

    fn push_in<I, V>(
        &mut self,
        field: Ident,
        values: I,
        negated: bool,
        connector: Connector,
    ) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let placeholders: Vec<String> = values
            .into_iter()
            .map(|v| self.dialect.placeholder(self.binder.bind(v)))
            .collect();
        let field = field.to_sql(self.dialect);
        if placeholders.is_empty() {
            // Emitted as-is; most engines reject `IN ()`.
            tracing::warn!(target: "sqlchain.sql", field = %field, "empty IN list");
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        let term = format!("{} {} ({})", field, keyword, placeholders.join(","));
        self.push_where(connector, &term)
    }

    /// `field IN (...)`, joined with `AND`.
    pub fn where_in<I, V>(&mut self, field: impl Into<Ident>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_in(field.into(), values, false, Connector::And)
    }

    /// `field NOT IN (...)`, joined with `AND`.
    pub fn where_not_in<I, V>(&mut self, field: impl Into<Ident>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_in(field.into(), values, true, Connector::And)
    }

    /// `field IN (...)`, joined with `OR`.
    pub fn or_where_in<I, V>(&mut self, field: impl Into<Ident>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_in(field.into(), values, false, Connector::Or)
    }

    /// `field NOT IN (...)`, joined with `OR`.
    pub fn or_where_not_in<I, V>(&mut self, field: impl Into<Ident>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_in(field.into(), values, true, Connector::Or)
    }

    fn push_between(
        &mut self,
        field: Ident,
        start: Value,
        end: Value,
        connector: Connector,
    ) -> &mut Self {
        let start = self.dialect.placeholder(self.binder.bind(start));
        let end = self.dialect.placeholder(self.binder.bind(end));
        let term = format!("{} BETWEEN {} AND {}", field.to_sql(self.dialect), start, end);
        self.push_where(connector, &term)
    }

    /// `field BETWEEN start AND end`, joined with `AND`.
    pub fn where_between(
        &mut self,
        field: impl Into<Ident>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> &mut Self {
        self.push_between(field.into(), start.into(), end.into(), Connector::And)
    }

    /// `field BETWEEN start AND end`, joined with `OR`.
    pub fn or_where_between(
        &mut self,
        field: impl Into<Ident>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> &mut Self {
        self.push_between(field.into(), start.into(), end.into(), Connector::Or)
    }

    fn push_null(&mut self, field: Ident, negated: bool, connector: Connector) -> &mut Self {
        let keyword = if negated { "IS NOT NULL" } else { "IS NULL" };
        let term = format!("{} {}", field.to_sql(self.dialect), keyword);
        self.push_where(connector, &term)
    }

    /// `field IS NULL`, joined with `AND`.
    pub fn where_null(&mut self, field: impl Into<Ident>) -> &mut Self {
        self.push_null(field.into(), false, Connector::And)
    }

    /// `field IS NOT NULL`, joined with `AND`.
    pub fn where_not_null(&mut self, field: impl Into<Ident>) -> &mut Self {
        self.push_null(field.into(), true, Connector::And)
    }

    /// `field IS NULL`, joined with `OR`.
    pub fn or_where_null(&mut self, field: impl Into<Ident>) -> &mut Self {
        self.push_null(field.into(), false, Connector::Or)
    }

    /// `field IS NOT NULL`, joined with `OR`.
    pub fn or_where_not_null(&mut self, field: impl Into<Ident>) -> &mut Self {
        self.push_null(field.into(), true, Connector::Or)
    }

    // ==================== GROUP BY / ORDER BY / JOIN ====================

    /// Add a GROUP BY column.
    pub fn group_by(&mut self, field: impl Into<Ident>) -> &mut Self {
        let field = self.quote(field);
        self.state.group_by.push(", ", &field);
        self
    }

    /// Add an ORDER BY column.
    pub fn order_by(&mut self, field: impl Into<Ident>, order: Order) -> &mut Self {
        let term = format!("{} {}", self.quote(field), order.as_str());
        self.state.order_by.push(", ", &term);
        self
    }

    /// ORDER BY column ASC.
    pub fn order_by_asc(&mut self, field: impl Into<Ident>) -> &mut Self {
        self.order_by(field, Order::Asc)
    }

    /// ORDER BY column DESC.
    pub fn order_by_desc(&mut self, field: impl Into<Ident>) -> &mut Self {
        self.order_by(field, Order::Desc)
    }

    /// Add `<kind> JOIN table ON left = right`. Joins accumulate in call order.
    pub fn join_with(
        &mut self,
        kind: JoinKind,
        table: impl Into<Ident>,
        left: impl Into<Ident>,
        right: impl Into<Ident>,
    ) -> &mut Self {
        let clause = format!(
            "{} JOIN {} ON {} = {}",
            kind.as_str(),
            self.quote(table),
            self.quote(left),
            self.quote(right)
        );
        self.state.joins.push(clause);
        self
    }

    /// Add INNER JOIN.
    pub fn join(
        &mut self,
        table: impl Into<Ident>,
        left: impl Into<Ident>,
        right: impl Into<Ident>,
    ) -> &mut Self {
        self.join_with(JoinKind::Inner, table, left, right)
    }

    /// Add LEFT JOIN.
    pub fn left_join(
        &mut self,
        table: impl Into<Ident>,
        left: impl Into<Ident>,
        right: impl Into<Ident>,
    ) -> &mut Self {
        self.join_with(JoinKind::Left, table, left, right)
    }

    /// Add RIGHT JOIN.
    pub fn right_join(
        &mut self,
        table: impl Into<Ident>,
        left: impl Into<Ident>,
        right: impl Into<Ident>,
    ) -> &mut Self {
        self.join_with(JoinKind::Right, table, left, right)
    }

    // ==================== Introspection ====================

    /// Current SQL text. Nothing is reset.
    pub fn to_sql(&self) -> String {
        self.state.build()
    }

    /// Current SQL text and a copy of the bindings. Nothing is reset.
    pub fn debug_dump(&self) -> DebugDump {
        DebugDump {
            sql: self.state.build(),
            bindings: self.binder.bindings().clone(),
            dialect: self.dialect,
        }
    }

    /// Take the finished statement, leaving the builder empty.
    ///
    /// The reset happens before validation so a rejected statement does not
    /// leak into the next one.
    fn take_statement(&mut self) -> QbResult<(String, Bindings)> {
        let state = std::mem::take(&mut self.state);
        let binder = std::mem::take(&mut self.binder);
        if state.table.is_empty() {
            return Err(QbError::validation(
                "no table selected; call table() or from_sub() first",
            ));
        }
        Ok((state.build(), binder.into_bindings()))
    }
}

impl<C: Executor> QueryBuilder<C> {
    // ==================== Terminals ====================

    async fn run_all(&mut self, kind: QueryKind) -> QbResult<Vec<Row>> {
        let (sql, bindings) = self.take_statement()?;
        log_statement(self.config.sql_log.as_ref(), kind, &sql, bindings.len());
        self.client.fetch_all(&sql, &bindings).await
    }

    async fn run_opt(&mut self, kind: QueryKind) -> QbResult<Option<Row>> {
        let (sql, bindings) = self.take_statement()?;
        log_statement(self.config.sql_log.as_ref(), kind, &sql, bindings.len());
        self.client.fetch_opt(&sql, &bindings).await
    }

    /// Run the statement and return all rows.
    pub async fn get(&mut self) -> QbResult<Vec<Row>> {
        self.run_all(QueryKind::Get).await
    }

    /// Run the statement and return the first row, if any.
    pub async fn row(&mut self) -> QbResult<Option<Row>> {
        self.run_opt(QueryKind::Row).await
    }

    /// Run the statement selecting only `field`, returning its values.
    pub async fn list(&mut self, field: impl Into<Ident>) -> QbResult<Vec<Value>> {
        let col = format!("{} AS {}", self.quote(field), LIST_ALIAS);
        self.state.columns = Columns::Expr(col);
        let rows = self.run_all(QueryKind::List).await?;
        rows.into_iter()
            .map(|row| {
                row.into_value(LIST_ALIAS)
                    .ok_or_else(|| QbError::decode(LIST_ALIAS, "column missing from result"))
            })
            .collect()
    }

    async fn aggregate(&mut self, func: &'static str, field: Ident) -> QbResult<Value> {
        let alias = format!("{}_num", func.to_ascii_lowercase());
        let expr = format!("{}({}) AS {}", func, field.to_sql(self.dialect), alias);
        self.state.columns = Columns::Expr(expr);
        let row = self
            .run_opt(QueryKind::Aggregate(func))
            .await?
            .ok_or_else(|| QbError::not_found(format!("{func} returned no row")))?;
        row.into_value(&alias)
            .ok_or_else(|| QbError::decode(alias, "column missing from result"))
    }

    /// `COUNT(*)`.
    pub async fn count(&mut self) -> QbResult<i64> {
        self.count_of("*").await
    }

    /// `COUNT(field)`.
    pub async fn count_of(&mut self, field: impl Into<Ident>) -> QbResult<i64> {
        let value = self.aggregate("COUNT", field.into()).await?;
        i64::from_value(&value).map_err(|message| QbError::decode("count_num", message))
    }

    /// `SUM(field)`; `Value::Null` over no rows.
    pub async fn sum(&mut self, field: impl Into<Ident>) -> QbResult<Value> {
        self.aggregate("SUM", field.into()).await
    }

    /// `MAX(field)`.
    pub async fn max(&mut self, field: impl Into<Ident>) -> QbResult<Value> {
        self.aggregate("MAX", field.into()).await
    }

    /// `MIN(field)`.
    pub async fn min(&mut self, field: impl Into<Ident>) -> QbResult<Value> {
        self.aggregate("MIN", field.into()).await
    }

    /// `AVG(field)`.
    pub async fn avg(&mut self, field: impl Into<Ident>) -> QbResult<Value> {
        self.aggregate("AVG", field.into()).await
    }

    // ==================== Raw passthrough ====================

    /// Run hand-written SQL, bypassing (and not touching) builder state.
    pub async fn raw_query(&self, sql: &str) -> QbResult<Vec<Row>> {
        log_statement(self.config.sql_log.as_ref(), QueryKind::RawQuery, sql, 0);
        let empty = Bindings::new();
        self.client.fetch_all(sql, &empty).await
    }

    /// Execute hand-written SQL and return the affected row count.
    pub async fn raw_exec(&self, sql: &str) -> QbResult<u64> {
        log_statement(self.config.sql_log.as_ref(), QueryKind::RawExec, sql, 0);
        let empty = Bindings::new();
        self.client.execute(sql, &empty).await
    }

    /// Prepare hand-written SQL on the engine.
    pub async fn prepare(&self, sql: &str) -> QbResult<C::Statement> {
        log_statement(self.config.sql_log.as_ref(), QueryKind::Prepare, sql, 0);
        self.client.prepare(sql).await
    }
}

/// Snapshot returned by [`QueryBuilder::debug_dump`].
#[derive(Debug, Clone, PartialEq)]
pub struct DebugDump {
    pub sql: String,
    pub bindings: Bindings,
    pub dialect: Dialect,
}

impl fmt::Display for DebugDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SQL: [{}] {}", self.sql.len(), self.sql)?;
        write!(f, "Params: {}", self.bindings.len())?;
        for (ph, value) in self.bindings.iter() {
            write!(f, "\n  {} = {}", self.dialect.placeholder(ph), value)?;
        }
        Ok(())
    }
}
