//! Subquery scopes.
//!
//! A nested statement is built on the same builder: the enclosing statement's
//! structural state is stashed, the callback builds into a fresh one, and the
//! stash is put back. The [`ParamBinder`](crate::qb::ParamBinder) is never
//! stashed, so values bound inside the callback land in the enclosing
//! statement's bindings with unique tokens.

use crate::condition::Connector;
use crate::ident::Ident;
use crate::qb::builder::QueryBuilder;
use crate::qb::clause::StructuralState;

/// A nested statement captured by [`QueryBuilder::subquery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubqueryCapture {
    state: StructuralState,
    sql: String,
}

impl SubqueryCapture {
    /// Structural state the callback produced.
    pub fn state(&self) -> &StructuralState {
        &self.state
    }

    /// The nested statement's SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl<C> QueryBuilder<C> {
    /// Run `build` against a fresh statement and return what it produced.
    ///
    /// The enclosing statement's structure is restored afterwards; bindings
    /// made inside `build` stay bound. Scopes nest to any depth.
    pub fn subquery<F>(&mut self, build: F) -> SubqueryCapture
    where
        F: FnOnce(&mut Self),
    {
        let outer = std::mem::take(&mut self.state);
        self.depth += 1;
        tracing::trace!(target: "sqlchain.scope", depth = self.depth, "enter subquery");

        build(self);

        let nested = std::mem::replace(&mut self.state, outer);
        tracing::trace!(
            target: "sqlchain.scope",
            depth = self.depth,
            bindings = self.binder.len(),
            "leave subquery"
        );
        self.depth -= 1;

        let sql = nested.build();
        SubqueryCapture { state: nested, sql }
    }

    fn push_brackets<F>(&mut self, connector: Connector, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let capture = self.subquery(build);
        let inner = capture.state.where_clause;
        if !inner.is_started() {
            tracing::warn!(target: "sqlchain.scope", "empty bracket group ignored");
            return self;
        }
        let term = format!("({})", inner.as_str());
        self.push_where(connector, &term)
    }

    /// `AND ( <conditions built by the callback> )`
    ///
    /// Only the callback's WHERE conditions are used.
    ///
    /// ```ignore
    /// db.table("users")
    ///     .where_(("status", 1))
    ///     .where_brackets(|q| {
    ///         q.where_(("role", "admin")).or_where(("role", "owner"));
    ///     });
    /// // ... WHERE `status` = :p1 AND (`role` = :p2 OR `role` = :p3)
    /// ```
    pub fn where_brackets<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_brackets(Connector::And, build)
    }

    /// `OR ( <conditions built by the callback> )`
    pub fn or_where_brackets<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_brackets(Connector::Or, build)
    }

    fn push_exists<F>(&mut self, negated: bool, connector: Connector, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let capture = self.subquery(build);
        let keyword = if negated { "NOT EXISTS" } else { "EXISTS" };
        let term = format!("{} ({})", keyword, capture.sql);
        self.push_where(connector, &term)
    }

    /// `AND EXISTS (<subquery>)`
    pub fn where_exists<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_exists(false, Connector::And, build)
    }

    /// `AND NOT EXISTS (<subquery>)`
    pub fn where_not_exists<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_exists(true, Connector::And, build)
    }

    /// `OR EXISTS (<subquery>)`
    pub fn or_where_exists<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_exists(false, Connector::Or, build)
    }

    /// `OR NOT EXISTS (<subquery>)`
    pub fn or_where_not_exists<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_exists(true, Connector::Or, build)
    }

    fn push_in_sub<F>(
        &mut self,
        field: Ident,
        negated: bool,
        connector: Connector,
        build: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let field = field.to_sql(self.dialect());
        let capture = self.subquery(build);
        let keyword = if negated { "NOT IN" } else { "IN" };
        let term = format!("{} {} ({})", field, keyword, capture.sql);
        self.push_where(connector, &term)
    }

    /// `AND field IN (<subquery>)`
    ///
    /// ```ignore
    /// db.table("users").where_in_sub("id", |q| {
    ///     q.table("orders").select(["user_id"]).where_(("status", "paid"));
    /// });
    /// // SELECT * FROM `users` WHERE `id` IN (SELECT `user_id` FROM `orders` WHERE `status` = :p1)
    /// ```
    pub fn where_in_sub<F>(&mut self, field: impl Into<Ident>, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_in_sub(field.into(), false, Connector::And, build)
    }

    /// `AND field NOT IN (<subquery>)`
    pub fn where_not_in_sub<F>(&mut self, field: impl Into<Ident>, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_in_sub(field.into(), true, Connector::And, build)
    }

    /// `OR field IN (<subquery>)`
    pub fn or_where_in_sub<F>(&mut self, field: impl Into<Ident>, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_in_sub(field.into(), false, Connector::Or, build)
    }

    /// `OR field NOT IN (<subquery>)`
    pub fn or_where_not_in_sub<F>(&mut self, field: impl Into<Ident>, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.push_in_sub(field.into(), true, Connector::Or, build)
    }

    /// Select from a derived table: `FROM (<subquery>) AS tb_N`.
    ///
    /// If a table is already set, the derived table is appended after a comma,
    /// so the FROM clause is a cross join of the two:
    /// ``FROM `users`, (<subquery>) AS tb_1``. Link them with a WHERE condition.
    pub fn from_sub<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let capture = self.subquery(build);
        let alias = self.binder.next_derived_alias();
        let derived = format!("({}) AS {}", capture.sql, alias);
        if self.state.table.is_empty() {
            self.state.table = derived;
        } else {
            self.state.table.push_str(", ");
            self.state.table.push_str(&derived);
        }
        self
    }
}
