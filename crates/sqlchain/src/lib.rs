//! # sqlchain
//!
//! A fluent, stateful SELECT builder with safe parameter binding.
//!
//! ## Features
//!
//! - **Chainable**: build one statement through `&mut self` calls, run it with a
//!   terminal (`get`, `row`, `list`, `count`, `sum`, `max`, `min`, `avg`)
//! - **Values are always bound**: user values become placeholders, never SQL text
//! - **Identifier quoting**: plain names, `table.field`, `expr AS alias` and
//!   function calls are classified and quoted for the target dialect
//! - **Subqueries**: bracket groups, `EXISTS`, `IN (SELECT ...)`, derived tables,
//!   nested to any depth on one builder with one shared binding map
//! - **Pluggable engines**: anything implementing [`Executor`] runs the SQL;
//!   tokio-postgres clients, transactions and pooled clients work out of the box
//! - **Statement logging**: every executed statement goes through `tracing`
//!
//! ## Example
//!
//! ```ignore
//! use sqlchain::{CompareOp, Condition, ConnectConfig, QueryBuilder};
//!
//! let client = ConnectConfig::new("localhost", "app", "app")
//!     .password("secret")
//!     .connect()
//!     .await?;
//!
//! let mut db = QueryBuilder::new(&client);
//! let rows = db
//!     .table("users")
//!     .where_(Condition::all_eq([("status", 1)]))
//!     .where_(("age", CompareOp::Gt, 18))
//!     .where_brackets(|q| {
//!         q.where_(("role", "admin")).or_where(("role", "owner"));
//!     })
//!     .get()
//!     .await?;
//!
//! let spent = db.table("orders").where_(("user_id", 7)).sum("total").await?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod monitor;
pub mod qb;
pub mod row;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::Executor;
pub use condition::{CompareOp, Condition, Connector};
pub use config::{BuilderConfig, ConnectConfig, SqlLogConfig};
pub use dialect::Dialect;
pub use error::{QbError, QbResult};
pub use ident::Ident;
pub use monitor::QueryKind;
pub use qb::{
    Bindings, Columns, DebugDump, Fragment, JoinKind, Order, ParamBinder, Placeholder,
    QueryBuilder, StructuralState, SubqueryCapture,
};
pub use row::{FromRow, Row};
pub use value::{FromValue, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_from, create_pool_with_config};

// Re-export for callers that want to name engine types without a direct dependency.
pub use tokio_postgres;
