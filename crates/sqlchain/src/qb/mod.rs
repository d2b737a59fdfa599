//! The query builder (QB).
//!
//! [`QueryBuilder`] accumulates one SELECT statement at a time:
//!
//! - **Structure** lives in a [`StructuralState`]: table, columns, joins, and the
//!   WHERE / GROUP BY / HAVING / ORDER BY fragments. Clauses are assembled in a
//!   fixed order regardless of call order.
//! - **Values** never enter the SQL text. Each one is bound through the
//!   [`ParamBinder`] and referenced by a [`Placeholder`] unique to the statement.
//! - **Subqueries** (`where_brackets`, `where_exists`, `where_in_sub`,
//!   `from_sub`) build on the same builder inside a scope that stashes and
//!   restores the structure but shares the binder.
//!
//! # Usage
//!
//! ```ignore
//! use sqlchain::{CompareOp, QueryBuilder};
//!
//! let mut db = QueryBuilder::new(&client);
//!
//! let adults = db
//!     .table("users")
//!     .select(["id", "name"])
//!     .where_(("age", CompareOp::Gt, 18))
//!     .order_by_desc("id")
//!     .get()
//!     .await?;
//!
//! // The builder is empty again after a terminal call.
//! let paid = db
//!     .table("orders")
//!     .where_in("status", ["paid", "shipped"])
//!     .count()
//!     .await?;
//! ```

mod builder;
mod clause;
mod param;
mod scope;

pub use builder::{DebugDump, JoinKind, LIST_ALIAS, Order, QueryBuilder};
pub use clause::{Columns, Fragment, StructuralState};
pub use param::{Bindings, ParamBinder, Placeholder};
pub use scope::SubqueryCapture;
