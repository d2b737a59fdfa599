//! Condition types for WHERE/HAVING clauses.
//!
//! A [`Condition`] is one of three shapes:
//!
//! - [`Condition::MapEquals`]: several `field = value` pairs joined by the
//!   clause connector (`AND` for `where_`, `OR` for `or_where`)
//! - [`Condition::Equals`]: a single `field = value`
//! - [`Condition::Compare`]: `field <op> value` with a whitelisted operator
//!
//! Callers normally build them explicitly or from tuples:
//!
//! ```ignore
//! use sqlchain::{CompareOp, Condition};
//!
//! let a = Condition::all_eq([("status", 1), ("role", 2)]);
//! let b: Condition = ("status", 1).into();
//! let c: Condition = ("age", CompareOp::Gt, 18).into();
//! ```
//!
//! [`Condition::from_args`] keeps the positional 1/2/3-argument form for
//! dynamic input (e.g. filters decoded from a JSON request body).

use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::ident::Ident;
use crate::qb::ParamBinder;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison operators accepted in the three-argument form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `>=`
    Gte,
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<>`
    LtGt,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::LtGt => "<>",
        }
    }
}

impl FromStr for CompareOp {
    type Err = QbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(CompareOp::Lt),
            ">" => Ok(CompareOp::Gt),
            "<=" => Ok(CompareOp::Lte),
            ">=" => Ok(CompareOp::Gte),
            "=" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            "<>" => Ok(CompareOp::LtGt),
            other => Err(QbError::InvalidOperator(other.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connector between terms of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_str(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }

    /// Connector padded with spaces, as inserted between terms.
    pub(crate) fn separator(self) -> &'static str {
        match self {
            Connector::And => " AND ",
            Connector::Or => " OR ",
        }
    }
}

/// A WHERE/HAVING condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `f1 = v1 <connector> f2 = v2 ...`
    MapEquals(Vec<(Ident, Value)>),
    /// `field = value`
    Equals(Ident, Value),
    /// `field <op> value`
    Compare(Ident, CompareOp, Value),
}

impl Condition {
    /// Equality on every `(field, value)` pair, in iteration order.
    pub fn all_eq<I, F, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<Ident>,
        V: Into<Value>,
    {
        Condition::MapEquals(
            pairs
                .into_iter()
                .map(|(f, v)| (f.into(), v.into()))
                .collect(),
        )
    }

    /// `field = value`
    pub fn eq(field: impl Into<Ident>, value: impl Into<Value>) -> Self {
        Condition::Equals(field.into(), value.into())
    }

    /// `field <op> value`
    pub fn compare(field: impl Into<Ident>, op: CompareOp, value: impl Into<Value>) -> Self {
        Condition::Compare(field.into(), op, value.into())
    }

    /// `field <op> value` with the operator given as text.
    ///
    /// Fails with [`QbError::InvalidOperator`] outside `< > <= >= = != <>`.
    pub fn cmp(field: impl Into<Ident>, op: &str, value: impl Into<Value>) -> QbResult<Self> {
        Ok(Condition::Compare(field.into(), op.parse::<CompareOp>()?, value.into()))
    }

    /// Build a condition from positional arguments.
    ///
    /// - 1 argument: a JSON object of field → value
    /// - 2 arguments: `field, value`
    /// - 3 arguments: `field, operator, value`
    ///
    /// Any other count fails with [`QbError::ArgumentCount`].
    pub fn from_args(args: &[serde_json::Value]) -> QbResult<Self> {
        match args {
            [serde_json::Value::Object(map)] => Ok(Condition::MapEquals(
                map.iter()
                    .map(|(field, value)| (Ident::parse(field), Value::from_json(value.clone())))
                    .collect(),
            )),
            [other] => Err(QbError::ArgumentType(format!(
                "{other} should be a field-to-value mapping"
            ))),
            [field, value] => Ok(Condition::Equals(
                field_arg(field)?,
                Value::from_json(value.clone()),
            )),
            [field, op, value] => {
                let op = match op {
                    serde_json::Value::String(s) => s.parse::<CompareOp>()?,
                    other => return Err(QbError::InvalidOperator(other.to_string())),
                };
                Ok(Condition::Compare(
                    field_arg(field)?,
                    op,
                    Value::from_json(value.clone()),
                ))
            }
            _ => Err(QbError::ArgumentCount(args.len())),
        }
    }

    /// Whether rendering would produce no SQL (an empty mapping).
    pub fn is_empty(&self) -> bool {
        matches!(self, Condition::MapEquals(pairs) if pairs.is_empty())
    }

    /// Render into SQL, binding every value through `binder`.
    ///
    /// `connector` joins the entries of a mapping; the other shapes are a
    /// single term and ignore it.
    pub(crate) fn render(
        self,
        connector: Connector,
        dialect: Dialect,
        binder: &mut ParamBinder,
    ) -> String {
        let mut out = String::new();
        match self {
            Condition::MapEquals(pairs) => {
                for (i, (field, value)) in pairs.into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(connector.separator());
                    }
                    write_term(&mut out, &field, "=", value, dialect, binder);
                }
            }
            Condition::Equals(field, value) => {
                write_term(&mut out, &field, "=", value, dialect, binder);
            }
            Condition::Compare(field, op, value) => {
                write_term(&mut out, &field, op.as_str(), value, dialect, binder);
            }
        }
        out
    }
}

fn field_arg(arg: &serde_json::Value) -> QbResult<Ident> {
    match arg {
        serde_json::Value::String(s) => Ok(Ident::parse(s)),
        other => Err(QbError::ArgumentType(format!(
            "field name should be a string, got {other}"
        ))),
    }
}

fn write_term(
    out: &mut String,
    field: &Ident,
    op: &str,
    value: Value,
    dialect: Dialect,
    binder: &mut ParamBinder,
) {
    field.write_sql(dialect, out);
    out.push(' ');
    out.push_str(op);
    out.push(' ');
    out.push_str(&dialect.placeholder(binder.bind(value)));
}

impl<F: Into<Ident>, V: Into<Value>> From<(F, V)> for Condition {
    fn from((field, value): (F, V)) -> Self {
        Condition::eq(field, value)
    }
}

impl<F: Into<Ident>, V: Into<Value>> From<(F, CompareOp, V)> for Condition {
    fn from((field, op, value): (F, CompareOp, V)) -> Self {
        Condition::compare(field, op, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(cond: Condition, connector: Connector) -> (String, ParamBinder) {
        let mut binder = ParamBinder::new();
        let sql = cond.render(connector, Dialect::MySql, &mut binder);
        (sql, binder)
    }

    #[test]
    fn single_equality() {
        let (sql, binder) = render(Condition::eq("status", 1), Connector::And);
        assert_eq!(sql, "`status` = :p1");
        assert_eq!(binder.bindings().get_named("p1"), Some(&Value::Int(1)));
    }

    #[test]
    fn comparison() {
        let (sql, _) = render(("age", CompareOp::Gte, 18).into(), Connector::And);
        assert_eq!(sql, "`age` >= :p1");
    }

    #[test]
    fn mapping_joins_with_connector() {
        let cond = Condition::all_eq([("status", 1), ("role", 2)]);
        let (sql, binder) = render(cond.clone(), Connector::And);
        assert_eq!(sql, "`status` = :p1 AND `role` = :p2");
        assert_eq!(binder.len(), 2);

        let (sql, _) = render(cond, Connector::Or);
        assert_eq!(sql, "`status` = :p1 OR `role` = :p2");
    }

    #[test]
    fn operator_whitelist() {
        for op in ["<", ">", "<=", ">=", "=", "!=", "<>"] {
            assert_eq!(op.parse::<CompareOp>().unwrap().as_str(), op);
        }
        let err = Condition::cmp("name", "LIKE", "a%").unwrap_err();
        assert!(matches!(err, QbError::InvalidOperator(op) if op == "LIKE"));
    }

    #[test]
    fn from_args_dispatches_on_count() {
        let map = Condition::from_args(&[json!({"status": 1, "age": 30})]).unwrap();
        assert!(matches!(map, Condition::MapEquals(ref p) if p.len() == 2));

        let eq = Condition::from_args(&[json!("status"), json!(1)]).unwrap();
        assert_eq!(eq, Condition::eq("status", 1));

        let cmp = Condition::from_args(&[json!("age"), json!(">"), json!(18)]).unwrap();
        assert_eq!(cmp, Condition::compare("age", CompareOp::Gt, 18));
    }

    #[test]
    fn from_args_keeps_mapping_order() {
        let cond = Condition::from_args(&[json!({"zeta": 1, "alpha": 2})]).unwrap();
        let (sql, _) = render(cond, Connector::And);
        assert_eq!(sql, "`zeta` = :p1 AND `alpha` = :p2");
    }

    #[test]
    fn from_args_single_non_mapping_is_type_error() {
        let err = Condition::from_args(&[json!("status")]).unwrap_err();
        assert!(matches!(err, QbError::ArgumentType(_)));
    }

    #[test]
    fn from_args_bad_operator() {
        let err = Condition::from_args(&[json!("name"), json!("LIKE"), json!("a%")]).unwrap_err();
        assert!(matches!(err, QbError::InvalidOperator(_)));
    }

    #[test]
    fn from_args_bad_count() {
        assert!(matches!(
            Condition::from_args(&[]).unwrap_err(),
            QbError::ArgumentCount(0)
        ));
        let four = [json!("a"), json!("="), json!(1), json!(2)];
        assert!(matches!(
            Condition::from_args(&four).unwrap_err(),
            QbError::ArgumentCount(4)
        ));
    }

    #[test]
    fn from_args_non_string_field() {
        let err = Condition::from_args(&[json!(1), json!(2)]).unwrap_err();
        assert!(matches!(err, QbError::ArgumentType(_)));
    }

    #[test]
    fn empty_mapping_is_empty() {
        assert!(Condition::all_eq(Vec::<(&str, i32)>::new()).is_empty());
        assert!(!Condition::eq("a", 1).is_empty());
    }
}
