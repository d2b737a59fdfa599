//! Placeholder allocation and the statement-wide binding map.

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use tokio_postgres::types::ToSql;

/// A placeholder token, unique within one top-level statement.
///
/// Token `pN` is the N-th value bound in the statement, so it doubles as the
/// 1-based position for positional (`$N`) engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placeholder(usize);

impl Placeholder {
    pub(crate) fn new(index: usize) -> Self {
        Placeholder(index)
    }

    /// 1-based position among the statement's bindings.
    pub fn index(self) -> usize {
        self.0
    }

    /// Token name without the `:` sigil, e.g. `p1`.
    pub fn name(self) -> String {
        format!("p{}", self.0)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Placeholder → value map for one statement, in bind order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    values: Vec<Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value bound to `ph`, if any.
    pub fn get(&self, ph: Placeholder) -> Option<&Value> {
        ph.0.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// Look up by token text; accepts `p1` and `:p1`.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        let index = name
            .trim_start_matches(':')
            .strip_prefix('p')?
            .parse::<usize>()
            .ok()?;
        self.get(Placeholder(index))
    }

    /// Iterate `(placeholder, value)` pairs in bind order.
    pub fn iter(&self) -> impl Iterator<Item = (Placeholder, &Value)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (Placeholder(i + 1), v))
    }

    /// Name-keyed copy for named-parameter engines.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.iter().map(|(ph, v)| (ph.name(), v.clone())).collect()
    }

    /// Positional parameter list for tokio-postgres.
    pub fn as_pg_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }

    fn push(&mut self, value: Value) -> Placeholder {
        self.values.push(value);
        Placeholder(self.values.len())
    }
}

/// Owns the binding map for the statement in flight.
///
/// The binder is never stashed by subquery scopes: nested statements keep
/// allocating from the same counter, so tokens stay unique at every depth.
#[derive(Clone, Debug, Default)]
pub struct ParamBinder {
    bindings: Bindings,
    derived_tables: usize,
}

impl ParamBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next placeholder and bind `value` to it.
    pub fn bind(&mut self, value: impl Into<Value>) -> Placeholder {
        self.bindings.push(value.into())
    }

    /// Next derived-table alias for this statement: `tb_1`, `tb_2`, ...
    pub fn next_derived_alias(&mut self) -> String {
        self.derived_tables += 1;
        format!("tb_{}", self.derived_tables)
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn into_bindings(self) -> Bindings {
        self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
