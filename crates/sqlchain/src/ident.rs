//! Identifier classification and quoting.
//!
//! This module provides [`Ident`], a column/table reference that knows how to
//! quote itself for a [`Dialect`]. Strings are classified by [`Ident::parse`],
//! first match wins:
//!
//! 1. Alias: `<expr> AS <alias>` (case-insensitive `AS`)
//! 2. Qualified name: `<table>.<field>` (or `<table>.*`)
//! 3. Function call: `name(args)`, passed through verbatim
//! 4. Bare identifier: quoted as a whole
//!
//! Classification is purely syntactic. A malformed string that happens to look
//! like a function call is emitted unquoted; use the structured constructors
//! when the shape is known up front.
//!
//! # Example
//! ```ignore
//! use sqlchain::{Dialect, Ident};
//!
//! assert_eq!(Ident::parse("users.id AS uid").to_sql(Dialect::MySql), "`users`.`id` AS `uid`");
//! assert_eq!(Ident::parse("COUNT(*)").to_sql(Dialect::MySql), "COUNT(*)");
//! ```

use crate::dialect::Dialect;
use regex::Regex;
use std::sync::OnceLock;

/// A SQL identifier or identifier-bearing expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    /// A single name, quoted as a whole: `` `status` ``.
    Simple(String),
    /// `table.field`, each part quoted; a `*` field stays bare.
    Qualified { table: String, field: String },
    /// `inner AS alias`; the alias is always quoted.
    Aliased { inner: Box<Ident>, alias: String },
    /// Emitted verbatim (function calls, `*`, expressions).
    Raw(String),
}

fn alias_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^\s*(.+?)\s+AS\s+([A-Za-z0-9_]+)\s*$").expect("invalid built-in alias regex")
    })
}

fn qualified_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9_]+)\s*\.\s*([A-Za-z0-9_]+|\*)\s*$")
            .expect("invalid built-in qualified-name regex")
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*[A-Za-z0-9_]+\s*\([A-Za-z0-9_,.\s`'"*]*\)\s*$"#)
            .expect("invalid built-in function regex")
    })
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl Ident {
    /// A single quoted name.
    pub fn simple(name: impl Into<String>) -> Self {
        Ident::Simple(name.into())
    }

    /// A `table.field` reference.
    pub fn qualified(table: impl Into<String>, field: impl Into<String>) -> Self {
        Ident::Qualified {
            table: table.into(),
            field: field.into(),
        }
    }

    /// `inner AS alias`.
    pub fn aliased(inner: Ident, alias: impl Into<String>) -> Self {
        Ident::Aliased {
            inner: Box::new(inner),
            alias: alias.into(),
        }
    }

    /// A verbatim expression.
    ///
    /// # Safety
    /// Nothing is quoted or checked; never pass user input here.
    pub fn raw(expr: impl Into<String>) -> Self {
        Ident::Raw(expr.into())
    }

    /// Classify a caller-supplied string.
    pub fn parse(s: &str) -> Self {
        if let Some(caps) = alias_re().captures(s) {
            let inner = Self::parse_unaliased(&caps[1]);
            return Ident::aliased(inner, &caps[2]);
        }
        Self::parse_unaliased(s)
    }

    fn parse_unaliased(s: &str) -> Self {
        if let Some(caps) = qualified_re().captures(s) {
            return Ident::qualified(&caps[1], &caps[2]);
        }
        if function_re().is_match(s) {
            return Ident::raw(s.trim());
        }
        let name = s.trim();
        if name == "*" {
            return Ident::raw(name);
        }
        Ident::simple(name)
    }

    /// Alias classification keeps a non-word inner expression verbatim
    /// instead of quoting it as a single name.
    fn normalize_alias_inner(inner: &Ident) -> Option<&str> {
        match inner {
            Ident::Simple(name) if !is_word(name) => Some(name),
            _ => None,
        }
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        self.write_sql(dialect, &mut out);
        out
    }

    pub(crate) fn write_sql(&self, dialect: Dialect, out: &mut String) {
        match self {
            Ident::Simple(name) => dialect.write_quoted(name, out),
            Ident::Qualified { table, field } => {
                dialect.write_quoted(table, out);
                out.push('.');
                if field == "*" {
                    out.push('*');
                } else {
                    dialect.write_quoted(field, out);
                }
            }
            Ident::Aliased { inner, alias } => {
                match Self::normalize_alias_inner(inner) {
                    Some(expr) => out.push_str(expr),
                    None => inner.write_sql(dialect, out),
                }
                out.push_str(" AS ");
                dialect.write_quoted(alias, out);
            }
            Ident::Raw(expr) => out.push_str(expr),
        }
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Ident::parse(s)
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Self {
        Ident::parse(&s)
    }
}

impl From<&String> for Ident {
    fn from(s: &String) -> Self {
        Ident::parse(s)
    }
}
