//! SQL dialects: identifier quoting and placeholder rendering.

use crate::qb::Placeholder;
use serde::{Deserialize, Serialize};

/// Quoting and placeholder convention of the target engine.
///
/// - `MySql`: `` `ident` `` and named placeholders (`:p1`, `:p2`, ...)
/// - `Postgres`: `"ident"` and positional placeholders (`$1`, `$2`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    Postgres,
}

impl Dialect {
    /// The identifier quote character.
    pub fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Postgres => '"',
        }
    }

    /// Wrap `name` in quote characters, doubling any embedded quote character.
    pub fn quote_ident(self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        self.write_quoted(name, &mut out);
        out
    }

    pub(crate) fn write_quoted(self, name: &str, out: &mut String) {
        let q = self.quote_char();
        out.push(q);
        for ch in name.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
    }

    /// Render a placeholder token as it appears in SQL text.
    pub fn placeholder(self, ph: Placeholder) -> String {
        match self {
            Dialect::MySql => format!(":{}", ph.name()),
            Dialect::Postgres => format!("${}", ph.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_quotes_with_backticks() {
        assert_eq!(Dialect::MySql.quote_ident("status"), "`status`");
        assert_eq!(Dialect::MySql.quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn postgres_quotes_with_double_quotes() {
        assert_eq!(Dialect::Postgres.quote_ident("status"), r#""status""#);
        assert_eq!(Dialect::Postgres.quote_ident(r#"a"b"#), r#""a""b""#);
    }

    #[test]
    fn placeholder_styles() {
        let ph = Placeholder::new(3);
        assert_eq!(Dialect::MySql.placeholder(ph), ":p3");
        assert_eq!(Dialect::Postgres.placeholder(ph), "$3");
    }

    #[test]
    fn dialect_deserializes_lowercase() {
        let d: Dialect = serde_json::from_str(r#""postgres""#).unwrap();
        assert_eq!(d, Dialect::Postgres);
        let d: Dialect = serde_json::from_str(r#""mysql""#).unwrap();
        assert_eq!(d, Dialect::MySql);
    }
}
