//! Clause fragments and fixed-order SELECT assembly.

/// One clause's accumulated text.
///
/// Empty means the clause keyword has not been emitted yet. The first
/// [`Fragment::push`] starts the clause; later pushes prepend the separator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    text: String,
}

impl Fragment {
    pub fn is_started(&self) -> bool {
        !self.text.is_empty()
    }

    /// Clause body without the keyword.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub(crate) fn push(&mut self, separator: &str, term: &str) {
        if self.is_started() {
            self.text.push_str(separator);
        }
        self.text.push_str(term);
    }

    fn write(&self, keyword: &str, out: &mut String) {
        if self.is_started() {
            out.push(' ');
            out.push_str(keyword);
            out.push(' ');
            out.push_str(&self.text);
        }
    }
}

/// Column selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Columns {
    /// `*`
    #[default]
    All,
    /// Already-quoted column list.
    List(Vec<String>),
    /// A single override expression (aggregates, `list()`).
    Expr(String),
}

impl Columns {
    fn write(&self, out: &mut String) {
        match self {
            Columns::All => out.push('*'),
            Columns::List(cols) => out.push_str(&cols.join(", ")),
            Columns::Expr(expr) => out.push_str(expr),
        }
    }
}

/// Everything a statement accumulates except its bindings.
///
/// Subquery scopes swap this whole value out and back in, so the enclosing
/// statement's fragments are restored exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructuralState {
    pub(crate) table: String,
    pub(crate) columns: Columns,
    pub(crate) joins: Vec<String>,
    pub(crate) where_clause: Fragment,
    pub(crate) group_by: Fragment,
    pub(crate) having: Fragment,
    pub(crate) order_by: Fragment,
}

impl StructuralState {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    pub fn where_clause(&self) -> &Fragment {
        &self.where_clause
    }

    pub fn group_by(&self) -> &Fragment {
        &self.group_by
    }

    pub fn having(&self) -> &Fragment {
        &self.having
    }

    pub fn order_by(&self) -> &Fragment {
        &self.order_by
    }

    /// `SELECT <columns> FROM <table><joins> WHERE .. GROUP BY .. HAVING .. ORDER BY ..`
    pub fn build(&self) -> String {
        let mut sql = String::with_capacity(64);
        sql.push_str("SELECT ");
        self.columns.write(&mut sql);
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        self.where_clause.write("WHERE", &mut sql);
        self.group_by.write("GROUP BY", &mut sql);
        self.having.write("HAVING", &mut sql);
        self.order_by.write("ORDER BY", &mut sql);
        sql
    }
}
