//! Statement logging via `tracing`.
//!
//! Every terminal or raw call emits one event on target `sqlchain.sql` before
//! the statement reaches the engine. Subquery scopes log at TRACE on
//! `sqlchain.scope`.

use crate::config::SqlLogConfig;
use tracing::Level;

/// The kind of call that produced a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// `get()`
    Get,
    /// `row()`
    Row,
    /// `list(field)`
    List,
    /// `count`/`sum`/`max`/`min`/`avg`
    Aggregate(&'static str),
    /// `raw_query(sql)`
    RawQuery,
    /// `raw_exec(sql)`
    RawExec,
    /// `prepare(sql)`
    Prepare,
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

pub(crate) fn log_statement(
    config: Option<&SqlLogConfig>,
    kind: QueryKind,
    sql: &str,
    param_count: usize,
) {
    let Some(config) = config else {
        return;
    };

    /// Dispatch a tracing event at a runtime-determined level.
    macro_rules! emit_at_level {
        ($level:expr, $($field:tt)*) => {
            match $level {
                Level::ERROR => tracing::error!($($field)*),
                Level::WARN  => tracing::warn!($($field)*),
                Level::INFO  => tracing::info!($($field)*),
                Level::DEBUG => tracing::debug!($($field)*),
                Level::TRACE => tracing::trace!($($field)*),
            }
        };
    }

    let shown = match config.max_sql_length {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    };

    emit_at_level!(
        config.level,
        target: "sqlchain.sql",
        kind = ?kind,
        param_count,
        sql = %shown,
    );
}
