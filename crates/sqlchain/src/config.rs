//! Builder and connection configuration.

use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use serde::Deserialize;
use std::fmt;
use tokio_postgres::NoTls;
use tracing::Level;

/// How statements are logged through `tracing`.
#[derive(Debug, Clone)]
pub struct SqlLogConfig {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogConfig {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl SqlLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}

/// Configuration for a [`QueryBuilder`](crate::QueryBuilder).
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Force a dialect. `None` uses the executor's native dialect.
    pub dialect: Option<Dialect>,
    /// Statement logging. `None` disables it.
    pub sql_log: Option<SqlLogConfig>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            dialect: None,
            sql_log: Some(SqlLogConfig::default()),
        }
    }
}

impl BuilderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a dialect regardless of the executor.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Set statement logging options.
    pub fn sql_log(mut self, log: SqlLogConfig) -> Self {
        self.sql_log = Some(log);
        self
    }

    /// Disable statement logging.
    pub fn no_sql_log(mut self) -> Self {
        self.sql_log = None;
        self
    }
}

fn default_port() -> u16 {
    5432
}

fn default_charset() -> String {
    "utf8".to_string()
}

/// Connection parameters for a single database.
///
/// Deserializable, so it can sit in an application's config file:
///
/// ```toml
/// [database]
/// host = "localhost"
/// user = "app"
/// password = "secret"
/// dbname = "app"
/// ```
#[derive(Clone, Deserialize)]
pub struct ConnectConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub dbname: String,
    /// Client encoding requested at connect time.
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("charset", &self.charset)
            .finish()
    }
}

impl ConnectConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, dbname: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            user: user.into(),
            password: String::new(),
            dbname: dbname.into(),
            charset: default_charset(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Convert into a `tokio_postgres::Config`.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.dbname)
            .options(&format!("-c client_encoding={}", self.charset));
        if !self.password.is_empty() {
            cfg.password(&self.password);
        }
        cfg
    }

    /// Open a single connection (no TLS) and drive it on the tokio runtime.
    pub async fn connect(&self) -> QbResult<tokio_postgres::Client> {
        let (client, connection) = self
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| QbError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "sqlchain", error = %e, "postgres connection closed with error");
            }
        });

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_config_defaults() {
        let cfg = BuilderConfig::new();
        assert!(cfg.dialect.is_none());
        let log = cfg.sql_log.expect("logging on by default");
        assert_eq!(log.level, Level::DEBUG);
        assert_eq!(log.max_sql_length, Some(200));
    }

    #[test]
    fn builder_config_setters() {
        let cfg = BuilderConfig::new().dialect(Dialect::Postgres).no_sql_log();
        assert_eq!(cfg.dialect, Some(Dialect::Postgres));
        assert!(cfg.sql_log.is_none());
    }

    #[test]
    fn connect_config_deserializes_with_defaults() {
        let cfg: ConnectConfig = serde_json::from_str(
            r#"{"host": "localhost", "user": "app", "password": "secret", "dbname": "test"}"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.charset, "utf8");

        let pg = cfg.to_pg_config();
        assert_eq!(pg.get_user(), Some("app"));
        assert_eq!(pg.get_dbname(), Some("test"));
        assert_eq!(pg.get_ports(), &[5432]);
        assert_eq!(pg.get_options(), Some("-c client_encoding=utf8"));
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = ConnectConfig::new("db", "app", "test").password("hunter2");
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }
}
