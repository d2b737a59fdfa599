//! Result rows and row mapping.

use crate::error::{QbError, QbResult};
use crate::value::{FromValue, Value};
use serde::Serialize;
use serde::ser::SerializeMap;
use tokio_postgres::types::Type;

/// One result row: column names in select order, one [`Value`] each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column (builder style).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw value of `column`, if present.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Typed value of `column`.
    pub fn get<T: FromValue>(&self, column: &str) -> QbResult<T> {
        let value = self
            .value(column)
            .ok_or_else(|| QbError::decode(column, "no such column"))?;
        T::from_value(value).map_err(|message| QbError::decode(column, message))
    }

    /// Iterate `(column, value)` pairs in select order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub(crate) fn into_value(mut self, column: &str) -> Option<Value> {
        let i = self.columns.iter().position(|c| c == column)?;
        Some(self.values.swap_remove(i))
    }

    /// Decode a tokio-postgres row, column by column.
    pub fn from_pg(row: &tokio_postgres::Row) -> QbResult<Self> {
        let mut out = Row::new();
        for (idx, col) in row.columns().iter().enumerate() {
            let value = decode_pg(row, idx, col.type_())
                .map_err(|message| QbError::decode(col.name(), message))?;
            out.push(col.name(), value);
        }
        Ok(out)
    }
}

impl Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

fn decode_pg(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> Result<Value, String> {
    fn get<'a, T>(row: &'a tokio_postgres::Row, idx: usize) -> Result<Option<T>, String>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        row.try_get::<_, Option<T>>(idx).map_err(|e| e.to_string())
    }

    let value = if *ty == Type::BOOL {
        get::<bool>(row, idx)?.map(Value::Bool)
    } else if *ty == Type::INT2 {
        get::<i16>(row, idx)?.map(Value::from)
    } else if *ty == Type::INT4 {
        get::<i32>(row, idx)?.map(Value::from)
    } else if *ty == Type::INT8 {
        get::<i64>(row, idx)?.map(Value::Int)
    } else if *ty == Type::FLOAT4 {
        get::<f32>(row, idx)?.map(Value::from)
    } else if *ty == Type::FLOAT8 {
        get::<f64>(row, idx)?.map(Value::Float)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get::<serde_json::Value>(row, idx)?.map(Value::Json)
    } else if *ty == Type::UUID {
        get::<uuid::Uuid>(row, idx)?.map(Value::Uuid)
    } else if *ty == Type::DATE {
        get::<chrono::NaiveDate>(row, idx)?.map(Value::Date)
    } else if *ty == Type::TIMESTAMP {
        get::<chrono::NaiveDateTime>(row, idx)?.map(Value::Timestamp)
    } else if *ty == Type::TIMESTAMPTZ {
        get::<chrono::DateTime<chrono::Utc>>(row, idx)?.map(Value::TimestampTz)
    } else if *ty == Type::NUMERIC {
        decode_numeric(row, idx)?
    } else {
        // TEXT, VARCHAR, BPCHAR, NAME, citext and friends.
        get::<String>(row, idx)
            .map_err(|_| format!("unsupported column type {}", ty.name()))?
            .map(Value::Text)
    };
    Ok(value.unwrap_or(Value::Null))
}

// SUM/AVG over integers come back as NUMERIC; keep the exact digits as text.
#[cfg(feature = "rust_decimal")]
fn decode_numeric(row: &tokio_postgres::Row, idx: usize) -> Result<Option<Value>, String> {
    row.try_get::<_, Option<rust_decimal::Decimal>>(idx)
        .map(|d| d.map(|d| Value::Text(d.to_string())))
        .map_err(|e| e.to_string())
}

#[cfg(not(feature = "rust_decimal"))]
fn decode_numeric(_row: &tokio_postgres::Row, _idx: usize) -> Result<Option<Value>, String> {
    Err("NUMERIC columns need the `rust_decimal` feature".to_string())
}

/// Trait for converting a result row into a Rust struct.
///
/// # Example
///
/// ```ignore
/// use sqlchain::{FromRow, QbResult, Row};
///
/// struct User {
///     id: i64,
///     username: String,
///     email: Option<String>,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> QbResult<Self> {
///         Ok(Self {
///             id: row.get("id")?,
///             username: row.get("username")?,
///             email: row.get("email")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a result row into Self
    fn from_row(row: &Row) -> QbResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(row.clone())
    }
}
