//! Bound parameter values.
//!
//! [`Value`] is what the builder stores for every placeholder. It converts from
//! the usual Rust scalars, encodes itself for `tokio-postgres`, and can be read
//! back out of a [`Row`](crate::Row) through [`FromValue`].

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type};

type BoxError = Box<dyn StdError + Sync + Send>;

/// A value bound to a placeholder, or read from a result column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    Uuid(uuid::Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl Value {
    /// Convert a JSON value, mapping scalars onto their native variants.
    ///
    /// Arrays and objects stay as [`Value::Json`].
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        i64::from_value(self).ok()
    }

    pub fn as_f64(&self) -> Option<f64> {
        f64::from_value(self).ok()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Json(j) => write!(f, "'{j}'"),
            Value::Uuid(u) => write!(f, "'{u}'"),
            Value::Date(d) => write!(f, "'{d}'"),
            Value::Timestamp(t) => write!(f, "'{t}'"),
            Value::TimestampTz(t) => write!(f, "'{}'", t.to_rfc3339()),
        }
    }
}

// ==================== Conversions into Value ====================

macro_rules! int_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

int_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::from_json(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ==================== Conversions out of Value ====================

/// Typed extraction from a [`Value`].
pub trait FromValue: Sized {
    /// Convert, or describe why the value does not fit.
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, found {}", value.type_name())
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(i64::from(*b)),
            // MySQL-style engines hand back aggregates as decimal strings.
            Value::Text(s) => s.trim().parse().map_err(|_| mismatch("int", value)),
            _ => Err(mismatch("int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|e| e.to_string())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            Value::Text(s) => s.trim().parse().map_err(|_| mismatch("float", value)),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Null => Err(mismatch("text", value)),
            Value::Json(j) => Ok(j.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(x) => Ok(x.to_string()),
            Value::Uuid(u) => Ok(u.to_string()),
            Value::Date(d) => Ok(d.to_string()),
            Value::Timestamp(t) => Ok(t.to_string()),
            Value::TimestampTz(t) => Ok(t.to_rfc3339()),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            other => serde_json::to_value(other).map_err(|e| e.to_string()),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::Text(s) => s.parse().map_err(|e: uuid::Error| e.to_string()),
            _ => Err(mismatch("uuid", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ==================== tokio-postgres encoding ====================

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        self.to_sql_checked(ty, out)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    // Integers are stored as i64, but postgres declares each parameter's exact
    // type; narrow, widen, or convert to whatever the server asked for.
    fn to_sql_checked(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql_checked(ty, out),
            Value::Int(i) => encode_int(*i, ty, out),
            Value::Float(x) => {
                if *ty == Type::FLOAT4 {
                    (*x as f32).to_sql_checked(ty, out)
                } else if *ty == Type::NUMERIC {
                    encode_numeric(self, ty, out)
                } else {
                    x.to_sql_checked(ty, out)
                }
            }
            Value::Text(s) => {
                if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 {
                    encode_int(s.trim().parse::<i64>()?, ty, out)
                } else if *ty == Type::NUMERIC {
                    encode_numeric(self, ty, out)
                } else {
                    s.to_sql_checked(ty, out)
                }
            }
            Value::Json(j) => j.to_sql_checked(ty, out),
            Value::Uuid(u) => u.to_sql_checked(ty, out),
            Value::Date(d) => d.to_sql_checked(ty, out),
            Value::Timestamp(t) => t.to_sql_checked(ty, out),
            Value::TimestampTz(t) => t.to_sql_checked(ty, out),
        }
    }
}

fn encode_int(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(i)?.to_sql_checked(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(i)?.to_sql_checked(ty, out)
    } else if *ty == Type::FLOAT8 {
        (i as f64).to_sql_checked(ty, out)
    } else if *ty == Type::FLOAT4 {
        (i as f32).to_sql_checked(ty, out)
    } else if *ty == Type::NUMERIC {
        encode_numeric(&Value::Int(i), ty, out)
    } else {
        i.to_sql_checked(ty, out)
    }
}

#[cfg(feature = "rust_decimal")]
fn encode_numeric(value: &Value, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    use rust_decimal::Decimal;

    let decimal = match value {
        Value::Int(i) => Decimal::from(*i),
        Value::Float(x) => Decimal::try_from(*x)?,
        Value::Text(s) => s.trim().parse::<Decimal>()?,
        other => return Err(format!("cannot encode {} as numeric", other.type_name()).into()),
    };
    decimal.to_sql_checked(ty, out)
}

#[cfg(not(feature = "rust_decimal"))]
fn encode_numeric(_value: &Value, _ty: &Type, _out: &mut BytesMut) -> Result<IsNull, BoxError> {
    Err("binding to NUMERIC needs the `rust_decimal` feature".into())
}
