use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as Json;

/// A reference instant as authored in a date or time rule.
///
/// A bare time of day is anchored to the date of the instant it is compared
/// against; a bare date means midnight of that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    TimeOfDay(NaiveTime),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Temporal {
    /// Pin this literal to a concrete instant, using `now` for the missing
    /// calendar date of a time-of-day literal.
    #[must_use]
    pub fn resolve(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Temporal::TimeOfDay(time) => now.date().and_time(time),
            Temporal::Date(date) => date.and_time(NaiveTime::MIN),
            Temporal::DateTime(at) => at,
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::TimeOfDay(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Temporal::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Temporal::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// A typed rule parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A decimal number.
    Number(f64),
    /// Free text, including numbers and instants still in their authored form.
    Text(String),
    /// A list of identifiers (product ids, term ids, country codes, ...).
    List(Vec<String>),
    /// A parsed date, time or date-time.
    DateTime(Temporal),
    /// A boolean flag.
    Bool(bool),
}

impl Value {
    /// Numeric reading of this value. Text is read up to its first
    /// non-numeric character; anything without a numeric prefix is `0.0`.
    #[must_use]
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => crate::parse::parse_number(s).unwrap_or_else(|| {
                if !s.trim().is_empty() {
                    tracing::debug!(text = %s, "non-numeric threshold read as 0");
                }
                0.0
            }),
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::List(_) | Value::DateTime(_) => 0.0,
        }
    }

    /// The identifiers of a list value. Scalars are not promoted to lists.
    #[must_use]
    pub fn as_list(&self) -> &[String] {
        match self {
            Value::List(items) => items,
            _ => &[],
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Temporal reading of this value. Text is parsed with
    /// [`parse_temporal`](crate::parse::parse_temporal).
    #[must_use]
    pub fn as_temporal(&self) -> Option<Temporal> {
        match self {
            Value::DateTime(t) => Some(*t),
            Value::Text(s) => match crate::parse::parse_temporal(s) {
                Ok(t) => Some(t),
                Err(err) => {
                    tracing::debug!(text = %s, error = %err, "unparseable temporal literal");
                    None
                }
            },
            _ => None,
        }
    }

    /// Convert a stored JSON field. Returns `None` for shapes the rule
    /// parameter model has no variant for (objects, nulls, nested arrays).
    #[must_use]
    pub fn from_json(json: &Json) -> Option<Value> {
        match json {
            Json::Bool(b) => Some(Value::Bool(*b)),
            Json::Number(n) => n.as_f64().map(Value::Number),
            Json::String(s) => Some(Value::Text(s.clone())),
            Json::Array(items) => items
                .iter()
                .map(|item| match item {
                    Json::String(s) => Some(s.clone()),
                    Json::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            Json::Null | Json::Object(_) => None,
        }
    }

    /// The stored JSON form of this value.
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Value::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Value::Text(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().cloned().map(Json::String).collect()),
            Value::DateTime(t) => Json::String(t.to_string()),
            Value::Bool(b) => Json::Bool(*b),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Temporal> for Value {
    fn from(v: Temporal) -> Self {
        Value::DateTime(v)
    }
}

impl<T: ToString> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.iter().map(ToString::to_string).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "\"{v}\""),
            Value::List(v) => write!(f, "[{}]", v.join(", ")),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}
