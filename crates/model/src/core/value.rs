use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// A normalized column value.
///
/// Every variant has a total JSON rendering: timestamps are carried as their
/// RFC 3339 text, so serializing a record can never fail on a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Timestamp(String),
}

impl Value {
    /// Renders an instant with an explicit offset (`Z` for UTC).
    pub fn timestamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> Value {
        let fixed: DateTime<FixedOffset> = instant.fixed_offset();
        Value::Timestamp(fixed.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// Wall-clock values without a zone are rendered as UTC.
    pub fn naive_timestamp(instant: &NaiveDateTime) -> Value {
        Value::timestamp(&Utc.from_utc_datetime(instant))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) | Value::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Boolean(v) => serializer.serialize_bool(*v),
            Value::String(v) | Value::Timestamp(v) => serializer.serialize_str(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::String(v) | Value::Timestamp(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn null_serializes_as_json_null() {
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
    }

    #[test]
    fn utc_timestamp_uses_z_suffix() {
        let dt = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(10, 30, 5)
            .unwrap();
        assert_eq!(
            Value::naive_timestamp(&dt),
            Value::Timestamp("2024-07-01T10:30:05Z".to_string())
        );
    }

    #[test]
    fn offset_timestamp_keeps_offset() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
        assert_eq!(
            serde_json::to_string(&Value::timestamp(&dt)).unwrap(),
            "\"2024-07-01T10:00:00+03:00\""
        );
    }
}
