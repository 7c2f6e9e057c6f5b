use crate::sql::base::error::MappingError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use model::{
    core::{data_type::TypeCategory, value::Value},
    records::record::Record,
};
use std::{fmt, sync::Arc};

/// A value exactly as a driver decoded it, before type mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// Character data, also used for decimal and money values in text form.
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
}

impl RawValue {
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Int(_) => "integer",
            RawValue::UInt(_) => "unsigned integer",
            RawValue::Float(_) => "float",
            RawValue::Bool(_) => "boolean",
            RawValue::Text(_) => "text",
            RawValue::Bytes(_) => "byte string",
            RawValue::Date(_) => "date",
            RawValue::Time(_) => "time",
            RawValue::DateTime(_) => "datetime",
            RawValue::DateTimeTz(_) => "datetime with offset",
        }
    }

    /// Textual view of character-like data, if it has one.
    fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "NULL"),
            RawValue::Int(v) => write!(f, "{v}"),
            RawValue::UInt(v) => write!(f, "{v}"),
            RawValue::Float(v) => write!(f, "{v}"),
            RawValue::Bool(v) => write!(f, "{v}"),
            RawValue::Text(v) => write!(f, "{v}"),
            RawValue::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            RawValue::Date(v) => write!(f, "{v}"),
            RawValue::Time(v) => write!(f, "{v}"),
            RawValue::DateTime(v) => write!(f, "{v}"),
            RawValue::DateTimeTz(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

/// Name and driver-reported type of one result column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    pub type_name: String,
    pub category: TypeCategory,
}

impl ColumnMeta {
    pub fn new(name: &str, type_name: &str, category: TypeCategory) -> Self {
        ColumnMeta {
            name: name.to_string(),
            type_name: type_name.to_string(),
            category,
        }
    }
}

/// One result row in driver terms. Column metadata is shared by every row
/// of a result set.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub columns: Arc<Vec<ColumnMeta>>,
    pub values: Vec<RawValue>,
}

impl RawRow {
    pub fn new(columns: Arc<Vec<ColumnMeta>>, values: Vec<RawValue>) -> Self {
        RawRow { columns, values }
    }

    /// Maps every column to a normalized value, keeping column order.
    pub fn into_record(self) -> Result<Record, MappingError> {
        let mut record = Record::with_capacity(self.values.len());
        for (column, raw) in self.columns.iter().zip(self.values) {
            let value = map_value(column, raw)?;
            record.insert(column.name.clone(), value);
        }
        Ok(record)
    }
}

/// Converts a raw value into its normalized form according to the column's
/// type family.
///
/// SQL NULL is `Value::Null` in every family. Date/time values without an
/// offset are rendered as UTC; a bare time of day is placed on 0001-01-01.
/// Unknown families are rendered best-effort and never fail.
pub fn map_value(column: &ColumnMeta, raw: RawValue) -> Result<Value, MappingError> {
    if matches!(raw, RawValue::Null) {
        return Ok(Value::Null);
    }

    let shape_error = |raw: &RawValue| MappingError::DataShape {
        column: column.name.clone(),
        category: column.category.clone(),
        found: raw.kind(),
    };

    match &column.category {
        TypeCategory::Integer => match raw {
            RawValue::Int(v) => Ok(Value::Int(v)),
            RawValue::UInt(v) => i64::try_from(v)
                .map(Value::Int)
                .map_err(|_| shape_error(&raw)),
            other => Err(shape_error(&other)),
        },
        TypeCategory::Float => match raw {
            RawValue::Float(v) => Ok(Value::Float(v)),
            RawValue::Int(v) => Ok(Value::Float(v as f64)),
            RawValue::UInt(v) => Ok(Value::Float(v as f64)),
            ref other => match other.as_text().and_then(parse_decimal) {
                Some(v) => Ok(Value::Float(v)),
                None => Err(shape_error(other)),
            },
        },
        TypeCategory::Currency => match raw.as_text() {
            Some(text) => parse_decimal(text).map(Value::Float).ok_or_else(|| {
                MappingError::InvalidCurrency {
                    column: column.name.clone(),
                    text: text.to_string(),
                }
            }),
            None => Err(shape_error(&raw)),
        },
        TypeCategory::Boolean => match raw {
            RawValue::Bool(v) => Ok(Value::Boolean(v)),
            other => Err(shape_error(&other)),
        },
        TypeCategory::Text => match raw {
            RawValue::Text(v) => Ok(Value::String(v)),
            RawValue::Bytes(v) => String::from_utf8(v)
                .map(Value::String)
                .map_err(|err| shape_error(&RawValue::Bytes(err.into_bytes()))),
            other => Err(shape_error(&other)),
        },
        TypeCategory::DateTime => match raw {
            RawValue::DateTime(v) => Ok(Value::naive_timestamp(&v)),
            RawValue::DateTimeTz(v) => Ok(Value::timestamp(&v)),
            RawValue::Date(v) => Ok(Value::naive_timestamp(&v.and_time(NaiveTime::MIN))),
            RawValue::Time(v) => Ok(Value::naive_timestamp(&year_one().and_time(v))),
            other => Err(shape_error(&other)),
        },
        TypeCategory::Other(_) => Ok(best_effort(raw)),
    }
}

/// Base date for time-of-day columns.
fn year_one() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn best_effort(raw: RawValue) -> Value {
    match raw {
        RawValue::Null => Value::Null,
        RawValue::Int(v) => Value::Int(v),
        RawValue::Float(v) => Value::Float(v),
        RawValue::Bool(v) => Value::Boolean(v),
        RawValue::Text(v) => Value::String(v),
        RawValue::DateTime(v) => Value::naive_timestamp(&v),
        RawValue::DateTimeTz(v) => Value::timestamp(&v),
        other => Value::String(other.to_string()),
    }
}

/// Renders a fixed-point amount held as an integer count of `10^-scale`
/// units, e.g. `(12345, 2)` as `123.45`.
pub(crate) fn scaled_decimal_text(units: i64, scale: u32) -> String {
    let sign = if units < 0 { "-" } else { "" };
    let units = units.unsigned_abs();
    if scale == 0 {
        return format!("{sign}{units}");
    }
    let factor = 10_u64.pow(scale);
    format!(
        "{sign}{}.{:0width$}",
        units / factor,
        units % factor,
        width = scale as usize
    )
}

/// Parses plain decimal text: optional sign, digits, optional fraction.
fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (digits, ""),
    };

    let well_formed = !(int_part.is_empty() && frac_part.is_empty())
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit());

    if well_formed { text.parse().ok() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(category: TypeCategory) -> ColumnMeta {
        ColumnMeta::new("C", "T", category)
    }

    fn map(category: TypeCategory, raw: RawValue) -> Result<Value, MappingError> {
        map_value(&column(category), raw)
    }

    #[test]
    fn currency_text_becomes_float() {
        assert_eq!(
            map(TypeCategory::Currency, RawValue::Text("123.4500".into())),
            Ok(Value::Float(123.45))
        );
        assert_eq!(
            map(TypeCategory::Currency, RawValue::Bytes(b"-0.5".to_vec())),
            Ok(Value::Float(-0.5))
        );
    }

    #[test]
    fn scaled_amounts_render_exactly() {
        assert_eq!(scaled_decimal_text(1_234_500, 4), "123.4500");
        assert_eq!(scaled_decimal_text(-5, 2), "-0.05");
        assert_eq!(scaled_decimal_text(i64::MAX, 4), "922337203685477.5807");
        assert_eq!(scaled_decimal_text(i64::MIN, 4), "-922337203685477.5808");
        assert_eq!(scaled_decimal_text(42, 0), "42");
    }

    #[test]
    fn currency_rejects_non_decimal_text() {
        let err = map(TypeCategory::Currency, RawValue::Text("12,50".into())).unwrap_err();
        assert!(matches!(err, MappingError::InvalidCurrency { .. }));
        assert!(map(TypeCategory::Currency, RawValue::Text("NaN".into())).is_err());
        assert!(map(TypeCategory::Currency, RawValue::Float(1.0)).is_err());
    }

    #[test]
    fn null_is_null_in_every_family() {
        for category in [
            TypeCategory::Integer,
            TypeCategory::Currency,
            TypeCategory::DateTime,
            TypeCategory::Other("XML".into()),
        ] {
            assert_eq!(map(category, RawValue::Null), Ok(Value::Null));
        }
    }

    #[test]
    fn naive_datetime_is_rendered_as_utc() {
        let dt = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            map(TypeCategory::DateTime, RawValue::DateTime(dt)),
            Ok(Value::Timestamp("2024-07-01T10:00:00Z".into()))
        );
    }

    #[test]
    fn time_of_day_lands_on_year_one() {
        let time = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        assert_eq!(
            map(TypeCategory::DateTime, RawValue::Time(time)),
            Ok(Value::Timestamp("0001-01-01T08:30:00Z".into()))
        );
    }

    #[test]
    fn offset_is_preserved() {
        let dt = DateTime::parse_from_rfc3339("2024-07-01T10:00:00+03:00").unwrap();
        assert_eq!(
            map(TypeCategory::DateTime, RawValue::DateTimeTz(dt)),
            Ok(Value::Timestamp("2024-07-01T10:00:00+03:00".into()))
        );
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let err = map(TypeCategory::Integer, RawValue::Text("1".into())).unwrap_err();
        assert_eq!(
            err,
            MappingError::DataShape {
                column: "C".into(),
                category: TypeCategory::Integer,
                found: "text",
            }
        );
        assert!(map(TypeCategory::Integer, RawValue::UInt(u64::MAX)).is_err());
        assert!(map(TypeCategory::Text, RawValue::Bytes(vec![0xff, 0xfe])).is_err());
    }

    #[test]
    fn unknown_family_is_best_effort() {
        assert_eq!(
            map(TypeCategory::Other("UNIQUEIDENTIFIER".into()), RawValue::Bytes(b"abc".to_vec())),
            Ok(Value::String("abc".into()))
        );
        assert_eq!(
            map(TypeCategory::Other("JSON".into()), RawValue::UInt(7)),
            Ok(Value::String("7".into()))
        );
    }

    #[test]
    fn row_keeps_column_order() {
        let columns = Arc::new(vec![
            ColumnMeta::new("VisitId", "INT", TypeCategory::Integer),
            ColumnMeta::new("OrderSum", "MONEY", TypeCategory::Currency),
        ]);
        let row = RawRow::new(columns, vec![RawValue::Int(333), RawValue::Text("10.5000".into())]);
        let record = row.into_record().unwrap();

        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["VisitId", "OrderSum"]);
        assert_eq!(record.get("OrderSum"), Some(&Value::Float(10.5)));
    }

    #[test]
    fn mapped_row_serializes_to_plain_json() {
        let columns = Arc::new(vec![
            ColumnMeta::new("Comment", "NVARCHAR", TypeCategory::Text),
            ColumnMeta::new("OrderSum", "MONEY", TypeCategory::Currency),
        ]);
        let row = RawRow::new(columns, vec![RawValue::Null, RawValue::Text("123.45".into())]);

        let json = serde_json::to_value(row.into_record().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"Comment": null, "OrderSum": 123.45}));
    }
}
