use crate::sql::base::row::RawValue;
use chrono::{NaiveDate, NaiveTime};
use model::core::data_type::TypeCategory;
use mysql_async::{Column, Value as MySqlValue, consts::ColumnType};

/// Collation id of the `binary` character set.
const BINARY_CHARSET: u16 = 63;

/// Protocol type name without the `MYSQL_TYPE_` prefix, e.g. `LONGLONG`.
/// Blob and string columns with the binary charset are reported as `BINARY`.
pub(crate) fn type_name(column: &Column) -> String {
    let ty = column.column_type();
    let is_stringish = matches!(
        ty,
        ColumnType::MYSQL_TYPE_STRING
            | ColumnType::MYSQL_TYPE_VAR_STRING
            | ColumnType::MYSQL_TYPE_VARCHAR
            | ColumnType::MYSQL_TYPE_BLOB
            | ColumnType::MYSQL_TYPE_TINY_BLOB
            | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
            | ColumnType::MYSQL_TYPE_LONG_BLOB
    );
    if is_stringish && column.character_set() == BINARY_CHARSET {
        return "BINARY".to_string();
    }

    let name = format!("{ty:?}");
    name.trim_start_matches("MYSQL_TYPE_").to_string()
}

pub(crate) fn category(type_name: &str) -> TypeCategory {
    TypeCategory::from_mysql_type(type_name)
}

/// Converts a binary-protocol value. Zero dates (`0000-00-00`) have no
/// calendar equivalent and come back as null. So do `TIME` values that are
/// not a time of day (negative, or 24 hours and longer), since a time column
/// is mapped onto year one and a duration has no place there.
pub(crate) fn decode_value(value: MySqlValue, category: &TypeCategory) -> RawValue {
    match value {
        MySqlValue::NULL => RawValue::Null,
        MySqlValue::Bytes(bytes) => match category {
            TypeCategory::Boolean => RawValue::Bool(bytes.iter().any(|b| *b != 0)),
            _ => RawValue::Bytes(bytes),
        },
        MySqlValue::Int(v) => RawValue::Int(v),
        MySqlValue::UInt(v) => RawValue::UInt(v),
        MySqlValue::Float(v) => RawValue::Float(v.into()),
        MySqlValue::Double(v) => RawValue::Float(v),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(year.into(), month.into(), day.into())
                .and_then(|date| {
                    date.and_hms_micro_opt(hour.into(), minute.into(), second.into(), micros)
                })
                .map(RawValue::DateTime)
                .unwrap_or(RawValue::Null)
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let time_of_day = !negative && days == 0;
            time_of_day
                .then(|| {
                    NaiveTime::from_hms_micro_opt(
                        hours.into(),
                        minutes.into(),
                        seconds.into(),
                        micros,
                    )
                })
                .flatten()
                .map(RawValue::Time)
                .unwrap_or(RawValue::Null)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::base::row::{ColumnMeta, map_value};
    use model::core::value::Value;

    #[test]
    fn bit_bytes_become_boolean() {
        assert_eq!(
            decode_value(MySqlValue::Bytes(vec![1]), &TypeCategory::Boolean),
            RawValue::Bool(true)
        );
        assert_eq!(
            decode_value(MySqlValue::Bytes(vec![0]), &TypeCategory::Boolean),
            RawValue::Bool(false)
        );
    }

    #[test]
    fn decimal_stays_as_bytes() {
        assert_eq!(
            decode_value(MySqlValue::Bytes(b"12.50".to_vec()), &TypeCategory::Float),
            RawValue::Bytes(b"12.50".to_vec())
        );
    }

    #[test]
    fn dates_decode_and_zero_date_is_null() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            decode_value(MySqlValue::Date(2024, 7, 1, 10, 30, 0, 0), &TypeCategory::DateTime),
            RawValue::DateTime(expected)
        );
        assert_eq!(
            decode_value(MySqlValue::Date(0, 0, 0, 0, 0, 0, 0), &TypeCategory::DateTime),
            RawValue::Null
        );
    }

    #[test]
    fn durations_outside_a_day_are_null() {
        for value in [
            MySqlValue::Time(false, 1, 2, 0, 0, 0),
            MySqlValue::Time(true, 0, 1, 30, 0, 0),
        ] {
            let raw = decode_value(value, &TypeCategory::DateTime);
            assert_eq!(raw, RawValue::Null);

            let column = ColumnMeta::new("ShiftLength", "TIME", TypeCategory::DateTime);
            assert_eq!(map_value(&column, raw).unwrap(), Value::Null);
        }

        assert_eq!(
            decode_value(MySqlValue::Time(false, 0, 23, 59, 59, 0), &TypeCategory::DateTime),
            RawValue::Time(NaiveTime::from_hms_opt(23, 59, 59).unwrap())
        );
    }

    #[test]
    fn protocol_names_match_categories() {
        assert_eq!(category("LONGLONG"), TypeCategory::Integer);
        assert_eq!(category("NEWDECIMAL"), TypeCategory::Float);
        assert_eq!(category("BINARY"), TypeCategory::Other("BINARY".into()));
    }
}
