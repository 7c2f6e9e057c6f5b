use crate::sql::base::{
    error::DbError,
    row::{RawValue, scaled_decimal_text},
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use model::core::data_type::TypeCategory;
use tiberius::{ColumnData, ColumnType, FromSql};

/// Declared SQL Server type name for a result column.
pub(crate) fn type_name(ty: ColumnType) -> String {
    let name = match ty {
        ColumnType::Int1 => "TINYINT",
        ColumnType::Int2 => "SMALLINT",
        ColumnType::Int4 | ColumnType::Intn => "INT",
        ColumnType::Int8 => "BIGINT",
        ColumnType::Bit | ColumnType::Bitn => "BIT",
        ColumnType::Float4 => "REAL",
        ColumnType::Float8 | ColumnType::Floatn => "FLOAT",
        ColumnType::Decimaln => "DECIMAL",
        ColumnType::Numericn => "NUMERIC",
        ColumnType::Money => "MONEY",
        ColumnType::Money4 => "SMALLMONEY",
        ColumnType::Datetime | ColumnType::Datetimen => "DATETIME",
        ColumnType::Datetime4 => "SMALLDATETIME",
        ColumnType::Datetime2 => "DATETIME2",
        ColumnType::Daten => "DATE",
        ColumnType::Timen => "TIME",
        ColumnType::DatetimeOffsetn => "DATETIMEOFFSET",
        ColumnType::BigChar => "CHAR",
        ColumnType::BigVarChar => "VARCHAR",
        ColumnType::Text => "TEXT",
        ColumnType::NChar => "NCHAR",
        ColumnType::NVarchar => "NVARCHAR",
        ColumnType::NText => "NTEXT",
        ColumnType::Guid => "UNIQUEIDENTIFIER",
        ColumnType::Xml => "XML",
        other => return format!("{other:?}").to_uppercase(),
    };
    name.to_string()
}

fn opt<T>(value: Option<T>, wrap: impl FnOnce(T) -> RawValue) -> RawValue {
    value.map(wrap).unwrap_or(RawValue::Null)
}

/// `money` and `smallmoney` are stored as integer ten-thousandths, but the
/// driver hands them over as floats. The integer is recovered by rounding
/// and rendered without going back through floating point, which is exact
/// for amounts below 2^53 ten-thousandths.
fn money_text(value: f64) -> RawValue {
    let units = (value * 10_000.0).round();
    if units.is_finite() {
        RawValue::Text(scaled_decimal_text(units as i64, 4))
    } else {
        RawValue::Float(value)
    }
}

/// Decodes one cell. Money is handed on as four-decimal text, the precision
/// SQL Server stores it with.
pub(crate) fn decode_cell(
    data: &ColumnData<'static>,
    category: &TypeCategory,
) -> Result<RawValue, DbError> {
    let is_currency = *category == TypeCategory::Currency;

    let value = match data {
        ColumnData::U8(v) => opt(*v, |v| RawValue::Int(v.into())),
        ColumnData::I16(v) => opt(*v, |v| RawValue::Int(v.into())),
        ColumnData::I32(v) => opt(*v, |v| RawValue::Int(v.into())),
        ColumnData::I64(v) => opt(*v, RawValue::Int),
        ColumnData::F32(v) if is_currency => opt(*v, |v| money_text(v.into())),
        ColumnData::F64(v) if is_currency => opt(*v, money_text),
        ColumnData::F32(v) => opt(*v, |v| RawValue::Float(v.into())),
        ColumnData::F64(v) => opt(*v, RawValue::Float),
        ColumnData::Bit(v) => opt(*v, RawValue::Bool),
        ColumnData::String(v) => opt(v.as_ref(), |v| RawValue::Text(v.to_string())),
        ColumnData::Guid(v) => opt(*v, |v| RawValue::Text(v.to_string())),
        ColumnData::Binary(v) => opt(v.as_ref(), |v| RawValue::Bytes(v.to_vec())),
        ColumnData::Numeric(v) => opt(v.as_ref(), |v| RawValue::Text(v.to_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            opt(NaiveDateTime::from_sql(data)?, RawValue::DateTime)
        }
        ColumnData::Date(_) => opt(NaiveDate::from_sql(data)?, RawValue::Date),
        ColumnData::Time(_) => opt(NaiveTime::from_sql(data)?, RawValue::Time),
        ColumnData::DateTimeOffset(_) => {
            opt(DateTime::<FixedOffset>::from_sql(data)?, RawValue::DateTimeTz)
        }
        other => RawValue::Text(format!("{other:?}")),
    };

    Ok(value)
}
