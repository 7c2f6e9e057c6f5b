use crate::sql::base::{
    error::DbError,
    row::{RawValue, scaled_decimal_text},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use tokio_postgres::{
    Row as PgRow,
    types::{FromSql, Type},
};

type BoxError = Box<dyn Error + Sync + Send>;

/// `money` in binary form: a signed count of cents.
/// Assumes a two-digit fractional currency, the Postgres default.
struct PgMoney(i64);

impl<'a> FromSql<'a> for PgMoney {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let bytes: [u8; 8] = raw.try_into()?;
        Ok(PgMoney(i64::from_be_bytes(bytes)))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::MONEY
    }
}

impl PgMoney {
    fn to_decimal_text(&self) -> String {
        scaled_decimal_text(self.0, 2)
    }
}

/// The wire bytes of any type, for columns without a native decoder.
struct AnyBytes(Vec<u8>);

impl<'a> FromSql<'a> for AnyBytes {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(AnyBytes(raw.to_vec()))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn get<'a, T, F>(row: &'a PgRow, idx: usize, wrap: F) -> Result<RawValue, DbError>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> RawValue,
{
    let value: Option<T> = row.try_get(idx)?;
    Ok(value.map(wrap).unwrap_or(RawValue::Null))
}

/// Decodes column `idx` of a row into its raw form.
pub(crate) fn decode_value(row: &PgRow, idx: usize, ty: &Type) -> Result<RawValue, DbError> {
    match *ty {
        Type::INT2 => get(row, idx, |v: i16| RawValue::Int(v.into())),
        Type::INT4 => get(row, idx, |v: i32| RawValue::Int(v.into())),
        Type::INT8 => get(row, idx, RawValue::Int),
        Type::FLOAT4 => get(row, idx, |v: f32| RawValue::Float(v.into())),
        Type::FLOAT8 => get(row, idx, RawValue::Float),
        Type::NUMERIC => get(row, idx, |v: Decimal| RawValue::Text(v.to_string())),
        Type::MONEY => get(row, idx, |v: PgMoney| RawValue::Text(v.to_decimal_text())),
        Type::BOOL => get(row, idx, RawValue::Bool),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => get(row, idx, RawValue::Text),
        Type::CHAR => get(row, idx, |v: i8| RawValue::Text(char::from(v as u8).to_string())),
        Type::DATE => get(row, idx, |v: NaiveDate| RawValue::Date(v)),
        Type::TIME => get(row, idx, |v: NaiveTime| RawValue::Time(v)),
        Type::TIMESTAMP => get(row, idx, |v: NaiveDateTime| RawValue::DateTime(v)),
        Type::TIMESTAMPTZ => get(row, idx, |v: DateTime<Utc>| {
            RawValue::DateTimeTz(v.fixed_offset())
        }),
        _ => get(row, idx, |v: AnyBytes| RawValue::Bytes(v.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_renders_two_decimals() {
        assert_eq!(PgMoney(12345).to_decimal_text(), "123.45");
        assert_eq!(PgMoney(-5).to_decimal_text(), "-0.05");
        assert_eq!(PgMoney(0).to_decimal_text(), "0.00");
    }

    #[test]
    fn money_decodes_big_endian_cents() {
        let raw = 1999_i64.to_be_bytes();
        let money = PgMoney::from_sql(&Type::MONEY, &raw).unwrap();
        assert_eq!(money.0, 1999);
        assert!(PgMoney::from_sql(&Type::MONEY, &raw[..4]).is_err());
    }
}
