use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Source-side type family of a column, as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Integer,
    Float,
    Currency,
    Boolean,
    Text,
    DateTime,
    /// Anything the classifier does not know; carries the driver's type name.
    Other(String),
}

lazy_static! {
    static ref SQLSERVER_TYPE_MAP: HashMap<&'static str, TypeCategory> =
        build_sqlserver_type_map();
    static ref POSTGRES_TYPE_MAP: HashMap<&'static str, TypeCategory> = build_postgres_type_map();
    static ref MYSQL_TYPE_MAP: HashMap<&'static str, TypeCategory> = build_mysql_type_map();
}

impl TypeCategory {
    pub fn from_sqlserver_type(type_name: &str) -> Self {
        Self::lookup(&SQLSERVER_TYPE_MAP, type_name)
    }

    pub fn from_postgres_type(type_name: &str) -> Self {
        Self::lookup(&POSTGRES_TYPE_MAP, type_name)
    }

    pub fn from_mysql_type(type_name: &str) -> Self {
        Self::lookup(&MYSQL_TYPE_MAP, type_name)
    }

    fn lookup(map: &HashMap<&'static str, TypeCategory>, type_name: &str) -> Self {
        let normalized = Self::normalize_type_name(type_name);
        map.get(normalized.as_str())
            .cloned()
            .unwrap_or_else(|| TypeCategory::Other(type_name.to_string()))
    }

    /// Uppercases and drops any length/precision suffix, e.g. `varchar(50)`.
    fn normalize_type_name(type_name: &str) -> String {
        let base = match type_name.find('(') {
            Some(idx) => &type_name[..idx],
            None => type_name,
        };
        base.trim().to_uppercase()
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCategory::Integer => write!(f, "integer"),
            TypeCategory::Float => write!(f, "float"),
            TypeCategory::Currency => write!(f, "currency"),
            TypeCategory::Boolean => write!(f, "boolean"),
            TypeCategory::Text => write!(f, "text"),
            TypeCategory::DateTime => write!(f, "datetime"),
            TypeCategory::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Declared type of a column in a fixed extraction schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "int", alias = "integer")]
    Int,
    #[serde(alias = "double", alias = "decimal", alias = "currency")]
    Float,
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "string")]
    Text,
    #[serde(alias = "datetime", alias = "time")]
    Timestamp,
}

/// One column of a fixed extraction schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        ColumnSpec {
            name: name.to_string(),
            column_type,
        }
    }
}

fn build_sqlserver_type_map() -> HashMap<&'static str, TypeCategory> {
    use TypeCategory::*;

    let entries = [
        ("INT", Integer),
        ("BIGINT", Integer),
        ("SMALLINT", Integer),
        ("TINYINT", Integer),
        ("FLOAT", Float),
        ("REAL", Float),
        ("DECIMAL", Float),
        ("NUMERIC", Float),
        ("MONEY", Currency),
        ("SMALLMONEY", Currency),
        ("BIT", Boolean),
        ("CHAR", Text),
        ("VARCHAR", Text),
        ("TEXT", Text),
        ("NCHAR", Text),
        ("NVARCHAR", Text),
        ("NTEXT", Text),
        ("DATE", DateTime),
        ("DATETIME", DateTime),
        ("DATETIME2", DateTime),
        ("SMALLDATETIME", DateTime),
        ("TIME", DateTime),
        ("DATETIMEOFFSET", DateTime),
    ];

    entries.into_iter().collect()
}

fn build_postgres_type_map() -> HashMap<&'static str, TypeCategory> {
    use TypeCategory::*;

    let entries = [
        ("INT2", Integer),
        ("INT4", Integer),
        ("INT8", Integer),
        ("SMALLINT", Integer),
        ("INTEGER", Integer),
        ("BIGINT", Integer),
        ("FLOAT4", Float),
        ("FLOAT8", Float),
        ("REAL", Float),
        ("DOUBLE PRECISION", Float),
        ("NUMERIC", Float),
        ("DECIMAL", Float),
        ("MONEY", Currency),
        ("BOOL", Boolean),
        ("BOOLEAN", Boolean),
        ("CHAR", Text),
        ("BPCHAR", Text),
        ("VARCHAR", Text),
        ("TEXT", Text),
        ("NAME", Text),
        ("DATE", DateTime),
        ("TIME", DateTime),
        ("TIMESTAMP", DateTime),
        ("TIMESTAMPTZ", DateTime),
    ];

    entries.into_iter().collect()
}

fn build_mysql_type_map() -> HashMap<&'static str, TypeCategory> {
    use TypeCategory::*;

    let entries = [
        ("TINY", Integer),
        ("SHORT", Integer),
        ("LONG", Integer),
        ("LONGLONG", Integer),
        ("INT24", Integer),
        ("YEAR", Integer),
        ("FLOAT", Float),
        ("DOUBLE", Float),
        ("DECIMAL", Float),
        ("NEWDECIMAL", Float),
        ("BIT", Boolean),
        ("STRING", Text),
        ("VAR_STRING", Text),
        ("VARCHAR", Text),
        ("BLOB", Text),
        ("TINY_BLOB", Text),
        ("MEDIUM_BLOB", Text),
        ("LONG_BLOB", Text),
        ("ENUM", Text),
        ("DATE", DateTime),
        ("DATETIME", DateTime),
        ("TIMESTAMP", DateTime),
        ("TIME", DateTime),
    ];

    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlserver_names_are_case_insensitive() {
        assert_eq!(TypeCategory::from_sqlserver_type("money"), TypeCategory::Currency);
        assert_eq!(TypeCategory::from_sqlserver_type("NVarChar"), TypeCategory::Text);
        assert_eq!(
            TypeCategory::from_sqlserver_type("DATETIMEOFFSET"),
            TypeCategory::DateTime
        );
    }

    #[test]
    fn precision_suffix_is_ignored() {
        assert_eq!(TypeCategory::from_postgres_type("varchar(64)"), TypeCategory::Text);
        assert_eq!(TypeCategory::from_sqlserver_type("DECIMAL(18,2)"), TypeCategory::Float);
    }

    #[test]
    fn unknown_type_keeps_its_name() {
        assert_eq!(
            TypeCategory::from_sqlserver_type("UNIQUEIDENTIFIER"),
            TypeCategory::Other("UNIQUEIDENTIFIER".to_string())
        );
    }

    #[test]
    fn column_spec_accepts_type_aliases() {
        let spec: ColumnSpec =
            serde_json::from_str(r#"{"name": "OrderSum", "type": "currency"}"#).unwrap();
        assert_eq!(spec, ColumnSpec::new("OrderSum", ColumnType::Float));
    }
}
