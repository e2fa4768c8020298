// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Typed objects
//!
//! Columns, routine parameters and data types all describe a value type. This
//! module defines the common contract ([`TypedObject`]) plus the coarse value
//! classification ([`DataKind`]) used by editors to decide which modifiers
//! (length, precision, scale) a type accepts.

use serde::{Deserialize, Serialize};

/// Numeric type identifiers reported by database drivers.
///
/// Values follow the widely used driver numbering so that ids read from
/// `information_schema` style catalogs can be compared directly.
pub mod sql_types {
    pub const BIT: i32 = -7;
    pub const TINYINT: i32 = -6;
    pub const SMALLINT: i32 = 5;
    pub const INTEGER: i32 = 4;
    pub const BIGINT: i32 = -5;
    pub const FLOAT: i32 = 6;
    pub const REAL: i32 = 7;
    pub const DOUBLE: i32 = 8;
    pub const NUMERIC: i32 = 2;
    pub const DECIMAL: i32 = 3;
    pub const CHAR: i32 = 1;
    pub const VARCHAR: i32 = 12;
    pub const LONGVARCHAR: i32 = -1;
    pub const NCHAR: i32 = -15;
    pub const NVARCHAR: i32 = -9;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const TIME_WITH_TIMEZONE: i32 = 2013;
    pub const TIMESTAMP_WITH_TIMEZONE: i32 = 2014;
    pub const BINARY: i32 = -2;
    pub const VARBINARY: i32 = -3;
    pub const LONGVARBINARY: i32 = -4;
    pub const NULL: i32 = 0;
    pub const OTHER: i32 = 1111;
    pub const JAVA_OBJECT: i32 = 2000;
    pub const STRUCT: i32 = 2002;
    pub const ARRAY: i32 = 2003;
    pub const BLOB: i32 = 2004;
    pub const CLOB: i32 = 2005;
    pub const REF: i32 = 2006;
    pub const BOOLEAN: i32 = 16;
    pub const ROWID: i32 = -8;
    pub const SQLXML: i32 = 2009;

    /// Resolve a vendor type name (with or without modifiers) to a type id.
    ///
    /// Unknown names resolve to [`OTHER`].
    pub fn from_type_name(type_name: &str) -> i32 {
        let lower = type_name.trim().to_lowercase();
        if lower.ends_with("[]") || lower.starts_with("array") {
            return ARRAY;
        }
        let base: String = lower
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
            .collect();

        match base.trim() {
            "bit" => BIT,
            "tinyint" => TINYINT,
            "smallint" | "int2" => SMALLINT,
            "integer" | "int" | "int4" | "mediumint" => INTEGER,
            "bigint" | "int8" => BIGINT,
            "float" => FLOAT,
            "real" | "float4" => REAL,
            "double" | "double precision" | "float8" => DOUBLE,
            "numeric" | "number" => NUMERIC,
            "decimal" => DECIMAL,
            "char" | "character" => CHAR,
            "varchar" | "character varying" | "varchar2" => VARCHAR,
            "text" | "longtext" | "mediumtext" => LONGVARCHAR,
            "nchar" => NCHAR,
            "nvarchar" | "nvarchar2" => NVARCHAR,
            "date" => DATE,
            "time" | "time without time zone" => TIME,
            "timetz" | "time with time zone" => TIME_WITH_TIMEZONE,
            "timestamp" | "timestamp without time zone" | "datetime" => TIMESTAMP,
            "timestamptz" | "timestamp with time zone" => TIMESTAMP_WITH_TIMEZONE,
            "binary" => BINARY,
            "varbinary" | "bytea" => VARBINARY,
            "blob" | "longblob" => BLOB,
            "clob" => CLOB,
            "boolean" | "bool" => BOOLEAN,
            "rowid" => ROWID,
            "xml" => SQLXML,
            "json" | "jsonb" | "uuid" => OTHER,
            _ => OTHER,
        }
    }
}

/// Coarse classification of a value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Boolean,
    Numeric,
    String,
    DateTime,
    Binary,
    Content,
    Structure,
    Array,
    Object,
    Reference,
    RowId,
    Any,
    Unknown,
}

impl DataKind {
    /// Classify a driver type id
    pub fn from_type_id(type_id: i32) -> Self {
        use sql_types::*;
        match type_id {
            BOOLEAN | BIT => DataKind::Boolean,
            TINYINT | SMALLINT | INTEGER | BIGINT | FLOAT | REAL | DOUBLE | NUMERIC
            | DECIMAL => DataKind::Numeric,
            CHAR | VARCHAR | LONGVARCHAR | NCHAR | NVARCHAR => DataKind::String,
            DATE | TIME | TIMESTAMP | TIME_WITH_TIMEZONE | TIMESTAMP_WITH_TIMEZONE => {
                DataKind::DateTime
            }
            BINARY | VARBINARY | LONGVARBINARY => DataKind::Binary,
            BLOB | CLOB | SQLXML => DataKind::Content,
            STRUCT => DataKind::Structure,
            ARRAY => DataKind::Array,
            JAVA_OBJECT => DataKind::Object,
            REF => DataKind::Reference,
            ROWID => DataKind::RowId,
            OTHER => DataKind::Any,
            _ => DataKind::Unknown,
        }
    }

    /// Classify a vendor type name such as `character varying(255)`
    pub fn from_type_name(type_name: &str) -> Self {
        Self::from_type_id(sql_types::from_type_name(type_name))
    }

    /// Whether the kind accepts a length modifier (`varchar(50)`)
    pub fn has_length(self) -> bool {
        matches!(self, DataKind::String | DataKind::Binary)
    }

    /// Whether the kind accepts precision and scale modifiers
    pub fn has_precision(self) -> bool {
        matches!(self, DataKind::Numeric)
    }
}

/// Contract for anything that describes a typed value
pub trait TypedObject {
    /// Type name as reported by the server (without modifiers)
    fn type_name(&self) -> &str;

    /// Driver type id, see [`sql_types`]
    fn type_id(&self) -> i32;

    /// Coarse classification
    fn data_kind(&self) -> DataKind {
        DataKind::from_type_id(self.type_id())
    }

    fn scale(&self) -> Option<i32> {
        None
    }

    fn precision(&self) -> Option<i32> {
        None
    }

    fn max_length(&self) -> Option<u64> {
        None
    }

    /// Full type declaration including modifiers, e.g. `varchar(50)` or
    /// `numeric(10,2)`
    fn full_type_name(&self) -> String {
        let kind = self.data_kind();
        if kind.has_length() {
            if let Some(len) = self.max_length() {
                return format!("{}({})", self.type_name(), len);
            }
        }
        if kind.has_precision() {
            match (self.precision(), self.scale()) {
                (Some(p), Some(s)) if s > 0 => {
                    return format!("{}({},{})", self.type_name(), p, s);
                }
                (Some(p), _) if self.type_id() == sql_types::NUMERIC
                    || self.type_id() == sql_types::DECIMAL =>
                {
                    return format!("{}({})", self.type_name(), p);
                }
                _ => {}
            }
        }
        self.type_name().to_string()
    }
}

/// Split a declared type into its base name and numeric modifiers
///
/// `"numeric(10,2)"` -> `("numeric", Some(10), Some(2))`,
/// `"varchar(50)"` -> `("varchar", Some(50), None)`.
pub fn split_type_modifiers(declared: &str) -> (String, Option<u64>, Option<i32>) {
    let declared = declared.trim();
    let Some(open) = declared.find('(') else {
        return (declared.to_string(), None, None);
    };
    let base = declared[..open].trim().to_string();
    let Some(close) = declared[open..].find(')') else {
        return (base, None, None);
    };
    let inner = &declared[open + 1..open + close];
    let mut parts = inner.split(',').map(str::trim);
    let first = parts.next().and_then(|p| p.parse::<u64>().ok());
    let second = parts.next().and_then(|p| p.parse::<i32>().ok());
    (base, first, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_resolution() {
        assert_eq!(sql_types::from_type_name("INTEGER"), sql_types::INTEGER);
        assert_eq!(sql_types::from_type_name("character varying(255)"), sql_types::VARCHAR);
        assert_eq!(sql_types::from_type_name("timestamp with time zone"), sql_types::TIMESTAMP_WITH_TIMEZONE);
        assert_eq!(sql_types::from_type_name("integer[]"), sql_types::ARRAY);
        assert_eq!(sql_types::from_type_name("custom_type"), sql_types::OTHER);
    }

    #[test]
    fn test_data_kind_from_name() {
        assert_eq!(DataKind::from_type_name("bool"), DataKind::Boolean);
        assert_eq!(DataKind::from_type_name("numeric(10,2)"), DataKind::Numeric);
        assert_eq!(DataKind::from_type_name("varchar(50)"), DataKind::String);
        assert_eq!(DataKind::from_type_name("bytea"), DataKind::Binary);
        assert_eq!(DataKind::from_type_name("jsonb"), DataKind::Any);
    }

    #[test]
    fn test_split_type_modifiers() {
        assert_eq!(
            split_type_modifiers("numeric(10, 2)"),
            ("numeric".to_string(), Some(10), Some(2))
        );
        assert_eq!(
            split_type_modifiers("varchar(50)"),
            ("varchar".to_string(), Some(50), None)
        );
        assert_eq!(split_type_modifiers("text"), ("text".to_string(), None, None));
        assert_eq!(split_type_modifiers("char(abc"), ("char".to_string(), None, None));
    }

    struct Decl {
        name: &'static str,
        id: i32,
        len: Option<u64>,
        precision: Option<i32>,
        scale: Option<i32>,
    }

    impl TypedObject for Decl {
        fn type_name(&self) -> &str {
            self.name
        }
        fn type_id(&self) -> i32 {
            self.id
        }
        fn scale(&self) -> Option<i32> {
            self.scale
        }
        fn precision(&self) -> Option<i32> {
            self.precision
        }
        fn max_length(&self) -> Option<u64> {
            self.len
        }
    }

    #[test]
    fn test_full_type_name() {
        let varchar = Decl { name: "varchar", id: sql_types::VARCHAR, len: Some(50), precision: None, scale: None };
        assert_eq!(varchar.full_type_name(), "varchar(50)");

        let numeric = Decl { name: "numeric", id: sql_types::NUMERIC, len: None, precision: Some(10), scale: Some(2) };
        assert_eq!(numeric.full_type_name(), "numeric(10,2)");

        let int = Decl { name: "int", id: sql_types::INTEGER, len: None, precision: Some(10), scale: Some(0) };
        assert_eq!(int.full_type_name(), "int");
    }
}
