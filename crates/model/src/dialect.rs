// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect rules
//!
//! The cache and the SQL editors are generic. What differs between servers
//! is captured here as data rather than as one class per vendor:
//!
//! - **Identifier storage case**: how the server stores unquoted names
//!   (PostgreSQL folds to lower case, the SQL standard to upper case, MySQL
//!   keeps the case as typed)
//! - **Quoting**: the quote character and when a name must be quoted
//! - **Features**: syntax variants the editors have to choose between
//!
//! ## Dialect Families
//!
//! - **MySQL Family**: MySQL, TiDB, MariaDB (backtick quoting, `MODIFY COLUMN`,
//!   inline column comments)
//! - **PostgreSQL Family**: PostgreSQL, CockroachDB (double quotes,
//!   `COMMENT ON`, transactional DDL)
//! - **Standard**: anything else, treated as SQL-92 with upper-case storage

use serde::{Deserialize, Serialize};

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Dialect {
    /// SQL standard behaviour
    #[default]
    Generic,
    /// MySQL (5.7, 8.0)
    MySQL,
    /// PostgreSQL (12, 14, 15+)
    PostgreSQL,
    /// TiDB (5.0 - 8.0)
    TiDB,
    /// MariaDB (10.x, 11.x)
    MariaDB,
    /// CockroachDB (21.x - 23.x)
    CockroachDB,
}

/// Dialect family groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectFamily {
    Standard,
    MySQL,
    PostgreSQL,
}

/// How a server stores unquoted identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierCase {
    Upper,
    Lower,
    Mixed,
}

impl IdentifierCase {
    /// Transform a name the way the server would store it unquoted
    pub fn transform(self, name: &str) -> String {
        match self {
            IdentifierCase::Upper => name.to_uppercase(),
            IdentifierCase::Lower => name.to_lowercase(),
            IdentifierCase::Mixed => name.to_string(),
        }
    }
}

/// Syntax variants that editors choose between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DialectFeature {
    /// `COMMENT ON TABLE/COLUMN ... IS '...'`
    CommentOn,
    /// `COMMENT '...'` inside column/table definitions
    InlineComment,
    /// `ALTER TABLE t MODIFY COLUMN c <definition>`
    ModifyColumn,
    /// `ALTER TABLE t RENAME COLUMN a TO b`
    RenameColumn,
    /// DDL participates in transactions
    TransactionalDdl,
    /// `DROP ... IF EXISTS`
    DropIfExists,
}

/// Words that always need quoting when used as identifiers
const RESERVED_WORDS: &[&str] = &[
    "ALL", "ALTER", "AND", "AS", "BY", "CASE", "CHECK", "COLUMN", "CONSTRAINT", "CREATE",
    "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "FROM", "GROUP", "HAVING", "IN", "INDEX",
    "INSERT", "INTO", "IS", "JOIN", "KEY", "LIMIT", "NOT", "NULL", "ON", "OR", "ORDER",
    "PRIMARY", "REFERENCES", "SELECT", "SET", "TABLE", "TO", "UNION", "UNIQUE", "UPDATE",
    "USER", "VALUES", "VIEW", "WHERE", "WITH",
];

impl Dialect {
    /// Returns the family this dialect belongs to
    pub fn family(&self) -> DialectFamily {
        match self {
            Dialect::MySQL | Dialect::TiDB | Dialect::MariaDB => DialectFamily::MySQL,
            Dialect::PostgreSQL | Dialect::CockroachDB => DialectFamily::PostgreSQL,
            Dialect::Generic => DialectFamily::Standard,
        }
    }

    /// Storage case for unquoted identifiers
    pub fn identifier_case(&self) -> IdentifierCase {
        match self.family() {
            DialectFamily::Standard => IdentifierCase::Upper,
            DialectFamily::PostgreSQL => IdentifierCase::Lower,
            DialectFamily::MySQL => IdentifierCase::Mixed,
        }
    }

    /// Whether catalog names should be compared case-sensitively by default
    pub fn case_sensitive_names(&self) -> bool {
        // Mixed-case storage means names are reported exactly as created.
        matches!(self.identifier_case(), IdentifierCase::Mixed)
    }

    pub fn quote_char(&self) -> char {
        match self.family() {
            DialectFamily::MySQL => '`',
            _ => '"',
        }
    }

    /// Check if this dialect supports a specific syntax feature
    pub fn supports(&self, feature: DialectFeature) -> bool {
        match self.family() {
            DialectFamily::MySQL => matches!(
                feature,
                DialectFeature::InlineComment
                    | DialectFeature::ModifyColumn
                    | DialectFeature::RenameColumn
                    | DialectFeature::DropIfExists
            ),
            DialectFamily::PostgreSQL => matches!(
                feature,
                DialectFeature::CommentOn
                    | DialectFeature::RenameColumn
                    | DialectFeature::TransactionalDdl
                    | DialectFeature::DropIfExists
            ),
            DialectFamily::Standard => {
                matches!(feature, DialectFeature::CommentOn | DialectFeature::RenameColumn)
            }
        }
    }

    /// Quote `name` if the server would not read it back unchanged when
    /// unquoted.
    pub fn quote_identifier(&self, name: &str) -> String {
        if self.is_plain_identifier(name) {
            return name.to_string();
        }
        let quote = self.quote_char();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Quote and dot-join a qualified name
    pub fn qualify<'a, I>(&self, segments: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        segments
            .into_iter()
            .map(|s| self.quote_identifier(s))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a string literal
    pub fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn is_plain_identifier(&self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return false;
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
        if RESERVED_WORDS.contains(&name.to_uppercase().as_str()) {
            return false;
        }
        self.identifier_case().transform(name) == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family() {
        assert_eq!(Dialect::TiDB.family(), DialectFamily::MySQL);
        assert_eq!(Dialect::CockroachDB.family(), DialectFamily::PostgreSQL);
        assert_eq!(Dialect::Generic.family(), DialectFamily::Standard);
    }

    #[test]
    fn test_quote_follows_storage_case() {
        assert_eq!(Dialect::PostgreSQL.quote_identifier("orders"), "orders");
        assert_eq!(Dialect::PostgreSQL.quote_identifier("Orders"), "\"Orders\"");
        assert_eq!(Dialect::Generic.quote_identifier("ORDERS"), "ORDERS");
        assert_eq!(Dialect::Generic.quote_identifier("orders"), "\"orders\"");
        assert_eq!(Dialect::MySQL.quote_identifier("Orders"), "Orders");
    }

    #[test]
    fn test_quote_special_names() {
        assert_eq!(Dialect::MySQL.quote_identifier("order"), "`order`");
        assert_eq!(Dialect::PostgreSQL.quote_identifier("my table"), "\"my table\"");
        assert_eq!(Dialect::PostgreSQL.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::PostgreSQL.quote_identifier(""), "\"\"");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(
            Dialect::PostgreSQL.qualify(["public", "Orders"]),
            "public.\"Orders\""
        );
    }

    #[test]
    fn test_features() {
        assert!(Dialect::PostgreSQL.supports(DialectFeature::CommentOn));
        assert!(!Dialect::MySQL.supports(DialectFeature::CommentOn));
        assert!(Dialect::MariaDB.supports(DialectFeature::ModifyColumn));
        assert!(Dialect::CockroachDB.supports(DialectFeature::TransactionalDdl));
    }

    #[test]
    fn test_literal_quoting() {
        assert_eq!(Dialect::Generic.quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_deserialize_lowercase() {
        let dialect: Dialect = serde_json::from_str("\"postgresql\"").unwrap();
        assert_eq!(dialect, Dialect::PostgreSQL);
    }
}
