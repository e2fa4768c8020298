// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Generic catalog entities
//!
//! The entity set understood by the generic `information_schema` fetchers
//! and SQL editors. Vendor adapters may define their own entities; these
//! cover the common relational subset.

use crate::kind::{DataKind, TypedObject, sql_types};
use crate::object::{CatalogObject, ObjectKind};
use crate::path::ObjectPath;
use serde::{Deserialize, Serialize};

/// Root container of a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    #[serde(skip)]
    parent: ObjectPath,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: ObjectPath::root(),
        }
    }
}

impl CatalogObject for Database {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Database
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn parent(&self) -> &ObjectPath {
        &self.parent
    }

    fn set_parent(&mut self, parent: ObjectPath) {
        self.parent = parent;
    }

    fn is_persisted(&self) -> bool {
        true
    }

    fn set_persisted(&mut self, _persisted: bool) {}

    // Schemas hang directly off the root path.
    fn path(&self) -> ObjectPath {
        ObjectPath::root()
    }
}

/// Schema (namespace) inside a database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub owner: Option<String>,
    pub persisted: bool,
    #[serde(skip)]
    parent: ObjectPath,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            persisted: true,
            parent: ObjectPath::root(),
        }
    }

    /// Builder method: set owner role
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

impl CatalogObject for Schema {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn parent(&self) -> &ObjectPath {
        &self.parent
    }

    fn set_parent(&mut self, parent: ObjectPath) {
        self.parent = parent;
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }
}

/// Table type classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableType {
    Table,
    View,
    MaterializedView,
    Temporary,
    System,
    Other(String),
}

impl TableType {
    /// Parse the `table_type` column of `information_schema.tables`
    pub fn from_catalog(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "BASE TABLE" | "TABLE" => TableType::Table,
            "VIEW" => TableType::View,
            "MATERIALIZED VIEW" => TableType::MaterializedView,
            "LOCAL TEMPORARY" | "GLOBAL TEMPORARY" | "TEMPORARY" => TableType::Temporary,
            "SYSTEM VIEW" | "SYSTEM TABLE" => TableType::System,
            other => TableType::Other(other.to_string()),
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self, TableType::View | TableType::MaterializedView)
    }
}

/// Table or view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub table_type: TableType,
    pub comment: Option<String>,
    pub persisted: bool,
    parent: ObjectPath,
}

impl Table {
    /// A table reported by the server
    pub fn new(schema: &ObjectPath, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: TableType::Table,
            comment: None,
            persisted: true,
            parent: schema.clone(),
        }
    }

    /// A table created by an edit, not yet known to the server
    pub fn new_unpersisted(schema: &ObjectPath, name: impl Into<String>) -> Self {
        Self {
            persisted: false,
            ..Self::new(schema, name)
        }
    }

    /// Builder method: set table type
    pub fn with_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    /// Builder method: set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Name of the owning schema
    pub fn schema_name(&self) -> Option<&str> {
        self.parent.name()
    }
}

impl CatalogObject for Table {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Table
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn parent(&self) -> &ObjectPath {
        &self.parent
    }

    fn set_parent(&mut self, parent: ObjectPath) {
        self.parent = parent;
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }
}

/// Table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Type name without modifiers
    pub type_name: String,
    pub type_id: i32,
    pub max_length: Option<u64>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub comment: Option<String>,
    /// 1-based position reported by the server
    pub ordinal: u32,
    pub persisted: bool,
    parent: ObjectPath,
}

impl Column {
    /// A column reported by the server
    ///
    /// `type_name` may carry modifiers (`varchar(50)`); they are split into
    /// length / precision / scale.
    pub fn new(table: &ObjectPath, name: impl Into<String>, type_name: &str) -> Self {
        let (base, first, second) = crate::kind::split_type_modifiers(type_name);
        let type_id = sql_types::from_type_name(&base);
        let kind = DataKind::from_type_id(type_id);
        let (max_length, precision, scale) = if kind.has_length() {
            (first, None, None)
        } else if kind.has_precision() {
            (None, first.and_then(|p| i32::try_from(p).ok()), second)
        } else {
            (None, None, None)
        };

        Self {
            name: name.into(),
            type_name: base,
            type_id,
            max_length,
            precision,
            scale,
            nullable: true,
            default_value: None,
            comment: None,
            ordinal: 0,
            persisted: true,
            parent: table.clone(),
        }
    }

    /// A column created by an edit, not yet known to the server
    pub fn new_unpersisted(table: &ObjectPath, name: impl Into<String>, type_name: &str) -> Self {
        Self {
            persisted: false,
            ..Self::new(table, name, type_name)
        }
    }

    /// Builder method: set nullable
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Builder method: set default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }

    /// Builder method: set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Builder method: set ordinal position
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Replace the declared type, re-deriving id and modifiers
    pub fn set_type(&mut self, type_name: &str) {
        let retyped = Column::new(&self.parent, self.name.clone(), type_name);
        self.type_name = retyped.type_name;
        self.type_id = retyped.type_id;
        self.max_length = retyped.max_length;
        self.precision = retyped.precision;
        self.scale = retyped.scale;
    }

    /// Name of the owning table
    pub fn table_name(&self) -> Option<&str> {
        self.parent.name()
    }
}

impl TypedObject for Column {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn type_id(&self) -> i32 {
        self.type_id
    }

    fn scale(&self) -> Option<i32> {
        self.scale
    }

    fn precision(&self) -> Option<i32> {
        self.precision
    }

    fn max_length(&self) -> Option<u64> {
        self.max_length
    }
}

impl CatalogObject for Column {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Column
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn parent(&self) -> &ObjectPath {
        &self.parent
    }

    fn set_parent(&mut self, parent: ObjectPath) {
        self.parent = parent;
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }
}

/// Table index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    /// Indexed column names in key order
    pub columns: Vec<String>,
    pub persisted: bool,
    parent: ObjectPath,
}

impl Index {
    pub fn new(table: &ObjectPath, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: false,
            columns: Vec::new(),
            persisted: true,
            parent: table.clone(),
        }
    }

    pub fn new_unpersisted(table: &ObjectPath, name: impl Into<String>) -> Self {
        Self {
            persisted: false,
            ..Self::new(table, name)
        }
    }

    /// Builder method: mark as unique
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Builder method: set indexed columns
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.parent.name()
    }
}

impl CatalogObject for Index {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Index
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn parent(&self) -> &ObjectPath {
        &self.parent
    }

    fn set_parent(&mut self, parent: ObjectPath) {
        self.parent = parent;
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }
}
