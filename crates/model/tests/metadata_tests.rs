// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Tests for the generic catalog entities

use sqlmeta_model::{
    CatalogObject, Column, DataKind, Index, ObjectKind, ObjectPath, Schema, Table, TableType,
    TypedObject, sql_types,
};

fn orders_path() -> ObjectPath {
    ObjectPath::new(["public", "orders"])
}

#[test]
fn test_column_splits_declared_type() {
    let col = Column::new(&orders_path(), "email", "varchar(255)");
    assert_eq!(col.type_name, "varchar");
    assert_eq!(col.type_id(), sql_types::VARCHAR);
    assert_eq!(col.max_length(), Some(255));
    assert_eq!(col.data_kind(), DataKind::String);
    assert_eq!(col.full_type_name(), "varchar(255)");
}

#[test]
fn test_numeric_column_precision() {
    let col = Column::new(&orders_path(), "total", "numeric(12,2)");
    assert_eq!(col.precision(), Some(12));
    assert_eq!(col.scale(), Some(2));
    assert_eq!(col.max_length(), None);
    assert_eq!(col.full_type_name(), "numeric(12,2)");
}

#[test]
fn test_column_retype() {
    let mut col = Column::new(&orders_path(), "code", "int");
    col.set_type("varchar(20)");
    assert_eq!(col.type_id, sql_types::VARCHAR);
    assert_eq!(col.max_length, Some(20));
    assert_eq!(col.name, "code");
}

#[test]
fn test_paths() {
    let schema = Schema::new("public");
    assert_eq!(schema.path(), ObjectPath::new(["public"]));

    let table = Table::new(&schema.path(), "orders");
    assert_eq!(table.path(), orders_path());
    assert_eq!(table.schema_name(), Some("public"));

    let column = Column::new(&table.path(), "id", "bigint");
    assert!(column.path().is_within(&table.path()));
    assert_eq!(column.table_name(), Some("orders"));
    assert_eq!(column.kind(), ObjectKind::Column);
}

#[test]
fn test_unpersisted_constructors() {
    let table = Table::new_unpersisted(&ObjectPath::new(["public"]), "draft");
    assert!(!table.is_persisted());

    let index = Index::new_unpersisted(&orders_path(), "orders_idx")
        .with_unique(true)
        .with_columns(["id", "created_at"]);
    assert!(!index.is_persisted());
    assert_eq!(index.columns, vec!["id", "created_at"]);
}

#[test]
fn test_table_type_parsing() {
    assert_eq!(TableType::from_catalog("BASE TABLE"), TableType::Table);
    assert_eq!(TableType::from_catalog("view"), TableType::View);
    assert!(TableType::from_catalog("MATERIALIZED VIEW").is_view());
    assert_eq!(
        TableType::from_catalog("FOREIGN"),
        TableType::Other("FOREIGN".to_string())
    );
}

#[test]
fn test_mutators_used_by_commands() {
    let mut table = Table::new_unpersisted(&ObjectPath::new(["public"]), "draft");
    table.set_name("orders".to_string());
    table.set_persisted(true);
    assert_eq!(table.path(), orders_path());
    assert!(table.is_persisted());
}
