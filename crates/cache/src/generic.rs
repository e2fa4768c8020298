// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Generic information_schema fetchers
//!
//! Fetchers reading schemas, tables, columns and indexes from the SQL
//! standard `information_schema` views. Vendors with richer system catalogs
//! implement [`ObjectFetcher`] / [`ChildFetcher`] themselves.
//!
//! All queries use positional `?` parameters: the schema name first, then
//! the table or object name.

use crate::error::{CatalogError, CatalogResult};
use crate::object_cache::ObjectFetcher;
use crate::row::Row;
use crate::session::MetaQuery;
use crate::struct_cache::ChildFetcher;
use sqlmeta_model::{
    CatalogObject, Column, Database, Dialect, DialectFamily, Index, Schema, Table, TableType,
};

const SCHEMAS_QUERY: &str = "SELECT schema_name FROM information_schema.schemata";

const TABLES_QUERY: &str = "SELECT table_name, table_type FROM information_schema.tables \
     WHERE table_schema = ?";

const COLUMNS_QUERY: &str = "SELECT table_name, column_name, data_type, \
     character_maximum_length, numeric_precision, numeric_scale, is_nullable, \
     column_default, ordinal_position FROM information_schema.columns \
     WHERE table_schema = ?";

fn required(row: &Row, label: &str) -> CatalogResult<String> {
    row.require_string(label)
        .map_err(|e| CatalogError::data_access("Read information_schema row", e))
}

/// Schemas of a database
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSchemaFetcher;

impl ObjectFetcher<Database, Schema> for GenericSchemaFetcher {
    fn objects_query(&self, _owner: &Database) -> MetaQuery {
        MetaQuery::new(format!("{SCHEMAS_QUERY} ORDER BY schema_name"))
    }

    fn object_query(&self, _owner: &Database, name: &str) -> Option<MetaQuery> {
        Some(MetaQuery::new(format!("{SCHEMAS_QUERY} WHERE schema_name = ?")).bind(name))
    }

    fn fetch_object(&self, _owner: &Database, row: &Row) -> CatalogResult<Option<Schema>> {
        Ok(Some(Schema::new(required(row, "schema_name")?)))
    }
}

/// Tables and views of a schema
#[derive(Debug, Clone, Copy)]
pub struct GenericTableFetcher {
    include_views: bool,
}

impl GenericTableFetcher {
    pub fn new() -> Self {
        Self {
            include_views: true,
        }
    }

    /// Builder method: skip views
    pub fn without_views(mut self) -> Self {
        self.include_views = false;
        self
    }
}

impl Default for GenericTableFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectFetcher<Schema, Table> for GenericTableFetcher {
    fn objects_query(&self, owner: &Schema) -> MetaQuery {
        MetaQuery::new(format!("{TABLES_QUERY} ORDER BY table_name")).bind(owner.name())
    }

    fn object_query(&self, owner: &Schema, name: &str) -> Option<MetaQuery> {
        Some(
            MetaQuery::new(format!("{TABLES_QUERY} AND table_name = ?"))
                .bind(owner.name())
                .bind(name),
        )
    }

    fn fetch_object(&self, owner: &Schema, row: &Row) -> CatalogResult<Option<Table>> {
        let name = required(row, "table_name")?;
        let table_type = row
            .get_string("table_type")
            .map(|t| TableType::from_catalog(&t))
            .unwrap_or(TableType::Table);
        Ok(Some(Table::new(&owner.path(), name).with_type(table_type)))
    }

    fn accept(&self, _owner: &Schema, table: &Table) -> bool {
        self.include_views || !table.table_type.is_view()
    }
}

/// Columns of the tables of a schema
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericColumnFetcher;

impl ChildFetcher<Schema, Table, Column> for GenericColumnFetcher {
    fn children_query(&self, owner: &Schema, parent: Option<&Table>) -> MetaQuery {
        match parent {
            Some(table) => MetaQuery::new(format!(
                "{COLUMNS_QUERY} AND table_name = ? ORDER BY ordinal_position"
            ))
            .bind(owner.name())
            .bind(table.name()),
            None => MetaQuery::new(format!(
                "{COLUMNS_QUERY} ORDER BY table_name, ordinal_position"
            ))
            .bind(owner.name()),
        }
    }

    fn parent_name(&self, row: &Row) -> CatalogResult<String> {
        required(row, "table_name")
    }

    fn fetch_child(&self, _owner: &Schema, parent: &Table, row: &Row) -> CatalogResult<Option<Column>> {
        let name = required(row, "column_name")?;
        let data_type = required(row, "data_type")?;

        let mut column = Column::new(&parent.path(), name, &data_type)
            .with_nullable(row.get_bool("is_nullable").unwrap_or(true));
        if let Some(length) = row.get_i64("character_maximum_length") {
            column.max_length = u64::try_from(length).ok();
        }
        if let Some(precision) = row.get_i64("numeric_precision") {
            column.precision = i32::try_from(precision).ok();
        }
        if let Some(scale) = row.get_i64("numeric_scale") {
            column.scale = i32::try_from(scale).ok();
        }
        if let Some(default) = row.get_string("column_default") {
            column = column.with_default(default);
        }
        if let Some(ordinal) = row.get_i64("ordinal_position") {
            column = column.with_ordinal(u32::try_from(ordinal).unwrap_or(0));
        }
        Ok(Some(column))
    }
}

/// Indexes of one table, read from `information_schema.statistics`
///
/// The view has one row per indexed column; rows are grouped per index with
/// the dialect's string aggregate.
#[derive(Debug, Clone, Copy)]
pub struct GenericIndexFetcher {
    dialect: Dialect,
}

impl GenericIndexFetcher {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn query(&self, extra_filter: &str) -> String {
        let columns = match self.dialect.family() {
            DialectFamily::PostgreSQL => {
                "string_agg(column_name, ',' ORDER BY seq_in_index)".to_string()
            }
            _ => "GROUP_CONCAT(column_name ORDER BY seq_in_index SEPARATOR ',')".to_string(),
        };
        format!(
            "SELECT index_name, MIN(non_unique) AS non_unique, {columns} AS column_names \
             FROM information_schema.statistics \
             WHERE table_schema = ? AND table_name = ?{extra_filter} \
             GROUP BY index_name ORDER BY index_name"
        )
    }
}

impl ObjectFetcher<Table, Index> for GenericIndexFetcher {
    fn objects_query(&self, owner: &Table) -> MetaQuery {
        MetaQuery::new(self.query(""))
            .bind(owner.schema_name().unwrap_or_default())
            .bind(owner.name())
    }

    fn object_query(&self, owner: &Table, name: &str) -> Option<MetaQuery> {
        Some(
            MetaQuery::new(self.query(" AND index_name = ?"))
                .bind(owner.schema_name().unwrap_or_default())
                .bind(owner.name())
                .bind(name),
        )
    }

    fn fetch_object(&self, owner: &Table, row: &Row) -> CatalogResult<Option<Index>> {
        let name = required(row, "index_name")?;
        let unique = row.get_bool("non_unique").map(|n| !n).unwrap_or(false);
        let columns = row.get_string("column_names").unwrap_or_default();
        let index = Index::new(&owner.path(), name)
            .with_unique(unique)
            .with_columns(columns.split(',').map(str::trim).filter(|c| !c.is_empty()));
        Ok(Some(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Value;
    use sqlmeta_model::ObjectPath;

    fn schema() -> Schema {
        Schema::new("public")
    }

    #[test]
    fn test_table_lookup_query_binds_schema_then_name() {
        let query = GenericTableFetcher::new()
            .object_query(&schema(), "orders")
            .unwrap();
        assert!(query.sql.contains("table_name = ?"));
        assert_eq!(
            query.params,
            vec![Value::from("public"), Value::from("orders")]
        );
    }

    #[test]
    fn test_views_filtered_when_requested() {
        let fetcher = GenericTableFetcher::new().without_views();
        let row = Row::from_pairs([("table_name", "v_orders"), ("table_type", "VIEW")]);
        let view = fetcher.fetch_object(&schema(), &row).unwrap().unwrap();
        assert_eq!(view.table_type, TableType::View);
        assert!(!fetcher.accept(&schema(), &view));
    }

    #[test]
    fn test_default_fetcher_keeps_views() {
        let fetcher = GenericTableFetcher::default();
        let row = Row::from_pairs([("table_name", "v_orders"), ("table_type", "VIEW")]);
        let view = fetcher.fetch_object(&schema(), &row).unwrap().unwrap();
        assert!(fetcher.accept(&schema(), &view));
    }

    #[test]
    fn test_column_row_conversion() {
        let table = Table::new(&ObjectPath::new(["public"]), "orders");
        let row = Row::from_pairs([
            ("table_name", Value::from("orders")),
            ("column_name", Value::from("note")),
            ("data_type", Value::from("varchar")),
            ("character_maximum_length", Value::from(50)),
            ("numeric_precision", Value::Null),
            ("numeric_scale", Value::Null),
            ("is_nullable", Value::from("NO")),
            ("column_default", Value::Null),
            ("ordinal_position", Value::from(2)),
        ]);

        let column = GenericColumnFetcher
            .fetch_child(&schema(), &table, &row)
            .unwrap()
            .unwrap();
        assert_eq!(column.name, "note");
        assert_eq!(column.max_length, Some(50));
        assert!(!column.nullable);
        assert_eq!(column.ordinal, 2);
        assert_eq!(column.path(), ObjectPath::new(["public", "orders", "note"]));
        assert_eq!(GenericColumnFetcher.parent_name(&row).unwrap(), "orders");
    }

    #[test]
    fn test_missing_name_is_data_access_error() {
        let row = Row::from_pairs([("table_type", "VIEW")]);
        let err = GenericTableFetcher::new()
            .fetch_object(&schema(), &row)
            .unwrap_err();
        assert!(matches!(err, CatalogError::DataAccess { .. }));
    }

    #[test]
    fn test_index_columns_split() {
        let table = Table::new(&ObjectPath::new(["public"]), "orders");
        let row = Row::from_pairs([
            ("index_name", Value::from("ix_orders_customer")),
            ("non_unique", Value::from(0)),
            ("column_names", Value::from("customer_id,created_at")),
        ]);
        let index = GenericIndexFetcher::new(Dialect::MySQL)
            .fetch_object(&table, &row)
            .unwrap()
            .unwrap();
        assert!(index.unique);
        assert_eq!(index.columns, vec!["customer_id", "created_at"]);
    }

    #[test]
    fn test_index_aggregate_follows_dialect() {
        let table = Table::new(&ObjectPath::new(["public"]), "orders");
        let pg = GenericIndexFetcher::new(Dialect::PostgreSQL).objects_query(&table);
        let my = GenericIndexFetcher::new(Dialect::MySQL).objects_query(&table);
        assert!(pg.sql.contains("string_agg"));
        assert!(my.sql.contains("GROUP_CONCAT"));
    }
}
