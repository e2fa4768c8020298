// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Struct cache (tables with nested column caches) against the mock server

use sqlmeta_cache::{
    CacheConfig, CatalogResult, GenericColumnFetcher, GenericTableFetcher, LoadState, MetaQuery,
    NullProgressMonitor, ObjectContainer, ObjectFetcher, Row, TableCache,
};
use sqlmeta_model::{CatalogObject, Column, Dialect, ObjectPath, Schema, Table};
use sqlmeta_test_utils::{MockServer, MockTable, init_test_tracing, sample_source};
use std::sync::Arc;

const COLUMNS: &str = "information_schema.columns";

/// Table fetcher without a single-object query
struct ListOnlyTables(GenericTableFetcher);

impl ObjectFetcher<Schema, Table> for ListOnlyTables {
    fn objects_query(&self, owner: &Schema) -> MetaQuery {
        self.0.objects_query(owner)
    }

    fn fetch_object(&self, owner: &Schema, row: &Row) -> CatalogResult<Option<Table>> {
        self.0.fetch_object(owner, row)
    }
}

fn setup_with(
    config: CacheConfig,
    fetcher: Arc<dyn ObjectFetcher<Schema, Table>>,
) -> (MockServer, TableCache, Schema) {
    init_test_tracing();
    let (server, source) = sample_source(Dialect::PostgreSQL);
    let cache = TableCache::new(
        "tables of public",
        "columns",
        source,
        fetcher,
        Arc::new(GenericColumnFetcher),
        config,
    );
    (server, cache, Schema::new("public"))
}

fn setup(config: CacheConfig) -> (MockServer, TableCache, Schema) {
    setup_with(config, Arc::new(GenericTableFetcher::new()))
}

async fn column_names(cache: &TableCache, schema: &Schema, table: &Table) -> Vec<String> {
    cache
        .get_children(&NullProgressMonitor, schema, table)
        .await
        .unwrap()
        .iter()
        .map(|c| c.name.clone())
        .collect()
}

async fn table(cache: &TableCache, schema: &Schema, name: &str) -> Arc<Table> {
    cache
        .get_object(&NullProgressMonitor, schema, name)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_columns_in_server_order_with_case_folding() {
    let (_server, cache, schema) = setup(CacheConfig::default());
    let t = table(&cache, &schema, "T").await;

    let columns = cache
        .get_children(&NullProgressMonitor, &schema, &t)
        .await
        .unwrap();
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(columns[1].max_length, Some(50));

    let b = cache
        .get_child(&NullProgressMonitor, &schema, &t, "b")
        .await
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&b, &columns[1]));
}

#[tokio::test]
async fn test_case_sensitive_child_lookup() {
    let (_server, cache, schema) = setup(CacheConfig::default().with_case_sensitive(true));
    let t = table(&cache, &schema, "T").await;

    let missing = cache
        .get_child(&NullProgressMonitor, &schema, &t, "b")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_children_loaded_once_per_table() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let orders = table(&cache, &schema, "orders").await;

    let first = cache
        .get_children(&NullProgressMonitor, &schema, &orders)
        .await
        .unwrap();
    let second = cache
        .get_children(&NullProgressMonitor, &schema, &orders)
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(server.queries_matching(COLUMNS), 1);
    assert!(cache.is_children_cached(&orders));
}

#[tokio::test]
async fn test_bulk_children_load_uses_one_query() {
    let (server, cache, schema) = setup(CacheConfig::default());

    cache
        .load_children(&NullProgressMonitor, &schema)
        .await
        .unwrap();
    assert_eq!(server.queries_matching(COLUMNS), 1);

    for t in cache.cached_objects().iter() {
        assert!(cache.is_children_cached(t), "{} not cached", t.name);
    }
    let orders = table(&cache, &schema, "orders").await;
    let columns = cache
        .get_children(&NullProgressMonitor, &schema, &orders)
        .await
        .unwrap();
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[2].precision, Some(10));
    assert_eq!(columns[2].scale, Some(2));
    assert_eq!(server.queries_matching(COLUMNS), 1);
}

#[tokio::test]
async fn test_remove_clears_nested_cache() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let t = table(&cache, &schema, "T").await;
    cache
        .get_children(&NullProgressMonitor, &schema, &t)
        .await
        .unwrap();

    cache.remove_object("T");
    assert!(!cache.is_children_cached(&t));

    let fresh = cache.get_children_cache(&t);
    assert_eq!(fresh.load_state(), LoadState::NotLoaded);
    assert_eq!(fresh.object_count(), 0);

    cache
        .get_children(&NullProgressMonitor, &schema, &t)
        .await
        .unwrap();
    assert_eq!(server.queries_matching(COLUMNS), 2);
}

#[tokio::test]
async fn test_refresh_without_lookup_query_drops_children_of_other_tables() {
    let (server, cache, schema) = setup_with(
        CacheConfig::default(),
        Arc::new(ListOnlyTables(GenericTableFetcher::new())),
    );
    let t = table(&cache, &schema, "T").await;
    let orders = table(&cache, &schema, "orders").await;
    assert_eq!(column_names(&cache, &schema, &orders).await.len(), 4);

    server.drop_table("public", "orders");
    cache
        .refresh_object(&NullProgressMonitor, &schema, &t)
        .await
        .unwrap();
    assert!(cache.cached_object("orders").is_none());
    assert!(!cache.is_children_cached(&orders));

    server.add_table("public", MockTable::new("orders").columns(&[("z", "int")]));
    cache
        .refresh_object(&NullProgressMonitor, &schema, &t)
        .await
        .unwrap();
    let recreated = cache.cached_object("orders").unwrap();
    assert_eq!(column_names(&cache, &schema, &recreated).await, vec!["z"]);
    assert_eq!(server.queries_matching(COLUMNS), 2);
}

#[tokio::test]
async fn test_full_load_after_lookups_drops_children_of_discarded_tables() {
    let (server, cache, schema) = setup(CacheConfig::default().with_lookup(true));
    let orders = table(&cache, &schema, "orders").await;
    let customers = table(&cache, &schema, "customers").await;
    column_names(&cache, &schema, &orders).await;
    column_names(&cache, &schema, &customers).await;
    assert!(!cache.is_fully_cached());

    server
        .drop_table("public", "customers")
        .add_table("public", MockTable::view("orders").columns(&[("z", "int")]));
    cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();

    assert!(!cache.is_children_cached(&customers));
    assert!(!cache.is_children_cached(&orders));
    let reloaded = cache.cached_object("orders").unwrap();
    assert!(!Arc::ptr_eq(&orders, &reloaded));
    assert_eq!(column_names(&cache, &schema, &reloaded).await, vec!["z"]);
}

#[tokio::test]
async fn test_refresh_object_drops_children() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let t = table(&cache, &schema, "T").await;
    cache
        .get_children(&NullProgressMonitor, &schema, &t)
        .await
        .unwrap();

    server.add_table("public", MockTable::new("T").columns(&[("A", "int")]));
    let fresh = cache
        .refresh_object(&NullProgressMonitor, &schema, &t)
        .await
        .unwrap()
        .unwrap();
    assert!(!cache.is_children_cached(&fresh));

    let columns = cache
        .get_children(&NullProgressMonitor, &schema, &fresh)
        .await
        .unwrap();
    assert_eq!(columns.len(), 1);
}

#[tokio::test]
async fn test_new_object_gets_loaded_empty_children() {
    let (server, cache, schema) = setup(CacheConfig::default());
    cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();

    let draft = Arc::new(Table::new_unpersisted(&ObjectPath::new(["public"]), "draft"));
    cache.cache_object(draft.clone());

    assert!(cache.is_children_cached(&draft));
    let columns = cache
        .get_children(&NullProgressMonitor, &schema, &draft)
        .await
        .unwrap();
    assert!(columns.is_empty());
    assert_eq!(server.queries_matching(COLUMNS), 0);
}

#[tokio::test]
async fn test_rename_moves_and_reparents_children() {
    let (_server, cache, schema) = setup(CacheConfig::default());
    let orders = table(&cache, &schema, "orders").await;
    cache
        .get_children(&NullProgressMonitor, &schema, &orders)
        .await
        .unwrap();

    let mut renamed = (*orders).clone();
    renamed.set_name("purchase_orders".to_string());
    let renamed = Arc::new(renamed);
    assert!(cache.replace_object("orders", renamed.clone()));
    assert_eq!(cache.position_of("purchase_orders"), Some(1));

    assert!(cache.is_children_cached(&renamed));
    let columns: Vec<Arc<Column>> = cache.get_children_cache(&renamed).cached_objects().to_vec();
    assert_eq!(columns.len(), 4);
    for column in &columns {
        assert_eq!(
            column.parent(),
            &ObjectPath::new(["public", "purchase_orders"])
        );
    }
    assert!(!cache.is_children_cached(&orders));
}
