// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Object cache behaviour against the mock metadata server

use sqlmeta_cache::{
    CacheConfig, CancelableMonitor, CatalogError, DataSource, DriverError, EventAction,
    GenericTableFetcher, LoadState, NullProgressMonitor, ObjectCache, ObjectContainer,
    SharedEventSink,
};
use sqlmeta_model::{Dialect, Schema, Table, TableType};
use sqlmeta_test_utils::{
    CancelAfterWork, MockServer, MockTable, RecordingSink, init_test_tracing, sample_source,
};
use std::sync::Arc;
use std::time::Duration;

const TABLES: &str = "information_schema.tables";

fn table_cache(source: Arc<dyn DataSource>, config: CacheConfig) -> ObjectCache<Schema, Table> {
    ObjectCache::new(
        "tables of public",
        source,
        Arc::new(GenericTableFetcher::new()),
        config,
    )
}

fn setup(config: CacheConfig) -> (MockServer, ObjectCache<Schema, Table>, Schema) {
    init_test_tracing();
    let (server, source) = sample_source(Dialect::PostgreSQL);
    (server, table_cache(source, config), Schema::new("public"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_load() {
    let (server, cache, schema) = setup(CacheConfig::default());
    server.set_latency(Duration::from_millis(50));
    let cache = Arc::new(cache);
    let schema = Arc::new(schema);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let schema = schema.clone();
        handles.push(tokio::spawn(async move {
            cache.get_objects(&NullProgressMonitor, &schema).await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(server.queries_matching(TABLES), 1);
    let first = &results[0];
    assert_eq!(first.len(), 4);
    for list in &results[1..] {
        assert!(Arc::ptr_eq(first, list));
    }
    assert_eq!(cache.load_state(), LoadState::Loaded);
}

#[tokio::test]
async fn test_snapshot_stable_until_mutation() {
    let (server, cache, schema) = setup(CacheConfig::default());

    let first = cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    let second = cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(server.query_count(), 1);

    cache.cache_object(Arc::new(Table::new_unpersisted(&schema_path(), "draft")));
    let third = cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.len(), 5);
    // the earlier snapshot is unaffected
    assert_eq!(first.len(), 4);
}

fn schema_path() -> sqlmeta_model::ObjectPath {
    sqlmeta_model::ObjectPath::new(["public"])
}

#[tokio::test]
async fn test_case_insensitive_lookup() {
    let (_server, cache, schema) = setup(CacheConfig::default());

    let found = cache
        .get_object(&NullProgressMonitor, &schema, "ORDERS")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "orders");

    let t = cache
        .get_object(&NullProgressMonitor, &schema, "t")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(t.name, "T");
}

#[tokio::test]
async fn test_case_sensitive_lookup() {
    let (_server, cache, schema) = setup(CacheConfig::default().with_case_sensitive(true));

    assert!(
        cache
            .get_object(&NullProgressMonitor, &schema, "ORDERS")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        cache
            .get_object(&NullProgressMonitor, &schema, "orders")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_unknown_name_is_none_not_error() {
    let (_server, cache, schema) = setup(CacheConfig::default());
    let missing = cache
        .get_object(&NullProgressMonitor, &schema, "nope")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_server_order_and_sorting() {
    let (_server, cache, schema) = setup(CacheConfig::default());
    let names: Vec<_> = cache
        .get_objects(&NullProgressMonitor, &schema)
        .await
        .unwrap()
        .iter()
        .map(|t| t.name.clone())
        .collect();
    assert_eq!(names, vec!["T", "orders", "customers", "v_orders"]);

    let (_server, sorted, schema) = setup(CacheConfig::default().with_sort_by_name(true));
    let names: Vec<_> = sorted
        .get_objects(&NullProgressMonitor, &schema)
        .await
        .unwrap()
        .iter()
        .map(|t| t.name.clone())
        .collect();
    assert_eq!(names, vec!["customers", "orders", "T", "v_orders"]);
}

#[tokio::test]
async fn test_canceled_load_leaves_cache_unloaded() {
    let (server, cache, schema) = setup(CacheConfig::default());

    let monitor = CancelAfterWork::new(1);
    let err = cache.get_objects(&monitor, &schema).await.unwrap_err();
    assert!(matches!(err, CatalogError::Canceled));
    assert_eq!(cache.load_state(), LoadState::NotLoaded);
    assert!(cache.cached_objects().is_empty());

    // a later call retries from scratch
    let tables = cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    assert_eq!(tables.len(), 4);
    assert_eq!(server.queries_matching(TABLES), 2);
}

#[tokio::test]
async fn test_monitor_task_closed_on_cancel_and_error() {
    let (server, cache, schema) = setup(CacheConfig::default());

    let monitor = CancelAfterWork::new(1);
    cache.get_objects(&monitor, &schema).await.unwrap_err();
    assert_eq!(monitor.tasks_begun(), 1);
    assert_eq!(monitor.open_tasks(), 0);

    server.fail_on(TABLES, DriverError::new("permission denied"));
    let monitor = CancelAfterWork::new(u64::MAX);
    cache.get_objects(&monitor, &schema).await.unwrap_err();
    assert_eq!(monitor.tasks_begun(), 1);
    assert_eq!(monitor.open_tasks(), 0);
}

#[tokio::test]
async fn test_canceled_before_start_issues_no_query() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let monitor = CancelableMonitor::new();
    monitor.cancel();

    let err = cache.get_objects(&monitor, &schema).await.unwrap_err();
    assert!(err.is_canceled());
    assert_eq!(server.query_count(), 0);
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let (server, cache, schema) = setup(CacheConfig::default());
    server.fail_once(TABLES, DriverError::new("connection reset").with_sql_state("08006"));

    let err = cache.get_objects(&NullProgressMonitor, &schema).await.unwrap_err();
    let driver = err.driver_error().unwrap();
    assert_eq!(driver.sql_state.as_deref(), Some("08006"));
    assert!(matches!(cache.load_state(), LoadState::Failed(_)));
    assert!(!cache.is_fully_cached());

    let tables = cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    assert_eq!(tables.len(), 4);
    assert_eq!(server.statements_prepared(), server.statements_closed());
}

#[tokio::test]
async fn test_lookup_mode_caches_single_object() {
    let (server, cache, schema) = setup(CacheConfig::default().with_lookup(true));

    let orders = cache
        .get_object(&NullProgressMonitor, &schema, "orders")
        .await
        .unwrap()
        .unwrap();
    assert!(!cache.is_fully_cached());
    assert_eq!(server.queries_matching("table_name = ?"), 1);

    // second lookup is served from cache
    let again = cache
        .get_object(&NullProgressMonitor, &schema, "orders")
        .await
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&orders, &again));
    assert_eq!(server.query_count(), 1);

    // a full load keeps the looked-up instance
    let all = cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    assert!(cache.is_fully_cached());
    let from_list = all.iter().find(|t| t.name == "orders").unwrap();
    assert!(Arc::ptr_eq(&orders, from_list));
}

#[tokio::test]
async fn test_refresh_object_replaces_instance() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let old = cache
        .get_object(&NullProgressMonitor, &schema, "customers")
        .await
        .unwrap()
        .unwrap();

    server.add_table("public", MockTable::view("customers").columns(&[("id", "bigint")]));
    let fresh = cache
        .refresh_object(&NullProgressMonitor, &schema, &old)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fresh.table_type, TableType::View);
    assert!(!Arc::ptr_eq(&old, &fresh));
    let cached = cache.cached_object("customers").unwrap();
    assert!(Arc::ptr_eq(&fresh, &cached));
}

#[tokio::test]
async fn test_refresh_object_keeps_position_and_reports_update() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let recorder = Arc::new(RecordingSink::new());
    let sink: SharedEventSink = recorder.clone();
    let cache = cache.with_events(Some(sink));
    cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();

    server.add_table("public", MockTable::view("customers"));
    let old = cache.cached_object("customers").unwrap();
    let fresh = cache
        .refresh_object(&NullProgressMonitor, &schema, &old)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fresh.table_type, TableType::View);
    assert_eq!(cache.position_of("customers"), Some(2));
    assert_eq!(
        recorder.summary(),
        vec![(EventAction::Update, "public.customers".to_string())]
    );

    // unchanged objects keep their instance and stay silent
    recorder.clear();
    let t = cache.cached_object("T").unwrap();
    let same = cache
        .refresh_object(&NullProgressMonitor, &schema, &t)
        .await
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&t, &same));
    assert!(recorder.summary().is_empty());
}

#[tokio::test]
async fn test_refresh_object_of_dropped_table_removes_it() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let old = cache
        .get_object(&NullProgressMonitor, &schema, "orders")
        .await
        .unwrap()
        .unwrap();

    server.drop_table("public", "orders");
    let fresh = cache
        .refresh_object(&NullProgressMonitor, &schema, &old)
        .await
        .unwrap();
    assert!(fresh.is_none());
    assert!(cache.cached_object("orders").is_none());
}

#[tokio::test]
async fn test_refresh_object_on_unloaded_cache_loads_everything() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let wanted = Table::new(&schema_path(), "orders");

    let fresh = cache
        .refresh_object(&NullProgressMonitor, &schema, &wanted)
        .await
        .unwrap();
    assert!(fresh.is_some());
    assert!(cache.is_fully_cached());
    assert_eq!(server.queries_matching(TABLES), 1);
}

#[tokio::test]
async fn test_refresh_all_reports_differences() {
    let (server, cache, schema) = setup(CacheConfig::default());
    let recorder = Arc::new(RecordingSink::new());
    let sink: SharedEventSink = recorder.clone();
    let cache = cache.with_events(Some(sink));

    let before = cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    let t_before = before.iter().find(|t| t.name == "T").unwrap().clone();

    server
        .drop_table("public", "orders")
        .add_table("public", MockTable::view("customers"))
        .add_table("public", MockTable::new("invoices"));
    let diff = cache.refresh_all(&NullProgressMonitor, &schema).await.unwrap();

    assert_eq!(diff.added.len(), 1);
    assert_eq!(diff.added[0].name, "invoices");
    assert_eq!(diff.updated.len(), 1);
    assert_eq!(diff.updated[0].name, "customers");
    assert_eq!(diff.removed.len(), 1);
    assert_eq!(diff.removed[0].name, "orders");

    let t_after = cache.cached_object("T").unwrap();
    assert!(Arc::ptr_eq(&t_before, &t_after));
    assert_eq!(
        recorder.summary(),
        vec![
            (EventAction::Add, "public.invoices".to_string()),
            (EventAction::Update, "public.customers".to_string()),
            (EventAction::Remove, "public.orders".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_clear_cache_forces_reload() {
    let (server, cache, schema) = setup(CacheConfig::default());
    cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    cache.clear_cache();
    assert_eq!(cache.load_state(), LoadState::NotLoaded);

    cache.get_objects(&NullProgressMonitor, &schema).await.unwrap();
    assert_eq!(server.queries_matching(TABLES), 2);
}
