// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Platform against mock servers: startup from YAML, data-source registry,
//! catalog events and DDL sessions

use sqlmeta_cache::{
    CatalogError, CatalogResult, DataSource, EventAction, NullProgressMonitor, ObjectContainer,
};
use sqlmeta_edit::ObjectCommand;
use sqlmeta_model::{CatalogObject, Column, Dialect, ObjectKind, Table};
use sqlmeta_platform::{
    ConfigError, DataSourceConfig, DriverRegistry, Platform, PlatformConfig, PlatformError,
};
use sqlmeta_test_utils::{MockServer, sample_server};
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;

const CONFIG: &str = r#"
log_filter: "warn"
cache:
  sort_by_name: false
data_sources:
  - id: warehouse
    name: Warehouse
    dialect: postgresql
    default_schema: public
  - id: shop
    name: Shop
    dialect: mysql
"#;

fn drivers(server: &MockServer) -> DriverRegistry {
    let connect = |server: MockServer| {
        move |config: &DataSourceConfig| -> CatalogResult<Arc<dyn DataSource>> {
            let source: Arc<dyn DataSource> = server.data_source(&config.name, config.dialect);
            Ok(source)
        }
    };
    DriverRegistry::new()
        .with_driver(Dialect::PostgreSQL, connect(server.clone()))
        .with_driver(Dialect::MySQL, connect(server.clone()))
}

fn platform() -> (MockServer, Platform) {
    let server = sample_server();
    let config = PlatformConfig::from_yaml(CONFIG).unwrap();
    let platform = Platform::init(config, drivers(&server)).unwrap();
    (server, platform)
}

#[tokio::test]
async fn test_init_registers_configured_sources_in_order() {
    let (_server, platform) = platform();
    assert!(platform.is_running());
    assert_eq!(platform.data_source_ids(), vec!["warehouse", "shop"]);

    let warehouse = platform.data_source("warehouse").unwrap();
    assert_eq!(warehouse.dialect(), Dialect::PostgreSQL);
    assert_eq!(warehouse.data_source().name(), "Warehouse");

    let schema = warehouse.default_schema(&NullProgressMonitor).await.unwrap();
    assert_eq!(schema.name(), "public");

    let shop = platform.data_source("shop").unwrap();
    let err = shop.default_schema(&NullProgressMonitor).await.unwrap_err();
    assert!(matches!(
        err,
        PlatformError::Catalog(CatalogError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_missing_driver_fails_init() {
    let server = sample_server();
    let config = PlatformConfig::from_yaml(CONFIG).unwrap();
    let only_pg = DriverRegistry::new().with_driver(
        Dialect::PostgreSQL,
        move |config: &DataSourceConfig| -> CatalogResult<Arc<dyn DataSource>> {
            let source: Arc<dyn DataSource> = server.data_source(&config.name, config.dialect);
            Ok(source)
        },
    );

    let err = Platform::init(config, only_pg).err().unwrap();
    assert!(matches!(err, PlatformError::NoDriver(Dialect::MySQL)));
}

#[tokio::test]
async fn test_registry_errors() {
    let (_server, platform) = platform();

    let err = platform
        .register_data_source(DataSourceConfig::new("shop", "Again", Dialect::MySQL))
        .err()
        .unwrap();
    assert!(matches!(err, PlatformError::Config(ConfigError::DuplicateId(id)) if id == "shop"));

    let err = platform.data_source("nope").err().unwrap();
    assert_eq!(err.to_string(), "Unknown data source 'nope'");

    let err = platform
        .register_data_source(DataSourceConfig::new("legacy", "Legacy", Dialect::Generic))
        .err()
        .unwrap();
    assert!(matches!(err, PlatformError::NoDriver(Dialect::Generic)));
    assert_eq!(platform.data_source_ids().len(), 2);
}

#[tokio::test]
async fn test_add_and_remove_data_source() {
    let (server, platform) = platform();
    let reporting = platform
        .register_data_source(
            DataSourceConfig::new("reporting", "Reporting", Dialect::PostgreSQL)
                .with_default_schema("audit"),
        )
        .unwrap();
    let audit = reporting.default_schema(&NullProgressMonitor).await.unwrap();
    assert_eq!(audit.name(), "audit");

    let removed = platform.remove_data_source("reporting").unwrap();
    assert!(Arc::ptr_eq(&removed, &reporting));
    assert!(removed.catalog().schema_cache().cached_objects().is_empty());
    assert!(platform.data_source("reporting").is_err());
    assert!(platform.remove_data_source("reporting").is_err());

    server.reset_log();
    platform.preload_schemas().await.unwrap();
    assert_eq!(server.query_count(), 2);
}

#[tokio::test]
async fn test_ddl_session_events_reach_subscribers() {
    let (server, platform) = platform();
    let warehouse = platform.data_source("warehouse").unwrap();
    let monitor = NullProgressMonitor;
    let schema = warehouse.default_schema(&monitor).await.unwrap();
    let tables = warehouse.catalog().table_cache(&schema);
    tables.get_objects(&monitor, &schema).await.unwrap();

    let mut events = platform.subscribe();
    let mut context = warehouse.open_context();
    let create = ObjectCommand::create(
        tables.clone(),
        warehouse.table_editor(&schema),
        Table::new(&schema.path(), "ledger"),
    )
    .unwrap();
    context.execute_command(create).unwrap();

    let ledger = tables.cached_object("ledger").unwrap();
    let add_column = ObjectCommand::create(
        tables.get_children_cache(&ledger),
        warehouse.column_editor(),
        Column::new(&ledger.path(), "id", "bigint"),
    )
    .unwrap();
    context.execute_command(add_column).unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.action, EventAction::Add);
    assert_eq!(event.kind, ObjectKind::Table);
    assert_eq!(event.path, ledger.path());
    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, ObjectKind::Column);

    let report = context.persist(&monitor).await.unwrap();
    assert_eq!(
        report.scripts(),
        vec!["CREATE TABLE public.ledger (\n    id bigint\n)"]
    );
    assert_eq!(server.update_log(), report.scripts());
    assert!(tables.cached_object("ledger").unwrap().persisted);
}

#[tokio::test]
async fn test_shutdown_releases_sources() {
    let (_server, platform) = platform();
    let mut events = platform.subscribe();
    let warehouse = platform.data_source("warehouse").unwrap();
    warehouse
        .catalog()
        .schema_cache()
        .get_objects(&NullProgressMonitor, warehouse.catalog().database())
        .await
        .unwrap();

    platform.shutdown();
    assert!(!platform.is_running());
    assert!(platform.data_source_ids().is_empty());
    assert!(warehouse.catalog().schema_cache().cached_objects().is_empty());
    assert!(matches!(
        platform.data_source("warehouse"),
        Err(PlatformError::ShutDown)
    ));
    assert!(matches!(
        platform.register_data_source(DataSourceConfig::new("x", "X", Dialect::PostgreSQL)),
        Err(PlatformError::ShutDown)
    ));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // second call is a no-op
    platform.shutdown();
}
