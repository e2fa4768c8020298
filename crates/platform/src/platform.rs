// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Platform context
//!
//! Owns everything that would otherwise be process-global: the
//! configuration, the registered data sources with their catalogs, and the
//! event bus all caches report to.
//!
//! ## Lifecycle
//!
//! 1. [`Platform::init`] validates the configuration, installs tracing and
//!    connects every configured data source through the [`DriverRegistry`]
//! 2. Data sources can be added and removed while running
//! 3. [`Platform::shutdown`] drops all caches; later calls fail with
//!    [`PlatformError::ShutDown`]

use crate::config::{DataSourceConfig, PlatformConfig};
use crate::error::{PlatformError, PlatformResult};
use crate::events::EventBus;
use crate::logging::init_tracing;
use indexmap::IndexMap;
use parking_lot::RwLock;
use sqlmeta_cache::{
    CachedCatalog, CatalogError, CatalogResult, DataSource, NullProgressMonitor, ProgressMonitor,
    SharedEventSink,
};
use sqlmeta_edit::{
    ColumnEditor, CommandContext, EditConfig, IndexEditor, ObjectEditor, ObjectManager, TableEditor,
};
use sqlmeta_model::{Column, Dialect, Index, Schema, Table};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Connects a configured data source
pub trait DataSourceDriver: Send + Sync {
    fn connect(&self, config: &DataSourceConfig) -> CatalogResult<Arc<dyn DataSource>>;
}

impl<F> DataSourceDriver for F
where
    F: Fn(&DataSourceConfig) -> CatalogResult<Arc<dyn DataSource>> + Send + Sync,
{
    fn connect(&self, config: &DataSourceConfig) -> CatalogResult<Arc<dyn DataSource>> {
        self(config)
    }
}

/// Drivers by dialect
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<Dialect, Arc<dyn DataSourceDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: handle `dialect` with `driver`
    pub fn with_driver(mut self, dialect: Dialect, driver: impl DataSourceDriver + 'static) -> Self {
        self.register(dialect, driver);
        self
    }

    pub fn register(&mut self, dialect: Dialect, driver: impl DataSourceDriver + 'static) {
        self.drivers.insert(dialect, Arc::new(driver));
    }

    pub fn driver(&self, dialect: Dialect) -> Option<&Arc<dyn DataSourceDriver>> {
        self.drivers.get(&dialect)
    }
}

/// A registered data source with its catalog and DDL executor
pub struct DataSourceHandle {
    config: DataSourceConfig,
    source: Arc<dyn DataSource>,
    catalog: Arc<CachedCatalog>,
    manager: Arc<ObjectManager>,
    edit_config: EditConfig,
}

impl DataSourceHandle {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub fn catalog(&self) -> &Arc<CachedCatalog> {
        &self.catalog
    }

    /// Fresh edit session sharing this data source's caches
    pub fn open_context(&self) -> CommandContext {
        CommandContext::new(self.manager.clone(), self.edit_config)
    }

    /// The configured default schema
    pub async fn default_schema(&self, monitor: &dyn ProgressMonitor) -> PlatformResult<Arc<Schema>> {
        let name = self.config.default_schema.as_deref().ok_or_else(|| {
            CatalogError::Configuration(format!(
                "data source '{}' has no default schema",
                self.config.id
            ))
        })?;
        Ok(self.catalog.require_schema(monitor, name).await?)
    }

    pub fn table_editor(&self, schema: &Schema) -> Arc<dyn ObjectEditor<Table>> {
        Arc::new(TableEditor::new(self.dialect(), self.catalog.table_cache(schema)))
    }

    pub fn column_editor(&self) -> Arc<dyn ObjectEditor<Column>> {
        Arc::new(ColumnEditor::new(self.dialect()))
    }

    pub fn index_editor(&self) -> Arc<dyn ObjectEditor<Index>> {
        Arc::new(IndexEditor::new(self.dialect()))
    }
}

/// Explicit application context
pub struct Platform {
    config: PlatformConfig,
    drivers: DriverRegistry,
    events: Arc<EventBus>,
    sources: RwLock<IndexMap<String, Arc<DataSourceHandle>>>,
    running: AtomicBool,
}

impl Platform {
    /// Validate `config` and connect its data sources
    pub fn init(config: PlatformConfig, drivers: DriverRegistry) -> PlatformResult<Self> {
        config.validate()?;
        if !init_tracing(config.log_filter.as_deref()) {
            debug!("Tracing subscriber already installed");
        }

        let platform = Self {
            drivers,
            events: Arc::new(EventBus::default()),
            sources: RwLock::new(IndexMap::new()),
            running: AtomicBool::new(true),
            config,
        };
        for source in platform.config.data_sources.clone() {
            platform.register_data_source(source)?;
        }
        info!(
            "Platform initialised with {} data source(s)",
            platform.sources.read().len()
        );
        Ok(platform)
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Receive catalog events of every registered data source
    pub fn subscribe(&self) -> broadcast::Receiver<sqlmeta_cache::CatalogEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> PlatformResult<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(PlatformError::ShutDown)
        }
    }

    /// Connect and register a data source
    pub fn register_data_source(
        &self,
        config: DataSourceConfig,
    ) -> PlatformResult<Arc<DataSourceHandle>> {
        self.ensure_running()?;
        config.validate()?;
        if self.sources.read().contains_key(&config.id) {
            return Err(crate::config::ConfigError::DuplicateId(config.id).into());
        }

        let driver = self
            .drivers
            .driver(config.dialect)
            .ok_or(PlatformError::NoDriver(config.dialect))?;
        let source = driver.connect(&config)?;
        let sink: SharedEventSink = self.events.clone();
        let catalog = CachedCatalog::new(source.clone(), config.cache_config(self.config.cache))
            .with_events(Some(sink));
        let handle = Arc::new(DataSourceHandle {
            manager: Arc::new(ObjectManager::new(source.clone())),
            catalog: Arc::new(catalog),
            edit_config: self.config.edit,
            source,
            config,
        });

        let mut sources = self.sources.write();
        if sources.contains_key(handle.id()) {
            return Err(crate::config::ConfigError::DuplicateId(handle.id().to_string()).into());
        }
        sources.insert(handle.id().to_string(), handle.clone());
        info!("Registered data source '{}' ({:?})", handle.id(), handle.dialect());
        Ok(handle)
    }

    pub fn data_source(&self, id: &str) -> PlatformResult<Arc<DataSourceHandle>> {
        self.ensure_running()?;
        self.sources
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| crate::config::ConfigError::UnknownDataSource(id.to_string()).into())
    }

    /// Registered ids in registration order
    pub fn data_source_ids(&self) -> Vec<String> {
        self.sources.read().keys().cloned().collect()
    }

    /// Unregister a data source and drop its caches
    pub fn remove_data_source(&self, id: &str) -> PlatformResult<Arc<DataSourceHandle>> {
        self.ensure_running()?;
        let handle = self
            .sources
            .write()
            .shift_remove(id)
            .ok_or_else(|| crate::config::ConfigError::UnknownDataSource(id.to_string()))?;
        handle.catalog.invalidate();
        info!("Removed data source '{}'", id);
        Ok(handle)
    }

    /// Warm the schema cache of every data source
    pub async fn preload_schemas(&self) -> PlatformResult<()> {
        let handles: Vec<_> = self.sources.read().values().cloned().collect();
        for handle in handles {
            handle
                .catalog
                .schema_cache()
                .get_objects(&NullProgressMonitor, handle.catalog.database())
                .await?;
        }
        Ok(())
    }

    /// Drop every data source; the platform cannot be used afterwards
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handles: Vec<_> = self.sources.write().drain(..).map(|(_, h)| h).collect();
        for handle in &handles {
            handle.catalog.invalidate();
        }
        info!("Platform shut down, released {} data source(s)", handles.len());
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.shutdown();
    }
}
