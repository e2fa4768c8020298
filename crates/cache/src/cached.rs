// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Cache-backed catalog
//!
//! [`CachedCatalog`] wires the object caches of one data source into a
//! navigable tree:
//!
//! ```text
//! database
//!   └── schemas            ObjectCache<Database, Schema>
//!         └── tables       StructCache<Schema, Table, Column>   (one per schema)
//!               └── indexes ObjectCache<Table, Index>           (one per table)
//! ```
//!
//! Nested caches are created on first access and dropped when their owner is
//! refreshed, removed or invalidated. Index caches follow their table: the
//! table cache of each schema evicts or renames them as tables are dropped,
//! renamed or replaced by a reload.

use crate::config::CacheConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::event::SharedEventSink;
use crate::generic::{
    GenericColumnFetcher, GenericIndexFetcher, GenericSchemaFetcher, GenericTableFetcher,
};
use crate::monitor::ProgressMonitor;
use crate::object_cache::{ObjectCache, ObjectFetcher};
use crate::r#trait::Catalog;
use crate::session::DataSource;
use crate::store::{ObjectContainer, ObjectList, fold_name};
use crate::struct_cache::{ChildFetcher, DependentCache, StructCache};
use async_trait::async_trait;
use parking_lot::Mutex;
use sqlmeta_model::{CatalogObject, Column, Database, Index, Schema, Table};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Tables of one schema, each with its column cache
pub type TableCache = StructCache<Schema, Table, Column>;

/// Indexes of one table
pub type IndexCache = ObjectCache<Table, Index>;

type IndexCaches = Arc<Mutex<HashMap<String, Arc<IndexCache>>>>;

fn index_key(schema_key: &str, table: &str, case_sensitive: bool) -> String {
    format!("{}.{}", schema_key, fold_name(table, case_sensitive))
}

/// Index caches of one schema's tables
struct SchemaIndexes {
    schema_key: String,
    case_sensitive: bool,
    indexes: IndexCaches,
}

impl SchemaIndexes {
    fn key(&self, table: &str) -> String {
        index_key(&self.schema_key, table, self.case_sensitive)
    }
}

impl DependentCache<Table> for SchemaIndexes {
    fn evict(&self, name: &str) {
        if self.indexes.lock().remove(&self.key(name)).is_some() {
            debug!("Dropped index cache of '{}.{}'", self.schema_key, name);
        }
    }

    fn rename(&self, old_name: &str, renamed: &Table) {
        let moved = {
            let mut indexes = self.indexes.lock();
            let moved = indexes.remove(&self.key(old_name));
            indexes.remove(&self.key(renamed.name()));
            if let Some(cache) = &moved {
                indexes.insert(self.key(renamed.name()), cache.clone());
            }
            moved
        };
        if let Some(cache) = moved {
            let parent = renamed.path();
            for index in cache.cached_objects().iter() {
                let mut relocated = (**index).clone();
                relocated.set_parent(parent.clone());
                cache.replace_object(index.name(), Arc::new(relocated));
            }
        }
    }

    fn clear(&self) {
        let prefix = format!("{}.", self.schema_key);
        self.indexes.lock().retain(|key, _| !key.starts_with(&prefix));
    }
}

/// Catalog of one data source served from lazily loaded caches
pub struct CachedCatalog {
    database: Database,
    source: Arc<dyn DataSource>,
    config: CacheConfig,
    events: Option<SharedEventSink>,
    schemas: ObjectCache<Database, Schema>,
    tables: Mutex<HashMap<String, Arc<TableCache>>>,
    indexes: IndexCaches,
    table_fetcher: Arc<dyn ObjectFetcher<Schema, Table>>,
    column_fetcher: Arc<dyn ChildFetcher<Schema, Table, Column>>,
    index_fetcher: Arc<dyn ObjectFetcher<Table, Index>>,
}

impl CachedCatalog {
    /// Catalog reading the standard `information_schema` views
    pub fn new(source: Arc<dyn DataSource>, config: CacheConfig) -> Self {
        let dialect = source.dialect();
        let database = Database::new(source.name());
        Self {
            schemas: ObjectCache::new(
                "schemas",
                source.clone(),
                Arc::new(GenericSchemaFetcher),
                config,
            ),
            database,
            source,
            config,
            events: None,
            tables: Mutex::new(HashMap::new()),
            indexes: Arc::new(Mutex::new(HashMap::new())),
            table_fetcher: Arc::new(GenericTableFetcher::new()),
            column_fetcher: Arc::new(GenericColumnFetcher),
            index_fetcher: Arc::new(GenericIndexFetcher::new(dialect)),
        }
    }

    /// Builder method: deliver cache events to `sink`
    pub fn with_events(mut self, sink: Option<SharedEventSink>) -> Self {
        self.schemas = self.schemas.with_events(sink.clone());
        self.events = sink;
        self
    }

    /// Builder method: replace the table and column fetchers
    pub fn with_table_fetchers(
        mut self,
        tables: Arc<dyn ObjectFetcher<Schema, Table>>,
        columns: Arc<dyn ChildFetcher<Schema, Table, Column>>,
    ) -> Self {
        self.table_fetcher = tables;
        self.column_fetcher = columns;
        self
    }

    /// Builder method: replace the index fetcher
    pub fn with_index_fetcher(mut self, indexes: Arc<dyn ObjectFetcher<Table, Index>>) -> Self {
        self.index_fetcher = indexes;
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn schema_cache(&self) -> &ObjectCache<Database, Schema> {
        &self.schemas
    }

    /// Table cache of `schema`, created on first access
    pub fn table_cache(&self, schema: &Schema) -> Arc<TableCache> {
        let key = self.schema_key(schema.name());
        self.tables
            .lock()
            .entry(key.clone())
            .or_insert_with(|| {
                let indexes = SchemaIndexes {
                    schema_key: key,
                    case_sensitive: self.config.case_sensitive,
                    indexes: self.indexes.clone(),
                };
                Arc::new(
                    TableCache::new(
                        format!("tables of {}", schema.name()),
                        "columns",
                        self.source.clone(),
                        self.table_fetcher.clone(),
                        self.column_fetcher.clone(),
                        self.config,
                    )
                    .with_events(self.events.clone())
                    .with_dependent(Arc::new(indexes)),
                )
            })
            .clone()
    }

    /// Index cache of `table`, created on first access
    pub fn index_cache(&self, table: &Table) -> Arc<IndexCache> {
        let key = self.index_key(table.schema_name().unwrap_or_default(), table.name());
        self.indexes
            .lock()
            .entry(key)
            .or_insert_with(|| {
                let cache = IndexCache::new(
                    format!("indexes of {}", table.path()),
                    self.source.clone(),
                    self.index_fetcher.clone(),
                    self.config,
                )
                .with_events(self.events.clone());
                if !table.is_persisted() {
                    cache.store().set_cache(Vec::new());
                }
                Arc::new(cache)
            })
            .clone()
    }

    /// Schema named `name` or `ObjectNotFound`
    pub async fn require_schema(
        &self,
        monitor: &dyn ProgressMonitor,
        name: &str,
    ) -> CatalogResult<Arc<Schema>> {
        self.schemas
            .get_object(monitor, &self.database, name)
            .await?
            .ok_or_else(|| CatalogError::not_found("schema", name))
    }

    /// Re-read one table, dropping its column and index caches
    ///
    /// Returns the fresh table, or `None` if it no longer exists.
    pub async fn refresh_table(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
        table: &str,
    ) -> CatalogResult<Option<Arc<Table>>> {
        let owner = self.require_schema(monitor, schema).await?;
        let tables = self.table_cache(&owner);
        self.indexes.lock().remove(&self.index_key(schema, table));

        let fresh = match tables.objects().cached_object(table) {
            Some(old) => tables.refresh_object(monitor, &owner, &old).await?,
            None => tables.get_object(monitor, &owner, table).await?,
        };
        debug!("Refreshed table {}.{}", schema, table);
        Ok(fresh)
    }

    /// Drop the caches below `schema`
    pub fn invalidate_schema(&self, schema: &str) {
        let key = self.schema_key(schema);
        self.tables.lock().remove(&key);
        let prefix = format!("{key}.");
        self.indexes.lock().retain(|k, _| !k.starts_with(&prefix));
        debug!("Invalidated caches of schema '{}'", schema);
    }

    /// Forget everything; the next access reloads from the server
    pub fn invalidate(&self) {
        self.schemas.clear_cache();
        self.tables.lock().clear();
        self.indexes.lock().clear();
        info!("Invalidated catalog of '{}'", self.source.name());
    }

    async fn require_table(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
        table: &str,
    ) -> CatalogResult<(Arc<Schema>, Arc<TableCache>, Arc<Table>)> {
        let owner = self.require_schema(monitor, schema).await?;
        let tables = self.table_cache(&owner);
        let found = tables
            .get_object(monitor, &owner, table)
            .await?
            .ok_or_else(|| CatalogError::not_found("table", format!("{schema}.{table}")))?;
        Ok((owner, tables, found))
    }

    fn schema_key(&self, schema: &str) -> String {
        fold_name(schema, self.config.case_sensitive)
    }

    fn index_key(&self, schema: &str, table: &str) -> String {
        index_key(&self.schema_key(schema), table, self.config.case_sensitive)
    }
}

#[async_trait]
impl Catalog for CachedCatalog {
    async fn list_schemas(&self, monitor: &dyn ProgressMonitor) -> CatalogResult<ObjectList<Schema>> {
        self.schemas.get_objects(monitor, &self.database).await
    }

    async fn list_tables(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
    ) -> CatalogResult<ObjectList<Table>> {
        let owner = self.require_schema(monitor, schema).await?;
        self.table_cache(&owner).get_objects(monitor, &owner).await
    }

    async fn get_table(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
        table: &str,
    ) -> CatalogResult<Option<Arc<Table>>> {
        let owner = self.require_schema(monitor, schema).await?;
        self.table_cache(&owner)
            .get_object(monitor, &owner, table)
            .await
    }

    async fn get_columns(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
        table: &str,
    ) -> CatalogResult<ObjectList<Column>> {
        let (owner, tables, found) = self.require_table(monitor, schema, table).await?;
        tables.get_children(monitor, &owner, &found).await
    }

    async fn get_indexes(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
        table: &str,
    ) -> CatalogResult<ObjectList<Index>> {
        let (_, _, found) = self.require_table(monitor, schema, table).await?;
        self.index_cache(&found).get_objects(monitor, &found).await
    }
}
