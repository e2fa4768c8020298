// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Object cache
//!
//! [`ObjectCache`] pairs an [`ObjectStore`] with the strategy that reads a
//! container's children from the server ([`ObjectFetcher`]). One cache
//! instance serves one owner (e.g. the table cache of one schema); the owner
//! is passed to every loading call so the fetcher can bind it into its query.
//!
//! ## Loading
//!
//! 1. Open a metadata session on the data source
//! 2. Run the fetcher's list query
//! 3. Convert each row with [`ObjectFetcher::fetch_object`], dropping rows the
//!    fetcher skips or [`ObjectFetcher::accept`] rejects
//! 4. Optionally sort by name, then publish atomically
//!
//! The monitor is polled before every row; cancellation leaves the cache
//! unloaded and surfaces [`CatalogError::Canceled`].

use crate::config::CacheConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::event::SharedEventSink;
use crate::monitor::{ProgressMonitor, check_canceled};
use crate::row::Row;
use crate::session::{DataSource, MetaQuery, ScopedStatement, SessionPurpose};
use crate::store::{
    DiscardListener, LoadState, ObjectContainer, ObjectList, ObjectStore, RefreshDiff,
};
use sqlmeta_model::CatalogObject;
use std::sync::Arc;
use tracing::{debug, trace};

/// Vendor strategy turning metadata rows into catalog objects
pub trait ObjectFetcher<O, T>: Send + Sync {
    /// Query listing every child of `owner`
    fn objects_query(&self, owner: &O) -> MetaQuery;

    /// Query returning the single child named `name`, when the catalog
    /// supports it
    fn object_query(&self, _owner: &O, _name: &str) -> Option<MetaQuery> {
        None
    }

    /// Convert one row; `Ok(None)` skips the row
    fn fetch_object(&self, owner: &O, row: &Row) -> CatalogResult<Option<T>>;

    /// Filter applied after conversion
    fn accept(&self, _owner: &O, _object: &T) -> bool {
        true
    }
}

/// Run `query` and convert every row, honouring cancellation
pub(crate) async fn read_rows<X, F>(
    source: &dyn DataSource,
    monitor: &dyn ProgressMonitor,
    task: &str,
    query: &MetaQuery,
    mut convert: F,
) -> CatalogResult<Vec<X>>
where
    F: FnMut(&Row) -> CatalogResult<Option<X>>,
{
    check_canceled(monitor)?;
    monitor.begin_task(task, 0);
    let result = collect_rows(source, monitor, task, query, &mut convert).await;
    monitor.done();
    if let Ok(objects) = &result {
        trace!("{}: {} objects read", task, objects.len());
    }
    result
}

async fn collect_rows<X, F>(
    source: &dyn DataSource,
    monitor: &dyn ProgressMonitor,
    task: &str,
    query: &MetaQuery,
    convert: &mut F,
) -> CatalogResult<Vec<X>>
where
    F: FnMut(&Row) -> CatalogResult<Option<X>>,
{
    let session = source
        .open_session(SessionPurpose::Meta)
        .await
        .map_err(|e| CatalogError::data_access(format!("{task}: open session"), e))?;
    let mut stmt = ScopedStatement::prepare_query(session.as_ref(), query)
        .await
        .map_err(|e| CatalogError::data_access(task, e))?;
    let mut cursor = stmt
        .execute_query()
        .await
        .map_err(|e| CatalogError::data_access(task, e))?;

    let mut objects = Vec::new();
    loop {
        check_canceled(monitor)?;
        let Some(row) = cursor
            .next_row()
            .await
            .map_err(|e| CatalogError::data_access(task, e))?
        else {
            break;
        };
        if let Some(object) = convert(&row)? {
            objects.push(object);
        }
        monitor.worked(1);
    }
    Ok(objects)
}

/// Lazily loaded cache of one owner's children
pub struct ObjectCache<O, T> {
    store: ObjectStore<T>,
    fetcher: Arc<dyn ObjectFetcher<O, T>>,
    source: Arc<dyn DataSource>,
    config: CacheConfig,
}

impl<O, T> ObjectCache<O, T>
where
    O: Send + Sync,
    T: CatalogObject,
{
    pub fn new(
        label: impl Into<String>,
        source: Arc<dyn DataSource>,
        fetcher: Arc<dyn ObjectFetcher<O, T>>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store: ObjectStore::new(label, &config),
            fetcher,
            source,
            config,
        }
    }

    /// Builder method: deliver add/remove/update events to `sink`
    pub fn with_events(mut self, sink: Option<SharedEventSink>) -> Self {
        self.store = self.store.with_events(sink);
        self
    }

    /// Builder method: report objects dropped or replaced by loads and
    /// refreshes
    pub fn with_discard_listener(mut self, listener: Option<Arc<dyn DiscardListener<T>>>) -> Self {
        self.store = self.store.with_discard_listener(listener);
        self
    }

    pub fn store(&self) -> &ObjectStore<T> {
        &self.store
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub fn load_state(&self) -> LoadState {
        self.store.load_state()
    }

    pub fn is_fully_cached(&self) -> bool {
        self.store.is_fully_cached()
    }

    /// Change name comparison; set before the first load
    pub fn set_case_sensitive(&self, case_sensitive: bool) {
        self.store.set_case_sensitive(case_sensitive);
    }

    /// Content without triggering a load
    pub fn cached_objects(&self) -> ObjectList<T> {
        self.store.cached_objects()
    }

    /// All children of `owner`, loading them on first access
    pub async fn get_objects(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
    ) -> CatalogResult<ObjectList<T>> {
        self.store
            .load_with(|| self.load_objects(monitor, owner))
            .await
    }

    /// Child of `owner` named `name`
    ///
    /// With single-object lookups enabled and an unloaded cache, only the
    /// requested object is queried.
    pub async fn get_object(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
        name: &str,
    ) -> CatalogResult<Option<Arc<T>>> {
        if !self.store.is_fully_cached() && self.config.lookup_single_objects {
            if let Some(object) = self.store.cached_object(name) {
                return Ok(Some(object));
            }
            if let Some(query) = self.fetcher.object_query(owner, name) {
                debug!("Looking up '{}' in '{}'", name, self.store.label());
                let found = self.load_one(monitor, owner, &query).await?;
                return Ok(found.map(|object| self.store.cache_lookup_result(object)));
            }
        }
        self.get_objects(monitor, owner).await?;
        Ok(self.store.cached_object(name))
    }

    /// Re-read `old` from the server
    ///
    /// A not-yet-loaded cache is fully loaded instead. Otherwise the fresh
    /// object replaces the cached one at its position, or the cached one is
    /// removed when the server no longer has it.
    pub async fn refresh_object(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
        old: &T,
    ) -> CatalogResult<Option<Arc<T>>> {
        if !self.store.is_fully_cached() {
            self.get_objects(monitor, owner).await?;
            return Ok(self.store.cached_object(old.name()));
        }
        let Some(query) = self.fetcher.object_query(owner, old.name()) else {
            self.refresh_all(monitor, owner).await?;
            return Ok(self.store.cached_object(old.name()));
        };

        let fresh = self.load_one(monitor, owner, &query).await?;
        let current = self.store.cached_object(old.name());
        match (fresh, current) {
            (Some(fresh), Some(current)) if fresh == *current => Ok(Some(current)),
            (Some(fresh), current) => {
                let fresh = Arc::new(fresh);
                if !self.store.replace_object(old.name(), fresh.clone()) {
                    self.store.cache_object(fresh.clone());
                }
                if let Some(current) = current {
                    self.store.notify_discarded(&[current]);
                }
                Ok(Some(fresh))
            }
            (None, Some(current)) => {
                self.store.remove_object(current.name());
                self.store.notify_discarded(&[current]);
                Ok(None)
            }
            (None, None) => Ok(None),
        }
    }

    /// Differential reload of every child
    pub async fn refresh_all(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
    ) -> CatalogResult<RefreshDiff<T>> {
        self.store
            .refresh_with(|| self.load_objects(monitor, owner))
            .await
    }

    /// Forget everything; the next access reloads
    pub fn clear_cache(&self) {
        self.store.clear_cache();
    }

    async fn load_objects(&self, monitor: &dyn ProgressMonitor, owner: &O) -> CatalogResult<Vec<T>> {
        let query = self.fetcher.objects_query(owner);
        let task = format!("Load {}", self.store.label());
        let fetcher = self.fetcher.as_ref();
        let mut objects = read_rows(self.source.as_ref(), monitor, &task, &query, |row| {
            Ok(fetcher
                .fetch_object(owner, row)?
                .filter(|object| fetcher.accept(owner, object)))
        })
        .await?;

        if self.config.sort_by_name {
            objects.sort_by_key(|object| object.name().to_lowercase());
        }
        Ok(objects)
    }

    async fn load_one(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
        query: &MetaQuery,
    ) -> CatalogResult<Option<T>> {
        let task = format!("Look up object in {}", self.store.label());
        let fetcher = self.fetcher.as_ref();
        let objects = read_rows(self.source.as_ref(), monitor, &task, query, |row| {
            Ok(fetcher
                .fetch_object(owner, row)?
                .filter(|object| fetcher.accept(owner, object)))
        })
        .await?;
        Ok(objects.into_iter().next())
    }
}

impl<O, T> ObjectContainer<T> for ObjectCache<O, T>
where
    O: Send + Sync,
    T: CatalogObject,
{
    fn cached_object(&self, name: &str) -> Option<Arc<T>> {
        self.store.cached_object(name)
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.store.position_of(name)
    }

    fn cache_object(&self, object: Arc<T>) -> Option<Arc<T>> {
        self.store.cache_object(object)
    }

    fn insert_object_at(&self, index: usize, object: Arc<T>) {
        self.store.insert_object_at(index, object);
    }

    fn replace_object(&self, old_name: &str, object: Arc<T>) -> bool {
        self.store.replace_object(old_name, object)
    }

    fn remove_object(&self, name: &str) -> Option<Arc<T>> {
        self.store.remove_object(name)
    }
}
