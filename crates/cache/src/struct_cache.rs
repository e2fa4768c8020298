// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Struct cache
//!
//! An object cache whose objects own a nested cache of their own children,
//! e.g. the tables of a schema, each with a column cache.
//!
//! ## Invariants
//!
//! - Removing an object drops its children cache; asking for it afterwards
//!   yields a fresh, unloaded cache.
//! - Refreshing an object drops the children cache of the replaced instance.
//!   So does any load, lookup or refresh that drops an object or swaps it
//!   for a changed instance.
//! - Caches kept outside this one but keyed by its objects (registered as a
//!   [`DependentCache`]) are evicted, renamed and cleared along with the
//!   children caches.
//! - Renaming an object (a command edit) moves its children cache to the
//!   new name and re-parents the cached children.
//! - Objects that do not exist on the server yet get a children cache that
//!   is already loaded and empty, so no query is issued for them.

use crate::config::CacheConfig;
use crate::error::CatalogResult;
use crate::event::SharedEventSink;
use crate::monitor::ProgressMonitor;
use crate::object_cache::{ObjectCache, ObjectFetcher, read_rows};
use crate::row::Row;
use crate::session::{DataSource, MetaQuery};
use crate::store::{
    DiscardListener, LoadState, ObjectContainer, ObjectList, ObjectStore, RefreshDiff,
};
use parking_lot::{Mutex, RwLock};
use sqlmeta_model::CatalogObject;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Nested per-object cache
pub type ChildrenCache<C> = ObjectStore<C>;

/// Vendor strategy reading the children of cached objects
pub trait ChildFetcher<O, T, C>: Send + Sync {
    /// Children of `parent`, or of every object of `owner` when `parent`
    /// is `None`
    fn children_query(&self, owner: &O, parent: Option<&T>) -> MetaQuery;

    /// Name of the object a row of a bulk query belongs to
    fn parent_name(&self, row: &Row) -> CatalogResult<String>;

    /// Convert one row; `Ok(None)` skips the row
    fn fetch_child(&self, owner: &O, parent: &T, row: &Row) -> CatalogResult<Option<C>>;
}

/// Per-object state held outside a struct cache
pub trait DependentCache<T>: Send + Sync {
    /// The object named `name` is gone or was replaced
    fn evict(&self, name: &str);

    /// The object named `old_name` now is `renamed`
    fn rename(&self, old_name: &str, renamed: &T);

    /// Every object is gone
    fn clear(&self);
}

/// Children caches plus dependents, shared with the object store so loads
/// and refreshes can evict what they discard
struct NestedCaches<T, C> {
    children: Mutex<HashMap<String, Arc<ChildrenCache<C>>>>,
    dependents: RwLock<Vec<Arc<dyn DependentCache<T>>>>,
    child_label: String,
}

impl<T, C> NestedCaches<T, C> {
    fn evict(&self, key: &str, name: &str) {
        if self.children.lock().remove(key).is_some() {
            debug!("Dropped {} cache of '{}'", self.child_label, name);
        }
        for dependent in self.dependents.read().iter() {
            dependent.evict(name);
        }
    }

    fn clear(&self) {
        self.children.lock().clear();
        for dependent in self.dependents.read().iter() {
            dependent.clear();
        }
    }
}

impl<T, C> DiscardListener<T> for NestedCaches<T, C>
where
    T: CatalogObject,
    C: Send + Sync,
{
    fn objects_discarded(&self, store: &ObjectStore<T>, objects: &[Arc<T>]) {
        for object in objects {
            self.evict(&store.fold(object.name()), object.name());
        }
    }
}

/// Object cache with nested per-object children caches
pub struct StructCache<O, T, C> {
    objects: ObjectCache<O, T>,
    child_fetcher: Arc<dyn ChildFetcher<O, T, C>>,
    nested: Arc<NestedCaches<T, C>>,
    child_config: CacheConfig,
    events: Option<SharedEventSink>,
}

impl<O, T, C> StructCache<O, T, C>
where
    O: Send + Sync,
    T: CatalogObject,
    C: CatalogObject,
{
    /// `child_label` names the nested caches in logs (e.g. `columns`)
    pub fn new(
        label: impl Into<String>,
        child_label: impl Into<String>,
        source: Arc<dyn DataSource>,
        fetcher: Arc<dyn ObjectFetcher<O, T>>,
        child_fetcher: Arc<dyn ChildFetcher<O, T, C>>,
        config: CacheConfig,
    ) -> Self {
        let nested = Arc::new(NestedCaches {
            children: Mutex::new(HashMap::new()),
            dependents: RwLock::new(Vec::new()),
            child_label: child_label.into(),
        });
        let listener: Arc<dyn DiscardListener<T>> = nested.clone();
        Self {
            objects: ObjectCache::new(label, source, fetcher, config)
                .with_discard_listener(Some(listener)),
            child_fetcher,
            nested,
            child_config: config,
            events: None,
        }
    }

    /// Builder method: deliver events from this cache and every nested cache
    pub fn with_events(mut self, sink: Option<SharedEventSink>) -> Self {
        self.objects = self.objects.with_events(sink.clone());
        self.events = sink;
        self
    }

    /// Builder method: keep `dependent` in step with this cache's objects
    pub fn with_dependent(self, dependent: Arc<dyn DependentCache<T>>) -> Self {
        self.nested.dependents.write().push(dependent);
        self
    }

    /// The parent-level object cache
    pub fn objects(&self) -> &ObjectCache<O, T> {
        &self.objects
    }

    pub fn load_state(&self) -> LoadState {
        self.objects.load_state()
    }

    pub fn is_fully_cached(&self) -> bool {
        self.objects.is_fully_cached()
    }

    /// Change name comparison; nested caches are dropped and rebuilt on
    /// next access
    pub fn set_case_sensitive(&self, case_sensitive: bool) {
        self.objects.set_case_sensitive(case_sensitive);
        self.nested.clear();
    }

    pub fn cached_objects(&self) -> ObjectList<T> {
        self.objects.cached_objects()
    }

    pub async fn get_objects(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
    ) -> CatalogResult<ObjectList<T>> {
        self.objects.get_objects(monitor, owner).await
    }

    pub async fn get_object(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
        name: &str,
    ) -> CatalogResult<Option<Arc<T>>> {
        self.objects.get_object(monitor, owner, name).await
    }

    /// Re-read `old`, dropping the nested caches of the replaced instance
    ///
    /// Nested state of other objects the reload discards is dropped too.
    pub async fn refresh_object(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
        old: &T,
    ) -> CatalogResult<Option<Arc<T>>> {
        let fresh = self.objects.refresh_object(monitor, owner, old).await?;
        self.evict(old.name());
        Ok(fresh)
    }

    /// Differential reload; nested caches of changed and vanished objects
    /// are dropped
    pub async fn refresh_all(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
    ) -> CatalogResult<RefreshDiff<T>> {
        self.objects.refresh_all(monitor, owner).await
    }

    /// Forget all objects and every nested cache
    pub fn clear_cache(&self) {
        self.objects.clear_cache();
        self.nested.clear();
    }

    /// Children cache of `object`, created on first access
    pub fn get_children_cache(&self, object: &T) -> Arc<ChildrenCache<C>> {
        let key = self.objects.store().fold(object.name());
        let mut children = self.nested.children.lock();
        children
            .entry(key)
            .or_insert_with(|| Arc::new(self.new_children_cache(object)))
            .clone()
    }

    /// Drop the children cache of the object named `name`
    pub fn clear_children_cache(&self, name: &str) {
        let key = self.objects.store().fold(name);
        if self.nested.children.lock().remove(&key).is_some() {
            debug!("Dropped {} cache of '{}'", self.nested.child_label, name);
        }
    }

    /// Drop the children cache and dependent state of `name`
    fn evict(&self, name: &str) {
        self.nested.evict(&self.objects.store().fold(name), name);
    }

    /// Whether the children of `object` are loaded
    pub fn is_children_cached(&self, object: &T) -> bool {
        let key = self.objects.store().fold(object.name());
        self.nested
            .children
            .lock()
            .get(&key)
            .is_some_and(|cache| cache.is_fully_cached())
    }

    /// Children of `parent`, loading them on first access
    pub async fn get_children(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
        parent: &T,
    ) -> CatalogResult<ObjectList<C>> {
        let cache = self.get_children_cache(parent);
        cache
            .load_with(|| async {
                let query = self.child_fetcher.children_query(owner, Some(parent));
                let task = format!("Load {} of {}", self.nested.child_label, parent.path());
                let fetcher = self.child_fetcher.as_ref();
                read_rows(self.objects.data_source().as_ref(), monitor, &task, &query, |row| {
                    fetcher.fetch_child(owner, parent, row)
                })
                .await
            })
            .await
    }

    /// Child of `parent` named `name`
    pub async fn get_child(
        &self,
        monitor: &dyn ProgressMonitor,
        owner: &O,
        parent: &T,
        name: &str,
    ) -> CatalogResult<Option<Arc<C>>> {
        self.get_children(monitor, owner, parent).await?;
        Ok(self.get_children_cache(parent).cached_object(name))
    }

    /// Load the children of every object of `owner` with one query
    ///
    /// Objects whose children are already cached keep them. Rows that
    /// reference an unknown object are ignored.
    pub async fn load_children(&self, monitor: &dyn ProgressMonitor, owner: &O) -> CatalogResult<()> {
        let objects = self.get_objects(monitor, owner).await?;
        let query = self.child_fetcher.children_query(owner, None);
        let task = format!("Load {} of {}", self.nested.child_label, self.objects.store().label());
        let fetcher = self.child_fetcher.as_ref();
        let store = self.objects.store();

        let rows = read_rows(self.objects.data_source().as_ref(), monitor, &task, &query, |row| {
            let parent_name = fetcher.parent_name(row)?;
            let Some(parent) = store.cached_object(&parent_name) else {
                return Ok(None);
            };
            Ok(fetcher
                .fetch_child(owner, &parent, row)?
                .map(|child| (store.fold(&parent_name), child)))
        })
        .await?;

        let mut groups: HashMap<String, Vec<C>> = HashMap::new();
        for (key, child) in rows {
            groups.entry(key).or_default().push(child);
        }

        for object in objects.iter() {
            let group = groups
                .remove(&store.fold(object.name()))
                .unwrap_or_default();
            let cache = self.get_children_cache(object);
            cache.load_with(|| async move { Ok(group) }).await?;
        }
        debug!("Bulk-loaded {} of {} objects", self.nested.child_label, objects.len());
        Ok(())
    }

    fn new_children_cache(&self, object: &T) -> ChildrenCache<C> {
        let cache = ObjectStore::new(
            format!("{} of {}", self.nested.child_label, object.path()),
            &self.child_config,
        )
        .with_events(self.events.clone());
        cache.set_case_sensitive(self.objects.store().is_case_sensitive());
        if !object.is_persisted() {
            cache.set_cache(Vec::new());
        }
        cache
    }
}

impl<O, T, C> ObjectContainer<T> for StructCache<O, T, C>
where
    O: Send + Sync,
    T: CatalogObject,
    C: CatalogObject,
{
    fn cached_object(&self, name: &str) -> Option<Arc<T>> {
        self.objects.cached_object(name)
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.objects.position_of(name)
    }

    fn cache_object(&self, object: Arc<T>) -> Option<Arc<T>> {
        let replaced = self.objects.cache_object(object.clone());
        if replaced.is_none() && !object.is_persisted() {
            self.get_children_cache(&object);
        }
        replaced
    }

    fn insert_object_at(&self, index: usize, object: Arc<T>) {
        self.objects.insert_object_at(index, object.clone());
        if !object.is_persisted() {
            self.get_children_cache(&object);
        }
    }

    fn replace_object(&self, old_name: &str, object: Arc<T>) -> bool {
        if !self.objects.replace_object(old_name, object.clone()) {
            return false;
        }
        let store = self.objects.store();
        let (old_key, new_key) = (store.fold(old_name), store.fold(object.name()));
        if old_key != new_key {
            let moved = {
                let mut children = self.nested.children.lock();
                let moved = children.remove(&old_key);
                children.remove(&new_key);
                if let Some(cache) = &moved {
                    children.insert(new_key, cache.clone());
                }
                moved
            };
            if let Some(cache) = moved {
                let parent = object.path();
                for child in cache.cached_objects().iter() {
                    let mut relocated = (**child).clone();
                    relocated.set_parent(parent.clone());
                    cache.replace_object(child.name(), Arc::new(relocated));
                }
            }
            for dependent in self.nested.dependents.read().iter() {
                dependent.rename(old_name, &object);
            }
        }
        true
    }

    fn remove_object(&self, name: &str) -> Option<Arc<T>> {
        let removed = self.objects.remove_object(name);
        self.evict(name);
        removed
    }
}
