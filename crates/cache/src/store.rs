// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Object store
//!
//! [`ObjectStore`] is the storage half of every cache: an ordered,
//! name-indexed set of `Arc<T>` plus an explicit load state.
//!
//! ## Load protocol
//!
//! ```text
//!  NotLoaded ──load_with──▶ Loading ──ok──▶ Loaded
//!      ▲                       │
//!      └──── canceled ─────────┤
//!  Failed(msg) ◀──── error ────┘      (Failed behaves as NotLoaded)
//! ```
//!
//! Loads are serialised by an async mutex. A caller that finds the store
//! loaded returns immediately; one that has to wait re-checks the state once
//! it holds the guard, so a single load serves every concurrent caller.
//!
//! ## Snapshots
//!
//! Readers receive an `Arc<Vec<Arc<T>>>`. The same snapshot is handed out
//! until the next mutation, so two reads with nothing in between are
//! pointer-equal.

use crate::config::CacheConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::event::{CatalogEvent, EventAction, SharedEventSink};
use indexmap::IndexMap;
use parking_lot::RwLock;
use sqlmeta_model::CatalogObject;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Immutable snapshot of a cache's content
pub type ObjectList<T> = Arc<Vec<Arc<T>>>;

/// Load state of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    /// Last load failed with the given message; the next access retries
    Failed(String),
}

/// Differences applied by [`ObjectStore::merge_refresh`]
#[derive(Debug)]
pub struct RefreshDiff<T> {
    pub added: Vec<Arc<T>>,
    pub updated: Vec<Arc<T>>,
    pub removed: Vec<Arc<T>>,
}

impl<T> RefreshDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Mutation surface shared by every cache flavour
///
/// Commands apply their model changes through this trait so the same
/// command works against a flat object cache and a struct cache (which
/// additionally maintains nested children caches).
pub trait ObjectContainer<T: CatalogObject>: Send + Sync {
    fn cached_object(&self, name: &str) -> Option<Arc<T>>;

    fn position_of(&self, name: &str) -> Option<usize>;

    /// Insert or overwrite by name; returns the replaced object
    fn cache_object(&self, object: Arc<T>) -> Option<Arc<T>>;

    /// Insert at an explicit ordinal
    fn insert_object_at(&self, index: usize, object: Arc<T>);

    /// Replace the object named `old_name` in place, keeping its position.
    /// The new object may carry a different name.
    fn replace_object(&self, old_name: &str, object: Arc<T>) -> bool;

    /// Remove by name; returns the removed object
    fn remove_object(&self, name: &str) -> Option<Arc<T>>;
}

/// Told about objects a load or refresh dropped or swapped for a new instance
///
/// Struct caches use this to drop the nested state of those objects.
pub trait DiscardListener<T>: Send + Sync {
    fn objects_discarded(&self, store: &ObjectStore<T>, objects: &[Arc<T>]);
}

struct StoreState<T> {
    objects: IndexMap<String, Arc<T>>,
    snapshot: Option<ObjectList<T>>,
    load_state: LoadState,
    case_sensitive: bool,
}

impl<T: CatalogObject> StoreState<T> {
    fn key(&self, name: &str) -> String {
        fold_name(name, self.case_sensitive)
    }

    fn touch(&mut self) {
        self.snapshot = None;
    }

    fn snapshot(&mut self) -> ObjectList<T> {
        if let Some(snapshot) = &self.snapshot {
            return snapshot.clone();
        }
        let snapshot: ObjectList<T> = Arc::new(self.objects.values().cloned().collect());
        self.snapshot = Some(snapshot.clone());
        snapshot
    }
}

pub(crate) fn fold_name(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// Ordered, name-indexed storage with an explicit load state
pub struct ObjectStore<T> {
    label: String,
    state: RwLock<StoreState<T>>,
    load_guard: Mutex<()>,
    events: Option<SharedEventSink>,
    discard_listener: Option<Arc<dyn DiscardListener<T>>>,
}

/// Resets `Loading` if a load future is dropped before it completes
struct LoadingGuard<'a, T: CatalogObject> {
    store: &'a ObjectStore<T>,
    armed: bool,
}

impl<T: CatalogObject> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.store.state.write();
            if state.load_state == LoadState::Loading {
                state.load_state = LoadState::NotLoaded;
            }
        }
    }
}

impl<T: CatalogObject> ObjectStore<T> {
    /// Create an empty, not-loaded store
    ///
    /// `label` names the store in log output (e.g. `tables of public`).
    pub fn new(label: impl Into<String>, config: &CacheConfig) -> Self {
        Self {
            label: label.into(),
            state: RwLock::new(StoreState {
                objects: IndexMap::new(),
                snapshot: None,
                load_state: LoadState::NotLoaded,
                case_sensitive: config.case_sensitive,
            }),
            load_guard: Mutex::new(()),
            events: None,
            discard_listener: None,
        }
    }

    /// Builder method: deliver add/remove/update events to `sink`
    pub fn with_events(mut self, sink: Option<SharedEventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Builder method: report objects dropped by loads and refreshes
    pub fn with_discard_listener(mut self, listener: Option<Arc<dyn DiscardListener<T>>>) -> Self {
        self.discard_listener = listener;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn events(&self) -> Option<&SharedEventSink> {
        self.events.as_ref()
    }

    pub fn load_state(&self) -> LoadState {
        self.state.read().load_state.clone()
    }

    /// Whether the full content has been loaded
    pub fn is_fully_cached(&self) -> bool {
        self.state.read().load_state == LoadState::Loaded
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.state.read().case_sensitive
    }

    /// Change the name comparison policy
    ///
    /// Cached objects are re-keyed. Switching to case-insensitive can merge
    /// names that only differ in case; the later object wins.
    pub fn set_case_sensitive(&self, case_sensitive: bool) {
        let mut state = self.state.write();
        if state.case_sensitive == case_sensitive {
            return;
        }
        if !state.objects.is_empty() {
            warn!(
                "Changing case sensitivity of populated cache '{}' ({} objects)",
                self.label,
                state.objects.len()
            );
        }
        state.case_sensitive = case_sensitive;
        let objects = std::mem::take(&mut state.objects);
        for object in objects.into_values() {
            let key = state.key(object.name());
            state.objects.insert(key, object);
        }
        state.touch();
    }

    /// Current content without triggering a load
    pub fn cached_objects(&self) -> ObjectList<T> {
        self.state.write().snapshot()
    }

    /// Snapshot if the store is fully loaded
    pub fn loaded_snapshot(&self) -> Option<ObjectList<T>> {
        {
            let state = self.state.read();
            if state.load_state != LoadState::Loaded {
                return None;
            }
            if let Some(snapshot) = &state.snapshot {
                return Some(snapshot.clone());
            }
        }
        let mut state = self.state.write();
        (state.load_state == LoadState::Loaded).then(|| state.snapshot())
    }

    /// Name as used for keys under the current case policy
    pub fn fold(&self, name: &str) -> String {
        fold_name(name, self.state.read().case_sensitive)
    }

    pub fn object_count(&self) -> usize {
        self.state.read().objects.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        let state = self.state.read();
        state.objects.contains_key(&state.key(name))
    }

    /// Ensure the store is loaded, running `load` at most once across all
    /// concurrent callers.
    ///
    /// On error or cancellation nothing is published and the store stays
    /// unloaded, so a later call retries.
    pub async fn load_with<F, Fut>(&self, load: F) -> CatalogResult<ObjectList<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CatalogResult<Vec<T>>>,
    {
        if let Some(snapshot) = self.loaded_snapshot() {
            return Ok(snapshot);
        }

        let _load_lock = self.load_guard.lock().await;
        if let Some(snapshot) = self.loaded_snapshot() {
            debug!("Cache '{}' was loaded by a concurrent caller", self.label);
            return Ok(snapshot);
        }

        {
            let mut state = self.state.write();
            if state.load_state == LoadState::Loading {
                return Err(CatalogError::CacheState(format!(
                    "cache '{}' is already loading while the load guard is held",
                    self.label
                )));
            }
            state.load_state = LoadState::Loading;
        }
        let mut guard = LoadingGuard {
            store: self,
            armed: true,
        };

        debug!("Loading cache '{}'", self.label);
        let result = load().await;
        guard.armed = false;

        match result {
            Ok(objects) => {
                let (snapshot, discarded) = self.publish_loaded(objects);
                debug!("Loaded {} objects into '{}'", snapshot.len(), self.label);
                self.notify_discarded(&discarded);
                Ok(snapshot)
            }
            Err(err) => {
                let mut state = self.state.write();
                state.load_state = if err.is_canceled() {
                    LoadState::NotLoaded
                } else {
                    LoadState::Failed(err.to_string())
                };
                warn!("Loading cache '{}' failed: {}", self.label, err);
                Err(err)
            }
        }
    }

    /// Reload under the load guard and merge the result
    ///
    /// On error the current content is kept untouched.
    pub async fn refresh_with<F, Fut>(&self, load: F) -> CatalogResult<RefreshDiff<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CatalogResult<Vec<T>>>,
    {
        let _load_lock = self.load_guard.lock().await;
        let objects = load().await?;
        Ok(self.merge_refresh(objects))
    }

    /// Cache an object found by a single-object lookup
    ///
    /// Lookups populate the cache silently; the store stays not fully
    /// loaded.
    pub fn cache_lookup_result(&self, object: T) -> Arc<T> {
        let (object, replaced) = {
            let mut state = self.state.write();
            let key = state.key(object.name());
            if let Some(existing) = state.objects.get(&key) {
                if **existing == object {
                    return existing.clone();
                }
            }
            let object = Arc::new(object);
            let replaced = state.objects.insert(key, object.clone());
            state.touch();
            (object, replaced)
        };
        if let Some(replaced) = replaced {
            self.notify_discarded(&[replaced]);
        }
        object
    }

    /// Publish a freshly loaded object list
    ///
    /// Objects already cached under the same name with equal content keep
    /// their existing `Arc`. Unpersisted objects (created by pending edits)
    /// survive the load and are appended. Returns the snapshot and the
    /// previously cached instances that did not survive.
    fn publish_loaded(&self, objects: Vec<T>) -> (ObjectList<T>, Vec<Arc<T>>) {
        let mut state = self.state.write();
        let mut previous = std::mem::take(&mut state.objects);
        let mut loaded: IndexMap<String, Arc<T>> = IndexMap::with_capacity(objects.len());
        let mut discarded = Vec::new();

        for object in objects {
            let key = state.key(object.name());
            let object = match previous.shift_remove(&key) {
                Some(existing) if *existing == object => existing,
                Some(existing) => {
                    discarded.push(existing);
                    Arc::new(object)
                }
                None => Arc::new(object),
            };
            if loaded.insert(key, object).is_some() {
                debug!("Duplicate object name in '{}' load result", self.label);
            }
        }
        for (key, object) in previous {
            if !object.is_persisted() && !loaded.contains_key(&key) {
                loaded.insert(key, object);
            } else {
                discarded.push(object);
            }
        }

        state.objects = loaded;
        state.load_state = LoadState::Loaded;
        state.touch();
        (state.snapshot(), discarded)
    }

    /// Hand `objects` to the discard listener
    pub(crate) fn notify_discarded(&self, objects: &[Arc<T>]) {
        if objects.is_empty() {
            return;
        }
        if let Some(listener) = &self.discard_listener {
            listener.objects_discarded(self, objects);
        }
    }

    /// Replace the whole content and mark the store loaded
    pub fn set_cache(&self, objects: Vec<Arc<T>>) {
        let mut state = self.state.write();
        let mut map = IndexMap::with_capacity(objects.len());
        for object in objects {
            map.insert(state.key(object.name()), object);
        }
        state.objects = map;
        state.load_state = LoadState::Loaded;
        state.touch();
    }

    /// Drop all content and return to `NotLoaded`
    pub fn clear_cache(&self) {
        let mut state = self.state.write();
        state.objects.clear();
        state.load_state = LoadState::NotLoaded;
        state.touch();
        debug!("Cleared cache '{}'", self.label);
    }

    /// Merge a reloaded object list into the current content
    ///
    /// Unchanged objects keep their instance and position, changed ones are
    /// replaced in place, vanished ones are removed and new ones appended.
    /// Unpersisted objects are left alone.
    pub fn merge_refresh(&self, objects: Vec<T>) -> RefreshDiff<T> {
        let mut diff = RefreshDiff {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        };
        let mut replaced = Vec::new();
        {
            let mut state = self.state.write();
            let mut fresh: IndexMap<String, T> = IndexMap::with_capacity(objects.len());
            for object in objects {
                fresh.insert(state.key(object.name()), object);
            }

            let mut merged: IndexMap<String, Arc<T>> = IndexMap::with_capacity(fresh.len());
            for (key, existing) in std::mem::take(&mut state.objects) {
                match fresh.shift_remove(&key) {
                    Some(object) if object == *existing => {
                        merged.insert(key, existing);
                    }
                    Some(object) => {
                        let object = Arc::new(object);
                        diff.updated.push(object.clone());
                        merged.insert(key, object);
                        replaced.push(existing);
                    }
                    None if !existing.is_persisted() => {
                        merged.insert(key, existing);
                    }
                    None => diff.removed.push(existing),
                }
            }
            for (key, object) in fresh {
                let object = Arc::new(object);
                diff.added.push(object.clone());
                merged.insert(key, object);
            }

            state.objects = merged;
            state.load_state = LoadState::Loaded;
            state.touch();
        }

        debug!(
            "Refreshed '{}': {} added, {} updated, {} removed",
            self.label,
            diff.added.len(),
            diff.updated.len(),
            diff.removed.len()
        );
        for object in &diff.added {
            self.fire(EventAction::Add, object);
        }
        for object in &diff.updated {
            self.fire(EventAction::Update, object);
        }
        for object in &diff.removed {
            self.fire(EventAction::Remove, object);
        }
        replaced.extend(diff.removed.iter().cloned());
        self.notify_discarded(&replaced);
        diff
    }

    /// Rename a cached object in place
    pub fn rename_object(&self, old_name: &str, new_name: &str) -> Option<Arc<T>> {
        let existing = self.cached_object(old_name)?;
        let mut renamed = (*existing).clone();
        renamed.set_name(new_name.to_string());
        let renamed = Arc::new(renamed);
        self.replace_object(old_name, renamed.clone())
            .then_some(renamed)
    }

    fn fire(&self, action: EventAction, object: &T) {
        if let Some(sink) = &self.events {
            sink.notify(CatalogEvent::for_object(action, object));
        }
    }
}

impl<T: CatalogObject> ObjectContainer<T> for ObjectStore<T> {
    fn cached_object(&self, name: &str) -> Option<Arc<T>> {
        let state = self.state.read();
        state.objects.get(&state.key(name)).cloned()
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        let state = self.state.read();
        state.objects.get_index_of(&state.key(name))
    }

    fn cache_object(&self, object: Arc<T>) -> Option<Arc<T>> {
        let replaced = {
            let mut state = self.state.write();
            let key = state.key(object.name());
            let replaced = state.objects.insert(key, object.clone());
            state.touch();
            replaced
        };
        let action = if replaced.is_some() {
            EventAction::Update
        } else {
            EventAction::Add
        };
        self.fire(action, &object);
        replaced
    }

    fn insert_object_at(&self, index: usize, object: Arc<T>) {
        {
            let mut state = self.state.write();
            let key = state.key(object.name());
            state.objects.shift_remove(&key);
            let index = index.min(state.objects.len());
            state.objects.shift_insert(index, key, object.clone());
            state.touch();
        }
        self.fire(EventAction::Add, &object);
    }

    fn replace_object(&self, old_name: &str, object: Arc<T>) -> bool {
        {
            let mut state = self.state.write();
            let old_key = state.key(old_name);
            if !state.objects.contains_key(&old_key) {
                return false;
            }
            let new_key = state.key(object.name());
            if new_key == old_key {
                state.objects.insert(new_key, object.clone());
            } else {
                if state.objects.shift_remove(&new_key).is_some() {
                    warn!(
                        "Replacing '{}' in '{}' overwrote existing '{}'",
                        old_name,
                        self.label,
                        object.name()
                    );
                }
                let Some((index, _, _)) = state.objects.shift_remove_full(&old_key) else {
                    return false;
                };
                state.objects.shift_insert(index, new_key, object.clone());
            }
            state.touch();
        }
        self.fire(EventAction::Update, &object);
        true
    }

    fn remove_object(&self, name: &str) -> Option<Arc<T>> {
        let removed = {
            let mut state = self.state.write();
            let key = state.key(name);
            let removed = state.objects.shift_remove(&key);
            if removed.is_some() {
                state.touch();
            }
            removed
        };
        if let Some(object) = &removed {
            self.fire(EventAction::Remove, object);
        }
        removed
    }
}
