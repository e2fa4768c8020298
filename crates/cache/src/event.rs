// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Catalog change notifications

use serde::Serialize;
use sqlmeta_model::{CatalogObject, ObjectKind, ObjectPath};
use std::sync::Arc;

/// What happened to a cached object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventAction {
    Add,
    Remove,
    Update,
    /// The whole content of a container was reloaded
    Refresh,
}

/// Notification delivered to listeners of a cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEvent {
    pub action: EventAction,
    pub kind: ObjectKind,
    pub path: ObjectPath,
}

impl CatalogEvent {
    pub fn new(action: EventAction, kind: ObjectKind, path: ObjectPath) -> Self {
        Self { action, kind, path }
    }

    /// Event describing `object`
    pub fn for_object<T: CatalogObject>(action: EventAction, object: &T) -> Self {
        Self::new(action, object.kind(), object.path())
    }
}

/// Receiver of catalog events (UI refresh, navigator updates, ...)
pub trait EventSink: Send + Sync {
    fn notify(&self, event: CatalogEvent);
}

/// Shared handle to an event sink
pub type SharedEventSink = Arc<dyn EventSink>;
