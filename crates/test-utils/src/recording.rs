// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Recording event sink and scripted progress monitors

use parking_lot::Mutex;
use sqlmeta_cache::{CatalogEvent, EventAction, EventSink, ProgressMonitor};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Event sink that keeps every notification for later assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CatalogEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CatalogEvent> {
        self.events.lock().clone()
    }

    /// `(action, dotted path)` pairs, convenient for `assert_eq!`
    pub fn summary(&self) -> Vec<(EventAction, String)> {
        self.events
            .lock()
            .iter()
            .map(|e| (e.action, e.path.to_string()))
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: CatalogEvent) {
        self.events.lock().push(event);
    }
}

/// Monitor that reports itself canceled once `limit` work units were
/// reported, simulating a user pressing cancel mid-load
#[derive(Debug)]
pub struct CancelAfterWork {
    limit: u64,
    worked: AtomicU64,
    canceled: AtomicBool,
    begun: AtomicU64,
    finished: AtomicU64,
}

impl CancelAfterWork {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            worked: AtomicU64::new(0),
            canceled: AtomicBool::new(limit == 0),
            begun: AtomicU64::new(0),
            finished: AtomicU64::new(0),
        }
    }

    pub fn work_done(&self) -> u64 {
        self.worked.load(Ordering::SeqCst)
    }

    pub fn tasks_begun(&self) -> u64 {
        self.begun.load(Ordering::SeqCst)
    }

    /// Tasks begun but not finished with `done`
    pub fn open_tasks(&self) -> u64 {
        self.tasks_begun()
            .saturating_sub(self.finished.load(Ordering::SeqCst))
    }
}

impl ProgressMonitor for CancelAfterWork {
    fn begin_task(&self, _name: &str, _total_work: u64) {
        self.begun.fetch_add(1, Ordering::SeqCst);
    }

    fn worked(&self, work: u64) {
        let total = self.worked.fetch_add(work, Ordering::SeqCst) + work;
        if total >= self.limit {
            self.canceled.store(true, Ordering::SeqCst);
        }
    }

    fn done(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmeta_model::{ObjectKind, ObjectPath};

    #[test]
    fn test_cancel_after_limit() {
        let monitor = CancelAfterWork::new(2);
        monitor.worked(1);
        assert!(!monitor.is_canceled());
        monitor.worked(1);
        assert!(monitor.is_canceled());
    }

    #[test]
    fn test_open_task_accounting() {
        let monitor = CancelAfterWork::new(u64::MAX);
        monitor.begin_task("load", 0);
        assert_eq!(monitor.open_tasks(), 1);
        monitor.done();
        assert_eq!(monitor.open_tasks(), 0);
        assert_eq!(monitor.tasks_begun(), 1);
    }

    #[test]
    fn test_sink_summary() {
        let sink = RecordingSink::new();
        sink.notify(CatalogEvent::new(
            EventAction::Add,
            ObjectKind::Table,
            ObjectPath::new(["public", "orders"]),
        ));
        assert_eq!(sink.summary(), vec![(EventAction::Add, "public.orders".to_string())]);
    }
}
