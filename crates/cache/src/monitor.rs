// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Progress monitoring
//!
//! Every potentially slow call takes a [`ProgressMonitor`]. The host reports
//! progress through it and requests cooperative cancellation; the cache polls
//! [`ProgressMonitor::is_canceled`] between result rows.

use crate::error::{CatalogError, CatalogResult};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

/// Progress reporting and cancellation capability supplied by the host
pub trait ProgressMonitor: Send + Sync {
    fn begin_task(&self, name: &str, total_work: u64);

    fn sub_task(&self, _name: &str) {}

    fn worked(&self, work: u64);

    fn done(&self);

    fn is_canceled(&self) -> bool;
}

/// Returns `Err(CatalogError::Canceled)` once the monitor was canceled
pub fn check_canceled(monitor: &dyn ProgressMonitor) -> CatalogResult<()> {
    if monitor.is_canceled() {
        Err(CatalogError::Canceled)
    } else {
        Ok(())
    }
}

/// Monitor that ignores progress and is never canceled
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressMonitor;

impl ProgressMonitor for NullProgressMonitor {
    fn begin_task(&self, _name: &str, _total_work: u64) {}

    fn worked(&self, _work: u64) {}

    fn done(&self) {}

    fn is_canceled(&self) -> bool {
        false
    }
}

/// Monitor that can be canceled from another task and counts reported work
#[derive(Debug, Default)]
pub struct CancelableMonitor {
    canceled: AtomicBool,
    worked: AtomicU64,
    tasks: AtomicU64,
}

impl CancelableMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Total work units reported so far
    pub fn work_done(&self) -> u64 {
        self.worked.load(Ordering::SeqCst)
    }

    /// Number of tasks begun so far
    pub fn tasks_begun(&self) -> u64 {
        self.tasks.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for CancelableMonitor {
    fn begin_task(&self, name: &str, total_work: u64) {
        self.tasks.fetch_add(1, Ordering::SeqCst);
        trace!("begin task '{}' ({} units)", name, total_work);
    }

    fn sub_task(&self, name: &str) {
        trace!("sub task '{}'", name);
    }

    fn worked(&self, work: u64) {
        self.worked.fetch_add(work, Ordering::SeqCst);
    }

    fn done(&self) {}

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_monitor_never_cancels() {
        assert!(check_canceled(&NullProgressMonitor).is_ok());
    }

    #[test]
    fn test_cancelable_monitor() {
        let monitor = CancelableMonitor::new();
        monitor.begin_task("load", 3);
        monitor.worked(2);
        assert_eq!(monitor.work_done(), 2);
        assert_eq!(monitor.tasks_begun(), 1);
        assert!(check_canceled(&monitor).is_ok());

        monitor.cancel();
        assert!(matches!(check_canceled(&monitor), Err(CatalogError::Canceled)));
    }
}
