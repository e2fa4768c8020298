// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for sqlmeta
//!
//! This crate provides common testing components including:
//! - An in-memory metadata server and data source answering the generic
//!   `information_schema` queries, with statement log, latency and failure
//!   injection
//! - Recording progress monitors and event sinks
//! - Catalog fixtures and test tracing setup

pub mod fixtures;
pub mod mock_server;
pub mod recording;

// Re-exports for convenience
pub use fixtures::{init_test_tracing, sample_server, sample_source};
pub use mock_server::{MockColumn, MockDataSource, MockIndex, MockServer, MockTable};
pub use recording::{CancelAfterWork, RecordingSink};
