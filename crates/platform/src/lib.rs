// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmeta - Platform
//!
//! Wires configuration, drivers, catalogs and DDL sessions into one
//! explicit context object.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = PlatformConfig::load("sqlmeta.yaml")?;
//! let drivers = DriverRegistry::new().with_driver(Dialect::PostgreSQL, connect_postgres);
//! let platform = Platform::init(config, drivers)?;
//!
//! let mut events = platform.subscribe();
//! let warehouse = platform.data_source("warehouse")?;
//! let schema = warehouse.default_schema(&NullProgressMonitor).await?;
//! let mut context = warehouse.open_context();
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod platform;

pub use config::{ConfigError, ConfigFormat, DataSourceConfig, PlatformConfig};
pub use error::{PlatformError, PlatformResult};
pub use events::{DEFAULT_EVENT_CAPACITY, EventBus};
pub use logging::init_tracing;
pub use platform::{DataSourceDriver, DataSourceHandle, DriverRegistry, Platform};
