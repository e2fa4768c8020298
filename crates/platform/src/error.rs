// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::config::ConfigError;
use sqlmeta_cache::CatalogError;
use sqlmeta_model::Dialect;
use thiserror::Error;

/// Result type alias for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors raised by the platform context
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No driver is registered for the dialect of a data source
    #[error("No driver registered for dialect {0:?}")]
    NoDriver(Dialect),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The platform was shut down
    #[error("Platform is shut down")]
    ShutDown,
}
