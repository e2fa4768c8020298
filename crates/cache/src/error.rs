// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for cache operations
//!
//! [`DriverError`] is what a session implementation reports for a failed
//! statement. The cache wraps it into [`CatalogError::DataAccess`] together
//! with a description of what was being attempted.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for driver-level calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Result type alias for cache operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failure reported by the underlying database driver
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    /// Five-character SQLSTATE, when the driver reports one
    pub sql_state: Option<String>,
    /// Vendor error code
    pub code: Option<i32>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            code: None,
        }
    }

    /// Builder method: set SQLSTATE
    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    /// Builder method: set vendor code
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }
}

/// Errors that can occur during cache operations
#[derive(Debug, Error, Clone, Serialize)]
pub enum CatalogError {
    /// Metadata query or statement execution failed
    #[error("{context}: {source}")]
    DataAccess {
        context: String,
        #[source]
        source: DriverError,
    },

    /// Internal load-state invariant was violated
    #[error("Cache state error: {0}")]
    CacheState(String),

    /// The progress monitor requested cancellation
    #[error("Operation canceled")]
    Canceled,

    /// Requested object was not found
    #[error("{kind} '{name}' not found")]
    ObjectNotFound { kind: String, name: String },

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    Configuration(String),

    /// The specified feature is not supported by this data source
    #[error("Feature not supported: {0}")]
    NotSupported(String),
}

impl CatalogError {
    /// Wrap a driver failure with a description of the attempted operation
    pub fn data_access(context: impl Into<String>, source: DriverError) -> Self {
        CatalogError::DataAccess {
            context: context.into(),
            source,
        }
    }

    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        CatalogError::ObjectNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, CatalogError::Canceled)
    }

    /// Underlying driver failure, if any
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            CatalogError::DataAccess { source, .. } => Some(source),
            _ => None,
        }
    }
}
