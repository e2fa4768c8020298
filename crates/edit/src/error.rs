// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for edit operations

use sqlmeta_cache::CatalogError;
use thiserror::Error;

/// Result type alias for edit operations
pub type EditResult<T> = Result<T, EditError>;

/// Errors raised while building, applying or persisting commands
#[derive(Debug, Error, Clone)]
pub enum EditError {
    /// Cache access or statement execution failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The aggregation rule of a command context was violated
    #[error("Command conflict: {0}")]
    CommandConflict(String),

    /// The editor cannot perform this kind of change
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The edited object is not valid
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The in-memory model does not match what the command expects
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl EditError {
    /// Underlying catalog error, if any
    pub fn catalog_error(&self) -> Option<&CatalogError> {
        match self {
            EditError::Catalog(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.catalog_error().is_some_and(CatalogError::is_canceled)
    }
}
