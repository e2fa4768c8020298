// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog trait
//!
//! Async, read-only view of a data source's schema information. The
//! cache-backed implementation is [`crate::CachedCatalog`]; tests and tools
//! can provide their own.

use crate::error::CatalogResult;
use crate::monitor::ProgressMonitor;
use crate::store::ObjectList;
use async_trait::async_trait;
use sqlmeta_model::{Column, Index, Schema, Table};
use std::sync::Arc;

/// Catalog trait for database schema navigation
///
/// Names are matched with the case policy of the implementation. Every
/// call honours the monitor's cancellation flag.
///
/// # Examples
///
/// ```rust,ignore
/// use sqlmeta_cache::{Catalog, NullProgressMonitor};
///
/// async fn table_names(catalog: &impl Catalog) -> Vec<String> {
///     let tables = catalog.list_tables(&NullProgressMonitor, "public").await?;
///     tables.iter().map(|t| t.name.clone()).collect()
/// }
/// ```
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All schemas of the data source
    async fn list_schemas(&self, monitor: &dyn ProgressMonitor) -> CatalogResult<ObjectList<Schema>>;

    /// All tables and views of `schema`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ObjectNotFound` if the schema doesn't exist.
    async fn list_tables(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
    ) -> CatalogResult<ObjectList<Table>>;

    /// A single table; `Ok(None)` if it doesn't exist
    async fn get_table(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
        table: &str,
    ) -> CatalogResult<Option<Arc<Table>>>;

    /// Columns of `schema.table` in ordinal order
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ObjectNotFound` if the schema or the table
    /// doesn't exist.
    async fn get_columns(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
        table: &str,
    ) -> CatalogResult<ObjectList<Column>>;

    /// Indexes of `schema.table`
    async fn get_indexes(
        &self,
        monitor: &dyn ProgressMonitor,
        schema: &str,
        table: &str,
    ) -> CatalogResult<ObjectList<Index>>;
}
