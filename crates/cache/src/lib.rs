// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmeta - Metadata Cache
//!
//! Lazily loaded, thread-safe caches of remote catalog objects.
//!
//! ## Architecture
//!
//! - [`ObjectStore`]: case-aware, ordered object storage with a load state
//!   and a single-load guard
//! - [`ObjectCache`]: a store plus the [`ObjectFetcher`] that reads it from
//!   the server
//! - [`StructCache`]: an object cache whose objects own nested children
//!   caches ([`ChildFetcher`])
//! - [`CachedCatalog`]: the schema / table / column / index tree of one
//!   [`DataSource`], exposed through the [`Catalog`] trait
//!
//! Driver access goes through the [`DataSource`] / [`Session`] /
//! [`Statement`] / [`ResultCursor`] capabilities; long reads poll a
//! [`ProgressMonitor`] for cancellation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlmeta_cache::{CacheConfig, CachedCatalog, Catalog, NullProgressMonitor};
//!
//! async fn print_columns(source: Arc<dyn DataSource>) -> CatalogResult<()> {
//!     let catalog = CachedCatalog::new(source, CacheConfig::default());
//!     for column in catalog.get_columns(&NullProgressMonitor, "public", "orders").await?.iter() {
//!         println!("{} {}", column.name, column.full_type_name());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cached;
pub mod config;
pub mod error;
pub mod event;
pub mod generic;
pub mod monitor;
pub mod object_cache;
pub mod row;
pub mod session;
pub mod store;
pub mod struct_cache;
pub mod r#trait;

// Re-exports
pub use cached::{CachedCatalog, IndexCache, TableCache};
pub use config::CacheConfig;
pub use error::{CatalogError, CatalogResult, DriverError, DriverResult};
pub use event::{CatalogEvent, EventAction, EventSink, SharedEventSink};
pub use generic::{
    GenericColumnFetcher, GenericIndexFetcher, GenericSchemaFetcher, GenericTableFetcher,
};
pub use monitor::{CancelableMonitor, NullProgressMonitor, ProgressMonitor, check_canceled};
pub use object_cache::{ObjectCache, ObjectFetcher};
pub use row::{Row, Value};
pub use session::{
    DataSource, MetaQuery, ResultCursor, ScopedStatement, Session, SessionPurpose, Statement,
};
pub use store::{
    DiscardListener, LoadState, ObjectContainer, ObjectList, ObjectStore, RefreshDiff,
};
pub use struct_cache::{ChildFetcher, ChildrenCache, DependentCache, StructCache};
pub use r#trait::Catalog;
