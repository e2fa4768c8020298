// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmeta - Catalog Object Model
//!
//! This crate defines the entities that the metadata cache stores and the
//! DDL command engine edits:
//!
//! - [`TypedObject`] and [`DataKind`]: the typed-value contract shared by
//!   columns, attributes and data types
//! - [`CatalogObject`] and [`ObjectPath`]: identity of a remote catalog entity
//! - [`Database`], [`Schema`], [`Table`], [`Column`], [`Index`]: the generic
//!   entity set used by the `information_schema` fetchers and SQL editors
//! - [`Dialect`]: identifier storage case and quoting rules
//!
//! The model is deliberately passive. Entities are plain values that are
//! shared as `Arc<T>` by caches; edits clone, mutate and re-publish them.

pub mod dialect;
pub mod kind;
pub mod metadata;
pub mod object;
pub mod path;

// Re-export commonly used types
pub use dialect::{Dialect, DialectFamily, DialectFeature, IdentifierCase};
pub use kind::{DataKind, TypedObject, split_type_modifiers, sql_types};
pub use metadata::{Column, Database, Index, Schema, Table, TableType};
pub use object::{CatalogObject, ObjectKind};
pub use path::ObjectPath;
