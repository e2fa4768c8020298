// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog object contract
//!
//! Every entity held by a cache implements [`CatalogObject`]. The mutators
//! exist for the command engine: an edit clones the cached value, changes it
//! and publishes the clone, so readers holding the previous `Arc` are never
//! affected.

use crate::path::ObjectPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ObjectKind {
    Database,
    Schema,
    Table,
    Column,
    Index,
    Other,
}

impl ObjectKind {
    /// Lower-case label used in messages and DDL titles
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Database => "database",
            ObjectKind::Schema => "schema",
            ObjectKind::Table => "table",
            ObjectKind::Column => "column",
            ObjectKind::Index => "index",
            ObjectKind::Other => "object",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A remote catalog entity
pub trait CatalogObject: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> ObjectKind;

    /// Name as reported by the server (or as typed by the user for new objects)
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    /// Path of the owning container
    fn parent(&self) -> &ObjectPath;

    fn set_parent(&mut self, parent: ObjectPath);

    /// False until the command that created the object has been persisted
    fn is_persisted(&self) -> bool;

    fn set_persisted(&mut self, persisted: bool);

    fn path(&self) -> ObjectPath {
        self.parent().child(self.name())
    }
}
