// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Object editors
//!
//! An [`ObjectEditor`] is the per-kind strategy behind commands: it states
//! which changes are possible, validates edited objects and renders the DDL
//! realising each change. One generic command engine serves every object
//! kind through this interface.

use crate::error::{EditError, EditResult};
use crate::persist::PersistAction;
use serde::Serialize;
use sqlmeta_cache::ObjectContainer;
use sqlmeta_model::{CatalogObject, ObjectKind};

/// Changes an editor can turn into DDL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EditorCapabilities {
    pub can_create: bool,
    pub can_alter: bool,
    pub can_rename: bool,
    pub can_delete: bool,
}

impl EditorCapabilities {
    pub const ALL: EditorCapabilities = EditorCapabilities {
        can_create: true,
        can_alter: true,
        can_rename: true,
        can_delete: true,
    };

    pub const CREATE_DROP: EditorCapabilities = EditorCapabilities {
        can_create: true,
        can_alter: false,
        can_rename: false,
        can_delete: true,
    };
}

/// DDL strategy for one kind of catalog object
pub trait ObjectEditor<T: CatalogObject>: Send + Sync {
    fn capabilities(&self) -> EditorCapabilities;

    /// Reject objects the server would refuse
    fn validate(&self, object: &T) -> EditResult<()> {
        if object.name().trim().is_empty() {
            return Err(EditError::Validation(format!(
                "{} name must not be empty",
                object.kind()
            )));
        }
        Ok(())
    }

    /// Whether create commands of this editor aggregate later edits of the
    /// created object
    fn aggregates(&self) -> bool {
        false
    }

    /// Whether an aggregating create also absorbs later commands on objects
    /// of `kind` below the created object
    fn absorbs(&self, _kind: ObjectKind) -> bool {
        false
    }

    fn create_actions(&self, object: &T) -> EditResult<Vec<PersistAction>> {
        Err(unsupported("create", object))
    }

    fn alter_actions(&self, old: &T, _new: &T) -> EditResult<Vec<PersistAction>> {
        Err(unsupported("alter", old))
    }

    fn rename_actions(&self, object: &T, _new_name: &str) -> EditResult<Vec<PersistAction>> {
        Err(unsupported("rename", object))
    }

    fn delete_actions(&self, object: &T) -> EditResult<Vec<PersistAction>> {
        Err(unsupported("drop", object))
    }
}

fn unsupported<T: CatalogObject>(what: &str, object: &T) -> EditError {
    EditError::NotSupported(format!("cannot {what} {} '{}'", object.kind(), object.name()))
}

/// First of `base`, `base_1`, `base_2`, ... not used in `container`
pub fn unique_name<T: CatalogObject>(container: &dyn ObjectContainer<T>, base: &str) -> String {
    if container.cached_object(base).is_none() {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| container.cached_object(candidate).is_none())
        .unwrap_or_else(|| base.to_string())
}
