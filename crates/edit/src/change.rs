// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Model changes
//!
//! The in-memory half of a command: a mutation of an [`ObjectContainer`]
//! together with its exact inverse. Undo applies [`ModelChange::inverse`];
//! since containers notify their listeners on every mutation, undoing an
//! add fires a remove and vice versa.

use crate::error::{EditError, EditResult};
use sqlmeta_cache::ObjectContainer;
use sqlmeta_model::CatalogObject;
use std::sync::Arc;

/// A reversible mutation of a cached object collection
#[derive(Debug, Clone)]
pub enum ModelChange<T> {
    /// Insert `object`, at `position` when known
    Add {
        object: Arc<T>,
        position: Option<usize>,
    },
    /// Remove `object`; `position` is recorded when applied
    Remove {
        object: Arc<T>,
        position: Option<usize>,
    },
    /// Swap `old` for `new` in place
    Replace { old: Arc<T>, new: Arc<T> },
    /// Change the name of the object named `from`
    Rename { from: String, to: String },
}

impl<T: CatalogObject> ModelChange<T> {
    /// Apply to `container`
    ///
    /// Applying the same change twice leaves the container as after the
    /// first application.
    pub fn apply(&mut self, container: &dyn ObjectContainer<T>) -> EditResult<()> {
        match self {
            ModelChange::Add { object, position } => {
                match position {
                    Some(index) => container.insert_object_at(*index, object.clone()),
                    None => {
                        container.cache_object(object.clone());
                    }
                }
                Ok(())
            }
            ModelChange::Remove { object, position } => {
                if let Some(index) = container.position_of(object.name()) {
                    *position = Some(index);
                    container.remove_object(object.name());
                }
                Ok(())
            }
            ModelChange::Replace { old, new } => {
                let current = if container.cached_object(old.name()).is_some() {
                    old.name()
                } else {
                    new.name()
                };
                if container.replace_object(current, new.clone()) {
                    Ok(())
                } else {
                    Err(EditError::InvalidState(format!(
                        "{} '{}' is no longer cached",
                        old.kind(),
                        old.name()
                    )))
                }
            }
            ModelChange::Rename { from, to } => {
                if container.cached_object(to.as_str()).is_some()
                    && container.cached_object(from.as_str()).is_none()
                {
                    return Ok(());
                }
                let existing = container.cached_object(from.as_str()).ok_or_else(|| {
                    EditError::InvalidState(format!("'{from}' is no longer cached"))
                })?;
                let mut renamed = (*existing).clone();
                renamed.set_name(to.clone());
                container.replace_object(from, Arc::new(renamed));
                Ok(())
            }
        }
    }

    /// The change that reverts this one
    pub fn inverse(&self) -> ModelChange<T> {
        match self {
            ModelChange::Add { object, position } => ModelChange::Remove {
                object: object.clone(),
                position: *position,
            },
            ModelChange::Remove { object, position } => ModelChange::Add {
                object: object.clone(),
                position: *position,
            },
            ModelChange::Replace { old, new } => ModelChange::Replace {
                old: new.clone(),
                new: old.clone(),
            },
            ModelChange::Rename { from, to } => ModelChange::Rename {
                from: to.clone(),
                to: from.clone(),
            },
        }
    }
}
