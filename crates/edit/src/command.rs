// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Commands
//!
//! A [`Command`] is one undoable edit of one catalog object. It mutates the
//! in-memory model when executed ([`Command::update_model`]) and renders
//! the DDL that makes the server match ([`Command::persist_actions`]).
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──update_model──▶ Applied ──persist ok──▶ Persisted
//!                            │   ▲   └─persist failed─▶ RolledBack
//!                       undo │   │ redo
//!                            ▼   │
//!                            Undone
//! ```
//!
//! ## Aggregation
//!
//! A create command whose editor aggregates is an aggregator: while its
//! object is not persisted it absorbs later commands on the object (and, if
//! the editor allows it, on the object's children). Absorbed commands still change the model but emit
//! no DDL of their own; the CREATE statement is rendered from the object's
//! final in-memory state instead.

use crate::change::ModelChange;
use crate::editor::ObjectEditor;
use crate::error::{EditError, EditResult};
use crate::persist::PersistAction;
use serde::Serialize;
use sqlmeta_cache::ObjectContainer;
use sqlmeta_model::{CatalogObject, ObjectKind, ObjectPath};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What a command does to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandKind {
    Create,
    Alter,
    Rename,
    Delete,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CommandKind::Create => "create",
            CommandKind::Alter => "alter",
            CommandKind::Rename => "rename",
            CommandKind::Delete => "drop",
        };
        f.write_str(label)
    }
}

/// Position of a command in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandState {
    Created,
    Applied,
    Persisted,
    RolledBack,
    Undone,
}

/// An undoable unit of model mutation
pub trait Command: Send + Sync {
    fn title(&self) -> &str;

    fn kind(&self) -> CommandKind;

    /// Kind of the edited object
    fn target_kind(&self) -> ObjectKind;

    /// Path of the edited object, as seen when the command was built
    fn target_path(&self) -> ObjectPath;

    /// New name, for rename commands
    fn new_name(&self) -> Option<&str> {
        None
    }

    fn state(&self) -> CommandState;

    fn set_state(&mut self, state: CommandState);

    /// Apply the change to the in-memory model. Must be idempotent so that
    /// redo can re-run it.
    fn update_model(&mut self) -> EditResult<()>;

    /// Exactly revert [`Command::update_model`]
    fn undo_model(&mut self) -> EditResult<()>;

    /// Ordered DDL realising this command
    fn persist_actions(&self) -> EditResult<Vec<PersistAction>>;

    /// Called once the command's DDL ran successfully
    fn on_persisted(&mut self) {}

    fn is_aggregator(&self) -> bool {
        false
    }

    /// Offer a later command to this aggregator; `true` means it was
    /// absorbed and must not be persisted on its own
    fn aggregate_command(&mut self, _command: &dyn Command) -> bool {
        false
    }

    /// Forget everything absorbed so far
    fn reset_aggregated_commands(&mut self) {}
}

/// Generic command over any cached object kind
///
/// The model change is applied to `container`; DDL comes from `editor`.
pub struct ObjectCommand<T> {
    title: String,
    kind: CommandKind,
    subject: Arc<T>,
    change: ModelChange<T>,
    container: Arc<dyn ObjectContainer<T>>,
    editor: Arc<dyn ObjectEditor<T>>,
    state: CommandState,
    // Aggregator bookkeeping: current name and path of the created object
    // after absorbed renames.
    current_name: String,
    current_path: ObjectPath,
    absorbed: usize,
}

impl<T: CatalogObject> ObjectCommand<T> {
    fn build(
        kind: CommandKind,
        subject: Arc<T>,
        change: ModelChange<T>,
        container: Arc<dyn ObjectContainer<T>>,
        editor: Arc<dyn ObjectEditor<T>>,
    ) -> Self {
        let title = format!("{} {} {}", capitalize(kind), subject.kind(), subject.path());
        Self {
            title,
            kind,
            current_name: subject.name().to_string(),
            current_path: subject.path(),
            subject,
            change,
            container,
            editor,
            state: CommandState::Created,
            absorbed: 0,
        }
    }

    /// Create `object`; it is marked unpersisted until the command persists
    pub fn create(
        container: Arc<dyn ObjectContainer<T>>,
        editor: Arc<dyn ObjectEditor<T>>,
        mut object: T,
    ) -> EditResult<Self> {
        require(editor.capabilities().can_create, CommandKind::Create, &object)?;
        editor.validate(&object)?;
        if container.cached_object(object.name()).is_some() {
            return Err(EditError::Validation(format!(
                "{} '{}' already exists",
                object.kind(),
                object.name()
            )));
        }
        object.set_persisted(false);
        let object = Arc::new(object);
        let change = ModelChange::Add {
            object: object.clone(),
            position: None,
        };
        Ok(Self::build(CommandKind::Create, object, change, container, editor))
    }

    /// Replace `old` by `new` (same name)
    pub fn alter(
        container: Arc<dyn ObjectContainer<T>>,
        editor: Arc<dyn ObjectEditor<T>>,
        old: Arc<T>,
        mut new: T,
    ) -> EditResult<Self> {
        require(editor.capabilities().can_alter || !old.is_persisted(), CommandKind::Alter, &*old)?;
        if new.name() != old.name() {
            return Err(EditError::Validation(format!(
                "alter cannot change the name of '{}'; use a rename command",
                old.name()
            )));
        }
        editor.validate(&new)?;
        new.set_persisted(old.is_persisted());
        let change = ModelChange::Replace {
            old: old.clone(),
            new: Arc::new(new),
        };
        Ok(Self::build(CommandKind::Alter, old, change, container, editor))
    }

    /// Rename `object` to `new_name`
    pub fn rename(
        container: Arc<dyn ObjectContainer<T>>,
        editor: Arc<dyn ObjectEditor<T>>,
        object: Arc<T>,
        new_name: &str,
    ) -> EditResult<Self> {
        require(
            editor.capabilities().can_rename || !object.is_persisted(),
            CommandKind::Rename,
            &*object,
        )?;
        let mut renamed = (*object).clone();
        renamed.set_name(new_name.to_string());
        editor.validate(&renamed)?;
        if let Some(existing) = container.cached_object(new_name) {
            if existing.name() != object.name() {
                return Err(EditError::Validation(format!(
                    "{} '{}' already exists",
                    object.kind(),
                    new_name
                )));
            }
        }
        let change = ModelChange::Rename {
            from: object.name().to_string(),
            to: new_name.to_string(),
        };
        let mut command = Self::build(CommandKind::Rename, object, change, container, editor);
        command.current_name = new_name.to_string();
        Ok(command)
    }

    /// Drop `object`
    pub fn delete(
        container: Arc<dyn ObjectContainer<T>>,
        editor: Arc<dyn ObjectEditor<T>>,
        object: Arc<T>,
    ) -> EditResult<Self> {
        require(
            editor.capabilities().can_delete || !object.is_persisted(),
            CommandKind::Delete,
            &*object,
        )?;
        let change = ModelChange::Remove {
            object: object.clone(),
            position: None,
        };
        Ok(Self::build(CommandKind::Delete, object, change, container, editor))
    }

    /// The object as it was when the command was built
    pub fn subject(&self) -> &Arc<T> {
        &self.subject
    }

    /// Number of commands absorbed by this aggregator
    pub fn absorbed_count(&self) -> usize {
        self.absorbed
    }

    /// The created object in its current in-memory state
    fn created_object(&self) -> Option<Arc<T>> {
        self.container.cached_object(&self.current_name)
    }
}

fn capitalize(kind: CommandKind) -> String {
    let label = kind.to_string();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => label,
    }
}

fn require<T: CatalogObject>(allowed: bool, kind: CommandKind, object: &T) -> EditResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(EditError::NotSupported(format!(
            "cannot {kind} {} '{}'",
            object.kind(),
            object.name()
        )))
    }
}

impl<T: CatalogObject> Command for ObjectCommand<T> {
    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> CommandKind {
        self.kind
    }

    fn target_kind(&self) -> ObjectKind {
        self.subject.kind()
    }

    fn target_path(&self) -> ObjectPath {
        self.subject.path()
    }

    fn new_name(&self) -> Option<&str> {
        match &self.change {
            ModelChange::Rename { to, .. } => Some(to.as_str()),
            _ => None,
        }
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn set_state(&mut self, state: CommandState) {
        self.state = state;
    }

    fn update_model(&mut self) -> EditResult<()> {
        self.change.apply(self.container.as_ref())?;
        self.state = CommandState::Applied;
        Ok(())
    }

    fn undo_model(&mut self) -> EditResult<()> {
        let mut inverse = self.change.inverse();
        inverse.apply(self.container.as_ref())?;
        self.state = CommandState::Undone;
        Ok(())
    }

    fn persist_actions(&self) -> EditResult<Vec<PersistAction>> {
        match (&self.change, self.kind) {
            (_, CommandKind::Create) => match self.created_object() {
                Some(object) => self.editor.create_actions(&object),
                // created and dropped again before persisting
                None => Ok(Vec::new()),
            },
            (ModelChange::Replace { old, new }, _) => {
                if old == new {
                    Ok(Vec::new())
                } else {
                    self.editor.alter_actions(old, new)
                }
            }
            (ModelChange::Rename { to, .. }, _) => self.editor.rename_actions(&self.subject, to),
            (ModelChange::Remove { object, .. }, _) => self.editor.delete_actions(object),
            (ModelChange::Add { .. }, _) => Err(EditError::InvalidState(format!(
                "'{}' adds an object without being a create command",
                self.title
            ))),
        }
    }

    fn on_persisted(&mut self) {
        self.state = CommandState::Persisted;
        let name = match &self.change {
            ModelChange::Remove { .. } => return,
            ModelChange::Rename { to, .. } => to.as_str(),
            ModelChange::Replace { new, .. } => new.name(),
            ModelChange::Add { .. } => self.current_name.as_str(),
        };
        match self.container.cached_object(name) {
            Some(object) if !object.is_persisted() => {
                let mut persisted = (*object).clone();
                persisted.set_persisted(true);
                self.container.replace_object(name, Arc::new(persisted));
            }
            _ => {}
        }
    }

    fn is_aggregator(&self) -> bool {
        self.kind == CommandKind::Create && self.editor.aggregates()
    }

    fn aggregate_command(&mut self, command: &dyn Command) -> bool {
        if !self.is_aggregator() || self.state == CommandState::Persisted {
            return false;
        }
        let path = command.target_path();
        if !path.is_within(&self.current_path) {
            return false;
        }
        let own_object = path == self.current_path;
        if !own_object && !self.editor.absorbs(command.target_kind()) {
            return false;
        }
        if own_object && command.kind() == CommandKind::Rename {
            if let Some(new_name) = command.new_name() {
                self.current_name = new_name.to_string();
                self.current_path = self.subject.parent().child(new_name);
            }
        }
        self.absorbed += 1;
        debug!("'{}' absorbed '{}'", self.title, command.title());
        true
    }

    fn reset_aggregated_commands(&mut self) {
        self.current_name = self.subject.name().to_string();
        self.current_path = self.subject.path();
        self.absorbed = 0;
    }
}
