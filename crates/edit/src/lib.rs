// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmeta - DDL Commands
//!
//! Undoable edits of cached catalog objects and their translation into
//! ordered DDL.
//!
//! ## Architecture
//!
//! - [`ObjectEditor`]: per-kind strategy (capabilities, validation, DDL)
//! - [`ObjectCommand`]: one edit, applied to an object container and
//!   reversible through [`ModelChange::inverse`]
//! - [`CommandContext`]: ordered queue with undo/redo and aggregation of
//!   edits on freshly created objects
//! - [`ObjectManager`]: executes [`PersistAction`]s on a utility session
//!
//! ## Usage
//!
//! ```rust,ignore
//! let tables = catalog.table_cache(&schema);
//! let editor: Arc<dyn ObjectEditor<Table>> = Arc::new(TableEditor::new(dialect, tables.clone()));
//!
//! let mut context = CommandContext::new(Arc::new(ObjectManager::new(source)), EditConfig::default());
//! context.execute_command(ObjectCommand::create(tables, editor, Table::new(&schema.path(), "draft"))?)?;
//! // ... add columns through the table's children cache ...
//! let report = context.persist(&NullProgressMonitor).await?;
//! ```

pub mod change;
pub mod command;
pub mod config;
pub mod context;
pub mod editor;
pub mod error;
pub mod manager;
pub mod persist;
pub mod sql;

pub use change::ModelChange;
pub use command::{Command, CommandKind, CommandState, ObjectCommand};
pub use config::EditConfig;
pub use context::CommandContext;
pub use editor::{EditorCapabilities, ObjectEditor, unique_name};
pub use error::{EditError, EditResult};
pub use manager::{ActionOutcome, ObjectManager};
pub use persist::{
    ActionType, CommandReport, CompletionCallback, ExecutedStatement, PersistAction, PersistReport,
};
pub use sql::{ColumnEditor, IndexEditor, TableEditor};
