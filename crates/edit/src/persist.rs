// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Persist actions
//!
//! A [`PersistAction`] is one DDL statement (or a no-op marker) with a
//! display title and an optional completion callback. Commands produce them;
//! the [`crate::ObjectManager`] executes them and reports the outcome back
//! through the callback.

use crate::command::CommandKind;
use serde::Serialize;
use sqlmeta_cache::CatalogError;
use std::fmt;

/// How the executor treats an action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ActionType {
    /// Failure aborts the command
    #[default]
    Normal,
    /// Failure is logged and ignored
    Optional,
    /// Script annotation, never executed
    Comment,
}

/// Callback invoked once with the outcome of an action
pub type CompletionCallback = Box<dyn FnOnce(Option<&CatalogError>) + Send>;

/// One statement of a command's persist script
pub struct PersistAction {
    title: String,
    script: Option<String>,
    action_type: ActionType,
    on_complete: Option<CompletionCallback>,
}

impl PersistAction {
    pub fn new(title: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            script: Some(script.into()),
            action_type: ActionType::Normal,
            on_complete: None,
        }
    }

    /// An action without a statement; executing it only fires the callback
    pub fn no_op(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            script: None,
            action_type: ActionType::Normal,
            on_complete: None,
        }
    }

    /// A script comment
    pub fn comment(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            script: Some(format!("-- {text}")),
            title: text,
            action_type: ActionType::Comment,
            on_complete: None,
        }
    }

    /// Builder method: set the action type
    pub fn with_type(mut self, action_type: ActionType) -> Self {
        self.action_type = action_type;
        self
    }

    /// Builder method: mark as optional
    pub fn optional(self) -> Self {
        self.with_type(ActionType::Optional)
    }

    /// Builder method: call `callback` with `None` on success or the error
    /// on failure
    pub fn with_completion<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Option<&CatalogError>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn is_no_op(&self) -> bool {
        self.script.is_none()
    }

    /// Fire the completion callback; later calls do nothing
    pub fn complete(&mut self, error: Option<&CatalogError>) {
        if let Some(callback) = self.on_complete.take() {
            callback(error);
        }
    }
}

impl fmt::Debug for PersistAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistAction")
            .field("title", &self.title)
            .field("script", &self.script)
            .field("action_type", &self.action_type)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}

/// A statement that ran successfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutedStatement {
    pub title: String,
    pub script: String,
}

/// Outcome of persisting one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub kind: CommandKind,
    pub executed: Vec<ExecutedStatement>,
    /// Optional actions whose failure was ignored
    pub ignored_failures: usize,
}

impl CommandReport {
    pub fn new(command: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            command: command.into(),
            kind,
            executed: Vec::new(),
            ignored_failures: 0,
        }
    }
}

/// Outcome of persisting a command context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub commands: Vec<CommandReport>,
}

impl PersistReport {
    /// Total number of executed statements
    pub fn statement_count(&self) -> usize {
        self.commands.iter().map(|c| c.executed.len()).sum()
    }

    /// Executed scripts in execution order
    pub fn scripts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .flat_map(|c| c.executed.iter().map(|s| s.script.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callback_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut action = PersistAction::new("Drop table t", "DROP TABLE t").with_completion(
            move |err| {
                assert!(err.is_none());
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        action.complete(None);
        action.complete(None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_comment_and_no_op() {
        let comment = PersistAction::comment("generated");
        assert_eq!(comment.script(), Some("-- generated"));
        assert_eq!(comment.action_type(), ActionType::Comment);

        let marker = PersistAction::no_op("Refresh");
        assert!(marker.is_no_op());
        assert_eq!(marker.action_type(), ActionType::Normal);
    }
}
