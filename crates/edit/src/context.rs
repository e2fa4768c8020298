// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Command context
//!
//! Ordered queue of applied commands with undo/redo, aggregation and
//! persistence.
//!
//! ## Aggregation
//!
//! Only the first command of a context may be an aggregator. After every
//! change of the queue the aggregator is reset and offered each later
//! command again; absorbed commands emit no DDL of their own.
//!
//! ## Persisting
//!
//! Non-absorbed commands run in queue order on one utility session. A
//! command that persisted leaves the queue (together with everything it
//! absorbed) and cannot be undone any more. The first failure stops the
//! run: commands persisted before it stay persisted, and unless
//! [`EditConfig::revert_on_failure`] is set the failing command stays
//! applied in memory.

use crate::command::{Command, CommandState};
use crate::config::EditConfig;
use crate::error::{EditError, EditResult};
use crate::manager::ObjectManager;
use crate::persist::{ActionType, PersistAction, PersistReport};
use sqlmeta_cache::{ProgressMonitor, check_canceled};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct CommandEntry {
    command: Box<dyn Command>,
    absorbed: bool,
}

/// Undoable queue of pending edits for one data source
pub struct CommandContext {
    manager: Arc<ObjectManager>,
    config: EditConfig,
    entries: Vec<CommandEntry>,
    redo_stack: Vec<Box<dyn Command>>,
    last_report: Option<PersistReport>,
}

impl CommandContext {
    pub fn new(manager: Arc<ObjectManager>, config: EditConfig) -> Self {
        Self {
            manager,
            config,
            entries: Vec::new(),
            redo_stack: Vec::new(),
            last_report: None,
        }
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<ObjectManager> {
        &self.manager
    }

    /// Apply `command` to the model and queue it
    pub fn execute_command<C: Command + 'static>(&mut self, command: C) -> EditResult<()> {
        self.execute_boxed(Box::new(command))
    }

    pub fn execute_boxed(&mut self, mut command: Box<dyn Command>) -> EditResult<()> {
        if command.is_aggregator() && !self.entries.is_empty() {
            let blocking = self
                .entries
                .iter()
                .find(|e| e.command.is_aggregator())
                .unwrap_or(&self.entries[0]);
            return Err(EditError::CommandConflict(format!(
                "'{}' must be the first command of a context, but '{}' is pending",
                command.title(),
                blocking.command.title()
            )));
        }

        command.update_model()?;
        debug!("Executed '{}'", command.title());
        self.entries.push(CommandEntry {
            command,
            absorbed: false,
        });
        self.redo_stack.clear();
        self.refresh_command_state();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_title(&self) -> Option<&str> {
        self.entries.last().map(|e| e.command.title())
    }

    pub fn redo_title(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.title())
    }

    /// Revert the most recent command; returns its title
    pub fn undo(&mut self) -> EditResult<Option<String>> {
        let Some(mut entry) = self.entries.pop() else {
            return Ok(None);
        };
        if let Err(err) = entry.command.undo_model() {
            self.entries.push(entry);
            return Err(err);
        }
        let title = entry.command.title().to_string();
        debug!("Undone '{}'", title);
        self.redo_stack.push(entry.command);
        self.refresh_command_state();
        Ok(Some(title))
    }

    /// Re-apply the most recently undone command; returns its title
    pub fn redo(&mut self) -> EditResult<Option<String>> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(None);
        };
        if let Err(err) = command.update_model() {
            self.redo_stack.push(command);
            return Err(err);
        }
        let title = command.title().to_string();
        debug!("Redone '{}'", title);
        self.entries.push(CommandEntry {
            command,
            absorbed: false,
        });
        self.refresh_command_state();
        Ok(Some(title))
    }

    /// Queued commands in execution order
    pub fn pending_commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.entries.iter().map(|e| e.command.as_ref())
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_dirty(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Whether the command at `index` was absorbed by the aggregator
    pub fn is_absorbed(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|e| e.absorbed)
    }

    /// The actions [`CommandContext::persist`] would execute
    pub fn persist_actions(&self) -> EditResult<Vec<PersistAction>> {
        let mut actions = Vec::new();
        for entry in self.entries.iter().filter(|e| !e.absorbed) {
            actions.extend(
                entry
                    .command
                    .persist_actions()?
                    .into_iter()
                    .filter(|a| self.keeps(a)),
            );
        }
        Ok(actions)
    }

    /// Preview of the persist script
    pub fn script(&self) -> EditResult<String> {
        let statements: Vec<String> = self
            .persist_actions()?
            .iter()
            .filter_map(|a| a.script())
            .map(|s| {
                if s.starts_with("--") {
                    s.to_string()
                } else {
                    format!("{s};")
                }
            })
            .collect();
        Ok(statements.join("\n"))
    }

    /// Report of the most recent persist, including partial runs
    pub fn last_report(&self) -> Option<&PersistReport> {
        self.last_report.as_ref()
    }

    /// Execute the DDL of all pending commands
    pub async fn persist(&mut self, monitor: &dyn ProgressMonitor) -> EditResult<PersistReport> {
        if self.entries.is_empty() {
            return Ok(PersistReport::default());
        }
        let manager = self.manager.clone();
        let session = manager.open_session().await?;
        let mut entries = std::mem::take(&mut self.entries);
        let mut persisted = vec![false; entries.len()];
        let mut report = PersistReport::default();
        self.redo_stack.clear();

        info!("Persisting {} command(s)", entries.len());
        let mut failure = None;
        for index in 0..entries.len() {
            if entries[index].absorbed {
                continue;
            }
            if let Err(err) = check_canceled(monitor) {
                failure = Some(EditError::from(err));
                break;
            }
            let result = manager
                .execute_command(monitor, session.as_ref(), entries[index].command.as_ref())
                .await;
            match result {
                Ok(command_report) => {
                    report.commands.push(command_report);
                    entries[index].command.on_persisted();
                    persisted[index] = true;
                    if entries[index].command.is_aggregator() {
                        for (offset, follower) in entries.iter_mut().enumerate().skip(index + 1) {
                            if follower.absorbed {
                                follower.command.on_persisted();
                                persisted[offset] = true;
                            }
                        }
                    }
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        let mut remaining: Vec<CommandEntry> = entries
            .into_iter()
            .zip(persisted)
            .filter_map(|(entry, done)| (!done).then_some(entry))
            .collect();

        let Some(err) = failure else {
            info!("Persisted {} statement(s)", report.statement_count());
            self.last_report = Some(report.clone());
            return Ok(report);
        };

        if !err.is_canceled() {
            self.mark_failed(&mut remaining);
        }
        self.entries = remaining;
        self.refresh_command_state();
        self.last_report = Some(report);
        Err(err)
    }

    // Everything queued before the failed command persisted, so it is the
    // first remaining entry that was not absorbed.
    fn mark_failed(&self, remaining: &mut Vec<CommandEntry>) {
        let Some(failed_at) = remaining.iter().position(|e| !e.absorbed) else {
            return;
        };
        let failed = &remaining[failed_at];
        warn!("Persisting '{}' failed", failed.command.title());
        if !self.config.revert_on_failure {
            return;
        }

        let mut group: Vec<usize> = vec![failed_at];
        if remaining[failed_at].command.is_aggregator() {
            group.extend(
                remaining
                    .iter()
                    .enumerate()
                    .skip(failed_at + 1)
                    .filter(|(_, e)| e.absorbed)
                    .map(|(i, _)| i),
            );
        }
        for &index in group.iter().rev() {
            let command = &mut remaining[index].command;
            match command.undo_model() {
                Ok(()) => {
                    command.set_state(CommandState::RolledBack);
                    info!("Reverted '{}'", command.title());
                }
                Err(err) => warn!("Cannot revert '{}': {}", command.title(), err),
            }
        }
        for &index in group.iter().rev() {
            remaining.remove(index);
        }
    }

    /// Undo every pending command, newest first, and clear the context
    pub fn reset(&mut self) -> EditResult<()> {
        let mut first_error = None;
        while let Some(mut entry) = self.entries.pop() {
            if let Err(err) = entry.command.undo_model() {
                warn!("Cannot undo '{}': {}", entry.command.title(), err);
                first_error.get_or_insert(err);
            }
        }
        self.redo_stack.clear();
        first_error.map_or(Ok(()), Err)
    }

    fn keeps(&self, action: &PersistAction) -> bool {
        !(self.config.skip_comment_actions && action.action_type() == ActionType::Comment)
    }

    fn refresh_command_state(&mut self) {
        for entry in &mut self.entries {
            entry.absorbed = false;
        }
        let Some((first, rest)) = self.entries.split_first_mut() else {
            return;
        };
        if !first.command.is_aggregator() {
            return;
        }
        first.command.reset_aggregated_commands();
        for entry in rest {
            entry.absorbed = first.command.aggregate_command(entry.command.as_ref());
        }
    }
}
