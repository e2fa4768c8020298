// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Object manager
//!
//! Executes persist actions against a live session.
//!
//! ## Executing one action
//!
//! 1. No script: fire the completion callback, nothing else
//! 2. Comment: skipped, callback fired
//! 3. Otherwise prepare a scoped statement, execute it, release it, then
//!    fire the callback with the outcome
//! 4. Failures are rethrown as `CatalogError::DataAccess`, except for
//!    optional actions whose failure is logged and ignored
//!
//! Actions of one command run strictly in order; the first failure stops
//! the command and the remaining actions never run.

use crate::command::Command;
use crate::error::EditResult;
use crate::persist::{ActionType, CommandReport, ExecutedStatement, PersistAction};
use sqlmeta_cache::{
    CatalogError, CatalogResult, DataSource, DriverResult, ProgressMonitor, ScopedStatement,
    Session, SessionPurpose, check_canceled,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one persist action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Executed(ExecutedStatement),
    /// No-op marker or comment
    Skipped,
    /// Optional action that failed
    IgnoredFailure,
}

/// Persist-action executor bound to one data source
pub struct ObjectManager {
    source: Arc<dyn DataSource>,
}

impl ObjectManager {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    /// Open the utility session DDL runs on
    pub async fn open_session(&self) -> CatalogResult<Arc<dyn Session>> {
        self.source
            .open_session(SessionPurpose::Util)
            .await
            .map_err(|e| CatalogError::data_access("Open DDL session", e))
    }

    /// Execute one action of `command_title` on `session`
    pub async fn execute_persist_action(
        &self,
        monitor: &dyn ProgressMonitor,
        session: &dyn Session,
        command_title: &str,
        mut action: PersistAction,
    ) -> CatalogResult<ActionOutcome> {
        let script = match (action.script(), action.action_type()) {
            (None, _) | (_, ActionType::Comment) => {
                debug!("Skipping '{}'", action.title());
                action.complete(None);
                return Ok(ActionOutcome::Skipped);
            }
            (Some(script), _) => script.to_string(),
        };

        if let Err(err) = check_canceled(monitor) {
            action.complete(Some(&err));
            return Err(err);
        }
        monitor.sub_task(action.title());
        info!("Executing '{}': {}", action.title(), script);

        match run_statement(session, &script).await {
            Ok(_) => {
                action.complete(None);
                Ok(ActionOutcome::Executed(ExecutedStatement {
                    title: action.title().to_string(),
                    script,
                }))
            }
            Err(driver_error) => {
                let err = CatalogError::data_access(
                    format!("{command_title}: {}", action.title()),
                    driver_error,
                );
                action.complete(Some(&err));
                if action.action_type() == ActionType::Optional {
                    warn!("Ignoring failure of optional action: {}", err);
                    Ok(ActionOutcome::IgnoredFailure)
                } else {
                    warn!("Persist action failed: {}", err);
                    Err(err)
                }
            }
        }
    }

    /// Execute every action of `command` in order
    pub async fn execute_command(
        &self,
        monitor: &dyn ProgressMonitor,
        session: &dyn Session,
        command: &dyn Command,
    ) -> EditResult<CommandReport> {
        let actions = command.persist_actions()?;
        let mut report = CommandReport::new(command.title(), command.kind());
        monitor.begin_task(command.title(), actions.len() as u64);

        for action in actions {
            match self
                .execute_persist_action(monitor, session, command.title(), action)
                .await?
            {
                ActionOutcome::Executed(statement) => report.executed.push(statement),
                ActionOutcome::IgnoredFailure => report.ignored_failures += 1,
                ActionOutcome::Skipped => {}
            }
            monitor.worked(1);
        }
        monitor.done();
        Ok(report)
    }
}

// The statement is released before the caller fires the completion callback.
async fn run_statement(session: &dyn Session, script: &str) -> DriverResult<u64> {
    let mut stmt = ScopedStatement::prepare(session, script).await?;
    stmt.execute_update().await
}
