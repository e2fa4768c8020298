// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Session capabilities
//!
//! The cache and the persist-action executor never talk to a driver
//! directly. They use the capabilities below, which the hosting application
//! implements on top of its connection layer:
//!
//! - [`DataSource`]: opens sessions for a purpose (metadata reads, DDL)
//! - [`Session`]: prepares statements
//! - [`Statement`]: binds parameters, executes, is closed exactly once
//! - [`ResultCursor`]: streams [`Row`]s
//!
//! [`ScopedStatement`] guarantees the close: it releases the statement when
//! dropped, whatever path the caller leaves by.

use crate::error::DriverResult;
use crate::row::{Row, Value};
use async_trait::async_trait;
use serde::Serialize;
use sqlmeta_model::Dialect;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::trace;

/// Why a session is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionPurpose {
    /// Catalog metadata reads
    Meta,
    /// DDL and other utility statements
    Util,
    /// Statements typed by the user
    UserScript,
}

/// A parameterised metadata query
#[derive(Debug, Clone, PartialEq)]
pub struct MetaQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl MetaQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Builder method: append a positional parameter
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Forward-only cursor over query results
#[async_trait]
pub trait ResultCursor: Send {
    /// Next row, or `None` when exhausted
    async fn next_row(&mut self) -> DriverResult<Option<Row>>;
}

/// A prepared statement
///
/// Closing a statement also releases any cursor it produced.
#[async_trait]
pub trait Statement: Send {
    fn sql(&self) -> &str;

    /// Bind a 1-based positional parameter
    fn bind(&mut self, index: usize, value: Value) -> DriverResult<()>;

    async fn execute_query(&mut self) -> DriverResult<Box<dyn ResultCursor>>;

    /// Execute DDL/DML, returning the affected row count
    async fn execute_update(&mut self) -> DriverResult<u64>;

    fn close(&mut self);
}

/// A live session on a data source
#[async_trait]
pub trait Session: Send + Sync {
    fn purpose(&self) -> SessionPurpose;

    async fn prepare(&self, sql: &str) -> DriverResult<Box<dyn Statement>>;
}

/// Connection capability of a configured database
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    fn dialect(&self) -> Dialect;

    async fn open_session(&self, purpose: SessionPurpose) -> DriverResult<Arc<dyn Session>>;
}

/// A statement that is closed when the guard goes out of scope
pub struct ScopedStatement {
    inner: Box<dyn Statement>,
}

impl ScopedStatement {
    /// Prepare `sql` on `session`
    pub async fn prepare(session: &dyn Session, sql: &str) -> DriverResult<Self> {
        let inner = session.prepare(sql).await?;
        trace!("prepared statement: {}", sql);
        Ok(Self { inner })
    }

    /// Prepare a metadata query and bind its parameters
    pub async fn prepare_query(session: &dyn Session, query: &MetaQuery) -> DriverResult<Self> {
        let mut stmt = Self::prepare(session, &query.sql).await?;
        for (idx, value) in query.params.iter().enumerate() {
            stmt.bind(idx + 1, value.clone())?;
        }
        Ok(stmt)
    }
}

impl Deref for ScopedStatement {
    type Target = dyn Statement;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for ScopedStatement {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for ScopedStatement {
    fn drop(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStatement {
        closed: Arc<AtomicUsize>,
        bound: Vec<Value>,
    }

    #[async_trait]
    impl Statement for CountingStatement {
        fn sql(&self) -> &str {
            "SELECT 1"
        }

        fn bind(&mut self, _index: usize, value: Value) -> DriverResult<()> {
            self.bound.push(value);
            Ok(())
        }

        async fn execute_query(&mut self) -> DriverResult<Box<dyn ResultCursor>> {
            Err(crate::error::DriverError::new("not a query"))
        }

        async fn execute_update(&mut self) -> DriverResult<u64> {
            Ok(self.bound.len() as u64)
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingSession {
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Session for CountingSession {
        fn purpose(&self) -> SessionPurpose {
            SessionPurpose::Meta
        }

        async fn prepare(&self, _sql: &str) -> DriverResult<Box<dyn Statement>> {
            Ok(Box::new(CountingStatement {
                closed: self.closed.clone(),
                bound: Vec::new(),
            }))
        }
    }

    #[tokio::test]
    async fn test_scoped_statement_closes_on_drop() {
        let closed = Arc::new(AtomicUsize::new(0));
        let session = CountingSession {
            closed: closed.clone(),
        };
        let query = MetaQuery::new("SELECT 1").bind("a").bind(2);
        {
            let mut stmt = ScopedStatement::prepare_query(&session, &query).await.unwrap();
            assert_eq!(stmt.execute_update().await.unwrap(), 2);
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scoped_statement_closes_on_error_path() {
        let closed = Arc::new(AtomicUsize::new(0));
        let session = CountingSession {
            closed: closed.clone(),
        };
        let result: DriverResult<()> = async {
            let mut stmt = ScopedStatement::prepare(&session, "SELECT 1").await?;
            stmt.execute_query().await?;
            Ok(())
        }
        .await;
        assert!(result.is_err());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
