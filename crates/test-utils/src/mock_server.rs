// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! In-memory metadata server for testing
//!
//! [`MockServer`] holds a scripted catalog (schemas, tables, columns,
//! indexes) and answers the queries issued by the generic
//! `information_schema` fetchers. Every executed statement is logged, so
//! tests can assert how many round trips a cache made and which DDL a
//! command context ran.

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlmeta_cache::{
    DataSource, DriverError, DriverResult, ResultCursor, Row, Session, SessionPurpose, Statement,
    Value,
};
use sqlmeta_model::{DataKind, Dialect, split_type_modifiers};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Column definition of a scripted table
#[derive(Debug, Clone)]
pub struct MockColumn {
    pub name: String,
    /// Declared type, modifiers included (`varchar(50)`)
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

impl MockColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
        }
    }

    /// Builder method: mark NOT NULL
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Builder method: set default expression
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Index definition of a scripted table
#[derive(Debug, Clone)]
pub struct MockIndex {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

impl MockIndex {
    pub fn new(name: impl Into<String>, unique: bool, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            unique,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Scripted table
#[derive(Debug, Clone)]
pub struct MockTable {
    pub name: String,
    /// `information_schema.tables.table_type` value
    pub table_type: String,
    pub columns: Vec<MockColumn>,
    pub indexes: Vec<MockIndex>,
}

impl MockTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: "BASE TABLE".to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// A view; views have columns but no indexes
    pub fn view(name: impl Into<String>) -> Self {
        Self {
            table_type: "VIEW".to_string(),
            ..Self::new(name)
        }
    }

    /// Builder method: append a column
    pub fn column(mut self, column: MockColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Builder method: append `(name, type)` columns
    pub fn columns(mut self, columns: &[(&str, &str)]) -> Self {
        self.columns
            .extend(columns.iter().map(|(name, ty)| MockColumn::new(*name, *ty)));
        self
    }

    /// Builder method: append an index
    pub fn index(mut self, index: MockIndex) -> Self {
        self.indexes.push(index);
        self
    }
}

#[derive(Debug, Clone)]
struct MockSchema {
    name: String,
    tables: Vec<MockTable>,
}

#[derive(Debug, Clone)]
struct FailureRule {
    pattern: String,
    error: DriverError,
    remaining: Option<usize>,
}

#[derive(Debug, Clone)]
struct ScriptedResponse {
    pattern: String,
    columns: Arc<[String]>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Default)]
struct ServerState {
    schemas: Vec<MockSchema>,
    responses: Vec<ScriptedResponse>,
    failures: Vec<FailureRule>,
    latency: Option<Duration>,
    queries: Vec<String>,
    updates: Vec<String>,
}

#[derive(Debug, Default)]
struct Counters {
    sessions: AtomicUsize,
    prepared: AtomicUsize,
    closed: AtomicUsize,
}

/// Scripted metadata server shared by all sessions of its data sources
#[derive(Debug, Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<ServerState>>,
    counters: Arc<Counters>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty schema (no-op if it exists)
    pub fn add_schema(&self, name: &str) -> &Self {
        let mut state = self.state.lock();
        if !state.schemas.iter().any(|s| s.name == name) {
            state.schemas.push(MockSchema {
                name: name.to_string(),
                tables: Vec::new(),
            });
        }
        self
    }

    /// Add or replace a table in `schema`, creating the schema if needed
    pub fn add_table(&self, schema: &str, table: MockTable) -> &Self {
        self.add_schema(schema);
        let mut state = self.state.lock();
        if let Some(owner) = state.schemas.iter_mut().find(|s| s.name == schema) {
            match owner.tables.iter_mut().find(|t| t.name == table.name) {
                Some(existing) => *existing = table,
                None => owner.tables.push(table),
            }
        }
        self
    }

    /// Remove a table, as if it was dropped by another client
    pub fn drop_table(&self, schema: &str, table: &str) -> &Self {
        let mut state = self.state.lock();
        if let Some(owner) = state.schemas.iter_mut().find(|s| s.name == schema) {
            owner.tables.retain(|t| t.name != table);
        }
        self
    }

    /// Answer queries containing `pattern` with fixed rows
    ///
    /// Scripted responses take precedence over the built-in catalog.
    pub fn respond_to(&self, pattern: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> &Self {
        self.state.lock().responses.push(ScriptedResponse {
            pattern: pattern.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        });
        self
    }

    /// Fail every statement containing `pattern`
    pub fn fail_on(&self, pattern: &str, error: DriverError) -> &Self {
        self.push_failure(pattern, error, None)
    }

    /// Fail the next statement containing `pattern`, once
    pub fn fail_once(&self, pattern: &str, error: DriverError) -> &Self {
        self.push_failure(pattern, error, Some(1))
    }

    /// Remove all failure rules
    pub fn clear_failures(&self) -> &Self {
        self.state.lock().failures.clear();
        self
    }

    /// Delay every query by `latency`
    pub fn set_latency(&self, latency: Duration) -> &Self {
        self.state.lock().latency = Some(latency);
        self
    }

    /// Number of queries executed so far
    pub fn query_count(&self) -> usize {
        self.state.lock().queries.len()
    }

    /// Number of executed queries containing `pattern`
    pub fn queries_matching(&self, pattern: &str) -> usize {
        self.state
            .lock()
            .queries
            .iter()
            .filter(|q| q.contains(pattern))
            .count()
    }

    /// SQL of every query executed so far
    pub fn query_log(&self) -> Vec<String> {
        self.state.lock().queries.clone()
    }

    /// SQL of every update (DDL/DML) that executed successfully
    pub fn update_log(&self) -> Vec<String> {
        self.state.lock().updates.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.counters.sessions.load(Ordering::SeqCst)
    }

    pub fn statements_prepared(&self) -> usize {
        self.counters.prepared.load(Ordering::SeqCst)
    }

    pub fn statements_closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Forget logged statements, keeping the catalog and rules
    pub fn reset_log(&self) {
        let mut state = self.state.lock();
        state.queries.clear();
        state.updates.clear();
    }

    /// A data source backed by this server
    pub fn data_source(&self, name: &str, dialect: Dialect) -> Arc<MockDataSource> {
        Arc::new(MockDataSource {
            name: name.to_string(),
            dialect,
            server: self.clone(),
        })
    }

    fn push_failure(&self, pattern: &str, error: DriverError, remaining: Option<usize>) -> &Self {
        self.state.lock().failures.push(FailureRule {
            pattern: pattern.to_string(),
            error,
            remaining,
        });
        self
    }

    fn take_failure(state: &mut ServerState, sql: &str) -> Option<DriverError> {
        let idx = state
            .failures
            .iter()
            .position(|rule| sql.contains(&rule.pattern))?;
        let rule = &mut state.failures[idx];
        let error = rule.error.clone();
        let exhausted = match rule.remaining.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => false,
        };
        if exhausted {
            state.failures.remove(idx);
        }
        Some(error)
    }

    async fn run_query(&self, sql: &str, params: &[Value]) -> DriverResult<Vec<Row>> {
        let latency = {
            let mut state = self.state.lock();
            state.queries.push(sql.to_string());
            if let Some(error) = Self::take_failure(&mut state, sql) {
                return Err(error);
            }
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.lock();
        if let Some(response) = state.responses.iter().find(|r| sql.contains(&r.pattern)) {
            return Ok(response
                .rows
                .iter()
                .map(|values| Row::new(response.columns.clone(), values.clone()))
                .collect());
        }
        answer_information_schema(&state.schemas, sql, params)
    }

    fn run_update(&self, sql: &str) -> DriverResult<u64> {
        let mut state = self.state.lock();
        if let Some(error) = Self::take_failure(&mut state, sql) {
            return Err(error);
        }
        state.updates.push(sql.to_string());
        Ok(0)
    }
}

fn param(params: &[Value], idx: usize) -> Option<String> {
    match params.get(idx)? {
        Value::Null => None,
        Value::Text(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn header(columns: &[&str]) -> Arc<[String]> {
    columns.iter().map(|c| c.to_string()).collect()
}

fn answer_information_schema(
    schemas: &[MockSchema],
    sql: &str,
    params: &[Value],
) -> DriverResult<Vec<Row>> {
    let lowered = sql.to_lowercase();
    let first = param(params, 0);
    let second = param(params, 1);
    let third = param(params, 2);
    let schema = |name: &Option<String>| schemas.iter().find(|s| Some(&s.name) == name.as_ref());

    if lowered.contains("information_schema.schemata") {
        let columns = header(&["schema_name"]);
        return Ok(schemas
            .iter()
            .filter(|s| first.is_none() || Some(&s.name) == first.as_ref())
            .map(|s| Row::new(columns.clone(), vec![Value::from(s.name.as_str())]))
            .collect());
    }

    if lowered.contains("information_schema.tables") {
        let columns = header(&["table_name", "table_type"]);
        let Some(owner) = schema(&first) else {
            return Ok(Vec::new());
        };
        return Ok(owner
            .tables
            .iter()
            .filter(|t| second.is_none() || Some(&t.name) == second.as_ref())
            .map(|t| {
                Row::new(
                    columns.clone(),
                    vec![
                        Value::from(t.name.as_str()),
                        Value::from(t.table_type.as_str()),
                    ],
                )
            })
            .collect());
    }

    if lowered.contains("information_schema.columns") {
        let columns = header(&[
            "table_name",
            "column_name",
            "data_type",
            "character_maximum_length",
            "numeric_precision",
            "numeric_scale",
            "is_nullable",
            "column_default",
            "ordinal_position",
        ]);
        let Some(owner) = schema(&first) else {
            return Ok(Vec::new());
        };
        let mut rows = Vec::new();
        for table in owner
            .tables
            .iter()
            .filter(|t| second.is_none() || Some(&t.name) == second.as_ref())
        {
            for (pos, column) in table.columns.iter().enumerate() {
                rows.push(Row::new(columns.clone(), column_values(table, column, pos)));
            }
        }
        return Ok(rows);
    }

    if lowered.contains("information_schema.statistics") {
        let columns = header(&["index_name", "non_unique", "column_names"]);
        let Some(table) = schema(&first)
            .and_then(|owner| owner.tables.iter().find(|t| Some(&t.name) == second.as_ref()))
        else {
            return Ok(Vec::new());
        };
        return Ok(table
            .indexes
            .iter()
            .filter(|i| third.is_none() || Some(&i.name) == third.as_ref())
            .map(|i| {
                Row::new(
                    columns.clone(),
                    vec![
                        Value::from(i.name.as_str()),
                        Value::from(i64::from(!i.unique)),
                        Value::from(i.columns.join(",")),
                    ],
                )
            })
            .collect());
    }

    Err(DriverError::new(format!("mock server cannot answer query: {sql}")).with_sql_state("42000"))
}

fn column_values(table: &MockTable, column: &MockColumn, pos: usize) -> Vec<Value> {
    let (base, first, second) = split_type_modifiers(&column.data_type);
    let kind = DataKind::from_type_name(&base);
    let length = first.filter(|_| kind.has_length()).and_then(|l| i64::try_from(l).ok());
    let (precision, scale) = if kind.has_precision() {
        (
            first.and_then(|p| i64::try_from(p).ok()),
            second.map(i64::from),
        )
    } else {
        (None, None)
    };

    vec![
        Value::from(table.name.as_str()),
        Value::from(column.name.as_str()),
        Value::from(base),
        Value::from(length),
        Value::from(precision),
        Value::from(scale),
        Value::from(if column.nullable { "YES" } else { "NO" }),
        Value::from(column.default.clone()),
        Value::from(i64::try_from(pos + 1).unwrap_or(i64::MAX)),
    ]
}

/// Data source handing out sessions on a [`MockServer`]
#[derive(Debug)]
pub struct MockDataSource {
    name: String,
    dialect: Dialect,
    server: MockServer,
}

impl MockDataSource {
    pub fn server(&self) -> &MockServer {
        &self.server
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn open_session(&self, purpose: SessionPurpose) -> DriverResult<Arc<dyn Session>> {
        self.server.counters.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockSession {
            purpose,
            server: self.server.clone(),
        }))
    }
}

struct MockSession {
    purpose: SessionPurpose,
    server: MockServer,
}

#[async_trait]
impl Session for MockSession {
    fn purpose(&self) -> SessionPurpose {
        self.purpose
    }

    async fn prepare(&self, sql: &str) -> DriverResult<Box<dyn Statement>> {
        self.server.counters.prepared.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStatement {
            sql: sql.to_string(),
            params: Vec::new(),
            server: self.server.clone(),
            closed: false,
        }))
    }
}

struct MockStatement {
    sql: String,
    params: Vec<Value>,
    server: MockServer,
    closed: bool,
}

#[async_trait]
impl Statement for MockStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn bind(&mut self, index: usize, value: Value) -> DriverResult<()> {
        if index == 0 {
            return Err(DriverError::new("parameter indexes are 1-based"));
        }
        if self.params.len() < index {
            self.params.resize(index, Value::Null);
        }
        self.params[index - 1] = value;
        Ok(())
    }

    async fn execute_query(&mut self) -> DriverResult<Box<dyn ResultCursor>> {
        if self.closed {
            return Err(DriverError::new("statement is closed"));
        }
        let rows = self.server.run_query(&self.sql, &self.params).await?;
        Ok(Box::new(MockCursor {
            rows: rows.into_iter(),
        }))
    }

    async fn execute_update(&mut self) -> DriverResult<u64> {
        if self.closed {
            return Err(DriverError::new("statement is closed"));
        }
        self.server.run_update(&self.sql)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.server.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct MockCursor {
    rows: std::vec::IntoIter<Row>,
}

#[async_trait]
impl ResultCursor for MockCursor {
    async fn next_row(&mut self) -> DriverResult<Option<Row>> {
        Ok(self.rows.next())
    }
}
