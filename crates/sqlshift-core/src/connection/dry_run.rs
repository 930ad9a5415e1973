//! In-memory connection that records statements instead of running them

use std::cell::RefCell;
use std::collections::VecDeque;

use thiserror::Error;

use super::{Command, Connection, Param, ParamKey, Row, Value};
use crate::dialect::SqlDialect;
use crate::error::DriverError;

/// Error returned for statements the dry-run connection was told to reject
#[derive(Debug, Error)]
#[error("simulated failure for statement: {0}")]
pub struct SimulatedFailure(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Execute,
    Query,
}

/// A statement as it reached the connection
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<Param>,
    pub kind: StatementKind,
}

/// Connection that quotes like a real dialect but never touches a database
///
/// Query results are served from a queue of canned row sets; once the queue
/// is drained every query returns no rows.
#[derive(Debug, Default)]
pub struct DryRunConnection {
    dialect: SqlDialect,
    statements: RefCell<Vec<RecordedStatement>>,
    responses: RefCell<VecDeque<Vec<Row>>>,
    failing_prefixes: Vec<String>,
}

impl DryRunConnection {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Reject every statement starting with `prefix`
    pub fn failing_on(mut self, prefix: impl Into<String>) -> Self {
        self.failing_prefixes.push(prefix.into());
        self
    }

    /// Queue the row set returned by the next query
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.responses.borrow_mut().push_back(rows);
    }

    /// Every statement seen so far, including rejected ones
    pub fn recorded(&self) -> Vec<RecordedStatement> {
        self.statements.borrow().clone()
    }

    /// SQL text of every statement seen so far
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .borrow()
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    /// SQL text of executed (non-query) statements
    pub fn executed(&self) -> Vec<String> {
        self.statements
            .borrow()
            .iter()
            .filter(|s| s.kind == StatementKind::Execute)
            .map(|s| s.sql.clone())
            .collect()
    }

    /// Forget recorded statements, keeping queued responses
    pub fn clear(&self) {
        self.statements.borrow_mut().clear();
    }

    fn record(&self, sql: &str, params: &[Param], kind: StatementKind) -> Result<(), DriverError> {
        self.statements.borrow_mut().push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
            kind,
        });
        if self.failing_prefixes.iter().any(|p| sql.starts_with(p)) {
            return Err(Box::new(SimulatedFailure(sql.to_string())));
        }
        Ok(())
    }
}

impl Connection for DryRunConnection {
    fn quote_table_name(&self, name: &str) -> String {
        self.dialect.quote_qualified(name)
    }

    fn quote_column_name(&self, name: &str) -> String {
        self.dialect.quote_ident(name)
    }

    fn create_command<'a>(&'a self, sql: &str) -> Box<dyn Command + 'a> {
        Box::new(DryRunCommand {
            connection: self,
            sql: sql.to_string(),
            params: Vec::new(),
        })
    }
}

struct DryRunCommand<'a> {
    connection: &'a DryRunConnection,
    sql: String,
    params: Vec<Param>,
}

impl Command for DryRunCommand<'_> {
    fn bind_value(&mut self, key: &ParamKey, value: Value) -> Result<(), DriverError> {
        self.params.push(Param {
            key: key.clone(),
            value,
        });
        Ok(())
    }

    fn execute(&mut self) -> Result<u64, DriverError> {
        self.connection
            .record(&self.sql, &self.params, StatementKind::Execute)?;
        Ok(0)
    }

    fn query_all(&mut self) -> Result<Vec<Row>, DriverError> {
        self.connection
            .record(&self.sql, &self.params, StatementKind::Query)?;
        Ok(self
            .connection
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_default())
    }
}
