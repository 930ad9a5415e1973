//! Connection contract consumed by schema adapters
//!
//! The adapter never talks to a database directly. It asks a [`Connection`]
//! to quote identifiers and to prepare a [`Command`], binds parameter values
//! to it and runs it. Identifiers cannot be bound as parameters, so table and
//! column names are always quoted by the connection instead.

mod dry_run;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;

pub use dry_run::{DryRunConnection, RecordedStatement, SimulatedFailure, StatementKind};

/// A value bound to a statement parameter or returned in a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Parameter placeholder key: a name such as `:id`, or a 1-based position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamKey {
    Positional(usize),
    Named(String),
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Named(name.to_string())
    }
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Positional(position)
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKey::Named(name) => write!(f, "{}", name),
            ParamKey::Positional(position) => write!(f, "#{}", position),
        }
    }
}

/// A key/value pair bound to a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub key: ParamKey,
    pub value: Value,
}

impl Param {
    pub fn new(key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn named(name: &str, value: impl Into<Value>) -> Self {
        Self::new(name, value)
    }

    pub fn positional(position: usize, value: impl Into<Value>) -> Self {
        Self::new(position, value)
    }
}

/// One result row, column name to value, in select-list order
pub type Row = IndexMap<String, Value>;

/// A prepared statement
pub trait Command {
    /// Bind a value to a placeholder
    fn bind_value(&mut self, key: &ParamKey, value: Value) -> Result<(), DriverError>;

    /// Bind a value to a placeholder of a result-returning statement
    ///
    /// Drivers that distinguish input parameters from value bindings override
    /// this; everyone else binds by value.
    fn bind_param(&mut self, key: &ParamKey, value: Value) -> Result<(), DriverError> {
        self.bind_value(key, value)
    }

    /// Run a statement that returns no rows; yields the affected-row count
    fn execute(&mut self) -> Result<u64, DriverError>;

    /// Run a statement and fetch every row
    fn query_all(&mut self) -> Result<Vec<Row>, DriverError>;
}

/// A database session the adapter issues statements through
pub trait Connection {
    fn quote_table_name(&self, name: &str) -> String;

    fn quote_column_name(&self, name: &str) -> String;

    fn create_command<'a>(&'a self, sql: &str) -> Box<dyn Command + 'a>;
}
