//! sqlshift-core: dialect-aware schema migration adapter
//!
//! This library turns portable schema operations (create a table, add a
//! column, drop a foreign key, ...) into SQL for a specific database engine
//! and runs it through a caller-provided connection.

pub mod adapter;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod schema;
pub mod types;

pub use adapter::{
    for_dialect, CheckToggle, ConstraintDrop, MySqlAdapter, PostgresAdapter, SchemaAdapter,
};
pub use connection::{Command, Connection, DryRunConnection, Param, ParamKey, Row, Value};
pub use dialect::SqlDialect;
pub use error::{MigrationError, Result};
pub use schema::{ColumnDef, ForeignKey, IndexColumn, TableOptions};
pub use types::{LookupPolicy, TypeMap};
