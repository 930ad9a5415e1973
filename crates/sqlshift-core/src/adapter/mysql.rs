//! MySQL / MariaDB adapter

use super::{first_text, SchemaAdapter};
use crate::connection::{Connection, Param};
use crate::dialect::SqlDialect;
use crate::error::{MigrationError, Result};
use crate::types::TypeMap;

const COLUMN_TYPE_QUERY: &str = "SELECT COLUMN_TYPE AS column_type \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = :table AND COLUMN_NAME = :column";

/// Adapter emitting MySQL syntax; uses the default statement rendering as is
pub struct MySqlAdapter<'c> {
    connection: &'c dyn Connection,
    types: TypeMap,
}

impl<'c> MySqlAdapter<'c> {
    pub fn new(connection: &'c dyn Connection) -> Self {
        Self {
            connection,
            types: TypeMap::mysql(),
        }
    }

    /// Replace the built-in type map
    pub fn with_type_map(mut self, types: TypeMap) -> Self {
        self.types = types;
        self
    }
}

impl SchemaAdapter for MySqlAdapter<'_> {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::MySQL
    }

    fn connection(&self) -> &dyn Connection {
        self.connection
    }

    fn type_map(&self) -> &TypeMap {
        &self.types
    }

    fn column_info(&self, table: &str, name: &str) -> Result<String> {
        let rows = self.query(
            COLUMN_TYPE_QUERY,
            &[Param::named(":table", table), Param::named(":column", name)],
        )?;
        first_text(&rows, "column_type").ok_or_else(|| {
            MigrationError::column_resolution(
                table,
                name,
                "column not found in information_schema.COLUMNS",
            )
        })
    }
}
