//! Schema adapter: portable migration operations rendered to dialect SQL
//!
//! [`SchemaAdapter`] carries a default rendering for every operation, written
//! for the MySQL family. A dialect implements the four required methods and
//! overrides only the `*_sql` builders whose syntax differs.

mod mysql;
mod postgres;

use std::borrow::Cow;

use crate::connection::{Connection, Param, Row, Value};
use crate::dialect::SqlDialect;
use crate::error::{MigrationError, Result};
use crate::schema::{ColumnDef, ForeignKey, IndexColumn, TableOptions};
use crate::types::TypeMap;

pub use mysql::MySqlAdapter;
pub use postgres::{CheckToggle, PostgresAdapter};

/// Build the adapter for `dialect`, using `types` as its type map
pub fn for_dialect<'c>(
    dialect: SqlDialect,
    connection: &'c dyn Connection,
    types: TypeMap,
) -> Box<dyn SchemaAdapter + 'c> {
    match dialect {
        SqlDialect::MySQL => Box::new(MySqlAdapter::new(connection).with_type_map(types)),
        SqlDialect::PostgreSQL => Box::new(PostgresAdapter::new(connection).with_type_map(types)),
    }
}

/// The three statements issued to drop a foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDrop {
    pub disable_checks: String,
    pub drop: String,
    pub enable_checks: String,
}

/// Dialect-independent migration operations
pub trait SchemaAdapter {
    fn dialect(&self) -> SqlDialect;

    fn connection(&self) -> &dyn Connection;

    fn type_map(&self) -> &TypeMap;

    /// Current native type of an existing column
    ///
    /// Fails with [`MigrationError::ColumnResolution`] when the column cannot
    /// be found or its type cannot be determined.
    fn column_info(&self, table: &str, name: &str) -> Result<String>;

    /// Run a statement that returns no rows, binding each parameter by value
    fn execute(&self, query: &str, params: &[Param]) -> Result<u64> {
        tracing::debug!(dialect = %self.dialect(), sql = query, params = params.len(), "execute");
        let mut cmd = self.connection().create_command(query);
        for param in params {
            cmd.bind_value(&param.key, param.value.clone())
                .map_err(|e| MigrationError::execution(query, e))?;
        }
        cmd.execute().map_err(|e| MigrationError::execution(query, e))
    }

    /// Run a statement and return every row
    fn query(&self, query: &str, params: &[Param]) -> Result<Vec<Row>> {
        tracing::debug!(dialect = %self.dialect(), sql = query, params = params.len(), "query");
        let mut cmd = self.connection().create_command(query);
        for param in params {
            cmd.bind_param(&param.key, param.value.clone())
                .map_err(|e| MigrationError::execution(query, e))?;
        }
        cmd.query_all()
            .map_err(|e| MigrationError::execution(query, e))
    }

    fn create_table_sql(
        &self,
        name: &str,
        columns: &[ColumnDef],
        options: &TableOptions,
        extra: Option<&str>,
    ) -> Result<String> {
        log_unrecognized_options(name, options);
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE={} DEFAULT CHARACTER SET={} COLLATE={}",
            quote_table(self, name),
            column_definitions(self, columns)?,
            options.engine,
            options.charset,
            options.collate
        );
        append_clause(&mut sql, extra);
        Ok(sql)
    }

    /// Create a table unless it already exists
    ///
    /// `extra` is appended verbatim after the table options.
    fn create_table(
        &self,
        name: &str,
        columns: &[ColumnDef],
        options: &TableOptions,
        extra: Option<&str>,
    ) -> Result<u64> {
        let sql = self.create_table_sql(name, columns, options, extra)?;
        self.execute(&sql, &[])
    }

    fn rename_table_sql(&self, name: &str, new_name: &str) -> String {
        format!(
            "RENAME TABLE {} TO {}",
            quote_table(self, name),
            quote_table(self, new_name)
        )
    }

    fn rename_table(&self, name: &str, new_name: &str) -> Result<u64> {
        self.execute(&self.rename_table_sql(name, new_name), &[])
    }

    fn remove_table_sql(&self, name: &str) -> String {
        format!("DROP TABLE {}", quote_table(self, name))
    }

    fn remove_table(&self, name: &str) -> Result<u64> {
        self.execute(&self.remove_table_sql(name), &[])
    }

    /// Same as [`remove_table`](SchemaAdapter::remove_table)
    fn drop_table(&self, name: &str) -> Result<u64> {
        self.remove_table(name)
    }

    fn add_column_sql(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: Option<&str>,
    ) -> Result<String> {
        let mut sql = format!(
            "ALTER TABLE {} ADD {} {}",
            quote_table(self, table),
            quote_column(self, column),
            native_type(self, column_type)?
        );
        append_clause(&mut sql, options);
        Ok(sql)
    }

    /// Add a column; `options` is a trailing fragment such as `NOT NULL DEFAULT 1`
    fn add_column(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: Option<&str>,
    ) -> Result<u64> {
        let sql = self.add_column_sql(table, column, column_type, options)?;
        self.execute(&sql, &[])
    }

    fn rename_column_sql(&self, table: &str, name: &str, new_name: &str) -> Result<String> {
        let column_type = resolve_column_type(self, table, name)?;
        Ok(format!(
            "ALTER TABLE {} CHANGE {} {} {}",
            quote_table(self, table),
            quote_column(self, name),
            quote_column(self, new_name),
            column_type
        ))
    }

    /// Rename a column, keeping its current type
    fn rename_column(&self, table: &str, name: &str, new_name: &str) -> Result<u64> {
        let sql = self.rename_column_sql(table, name, new_name)?;
        self.execute(&sql, &[])
    }

    fn change_column_sql(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: Option<&str>,
    ) -> Result<String> {
        let quoted = quote_column(self, column);
        let mut sql = format!(
            "ALTER TABLE {} CHANGE {} {} {}",
            quote_table(self, table),
            quoted,
            quoted,
            native_type(self, column_type)?
        );
        append_clause(&mut sql, options);
        Ok(sql)
    }

    /// Replace a column's type and attributes, keeping its name
    fn change_column(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: Option<&str>,
    ) -> Result<u64> {
        let sql = self.change_column_sql(table, column, column_type, options)?;
        self.execute(&sql, &[])
    }

    fn remove_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP {}",
            quote_table(self, table),
            quote_column(self, column)
        )
    }

    fn remove_column(&self, table: &str, column: &str) -> Result<u64> {
        self.execute(&self.remove_column_sql(table, column), &[])
    }

    fn add_index_sql(
        &self,
        table: &str,
        name: &str,
        columns: &[IndexColumn],
        unique: bool,
    ) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            quote_column(self, name),
            quote_table(self, table),
            index_columns(self, columns)
        )
    }

    fn add_index(
        &self,
        table: &str,
        name: &str,
        columns: &[IndexColumn],
        unique: bool,
    ) -> Result<u64> {
        self.execute(&self.add_index_sql(table, name, columns, unique), &[])
    }

    fn remove_index_sql(&self, table: &str, name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            quote_column(self, name),
            quote_table(self, table)
        )
    }

    fn remove_index(&self, table: &str, name: &str) -> Result<u64> {
        self.execute(&self.remove_index_sql(table, name), &[])
    }

    fn add_constraint_sql(&self, fk: &ForeignKey) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_table(self, &fk.src_table),
            quote_column(self, &fk.constraint_name()),
            quote_column(self, &fk.src_column),
            quote_table(self, &fk.target_table),
            quote_column(self, &fk.target_column)
        );
        append_clause(&mut sql, fk.options.as_deref());
        sql
    }

    /// Add a foreign key; an unnamed key gets a name derived from its columns
    fn add_constraint(&self, fk: &ForeignKey) -> Result<u64> {
        self.execute(&self.add_constraint_sql(fk), &[])
    }

    fn remove_constraint_sql(&self, table: &str, name: &str) -> ConstraintDrop {
        ConstraintDrop {
            disable_checks: "SET FOREIGN_KEY_CHECKS = 0".to_string(),
            drop: format!(
                "ALTER TABLE {} DROP FOREIGN KEY {}",
                quote_table(self, table),
                quote_column(self, name)
            ),
            enable_checks: "SET FOREIGN_KEY_CHECKS = 1".to_string(),
        }
    }

    /// Drop a foreign key with foreign-key checks disabled
    ///
    /// Once checks were disabled they are always re-enabled, even when the
    /// drop fails. A failed drop is returned after re-enabling; if re-enabling
    /// fails as well the result is [`MigrationError::Sequence`].
    fn remove_constraint(&self, table: &str, name: &str) -> Result<u64> {
        let steps = self.remove_constraint_sql(table, name);

        self.execute(&steps.disable_checks, &[])?;
        let dropped = self.execute(&steps.drop, &[]);
        let restored = self.execute(&steps.enable_checks, &[]);

        match (dropped, restored) {
            (Ok(rows), Ok(_)) => Ok(rows),
            (Ok(_), Err(restore)) => {
                tracing::warn!(table, constraint = name, error = %restore, "failed to re-enable foreign-key checks");
                Err(restore)
            }
            (Err(source), Ok(_)) => {
                tracing::warn!(table, constraint = name, error = %source, "dropping constraint failed, foreign-key checks restored");
                Err(source)
            }
            (Err(source), Err(restore)) => {
                tracing::warn!(table, constraint = name, error = %restore, "failed to re-enable foreign-key checks after failed drop");
                Err(MigrationError::Sequence {
                    table: table.to_string(),
                    constraint: name.to_string(),
                    source: Box::new(source),
                    restore: Box::new(restore),
                })
            }
        }
    }
}

pub(crate) fn quote_table<A: SchemaAdapter + ?Sized>(adapter: &A, name: &str) -> String {
    adapter.connection().quote_table_name(name)
}

pub(crate) fn quote_column<A: SchemaAdapter + ?Sized>(adapter: &A, name: &str) -> String {
    adapter.connection().quote_column_name(name)
}

/// Translate an abstract type token through the adapter's type map
pub(crate) fn native_type<'a, A: SchemaAdapter + ?Sized>(
    adapter: &'a A,
    token: &'a str,
) -> Result<Cow<'a, str>> {
    adapter.type_map().translate(token)
}

/// Render column definitions as `name [type] [modifiers], ...`
pub(crate) fn column_definitions<A: SchemaAdapter + ?Sized>(
    adapter: &A,
    columns: &[ColumnDef],
) -> Result<String> {
    let mut defs = Vec::with_capacity(columns.len());
    for column in columns {
        let mut def = quote_column(adapter, &column.name);
        if let Some(token) = &column.column_type {
            let native = native_type(adapter, token)?;
            append_clause(&mut def, Some(&*native));
        }
        append_clause(&mut def, column.modifiers.as_deref());
        defs.push(def);
    }
    Ok(defs.join(", "))
}

/// Render index columns as `name [modifier], ...`
pub(crate) fn index_columns<A: SchemaAdapter + ?Sized>(
    adapter: &A,
    columns: &[IndexColumn],
) -> String {
    columns
        .iter()
        .map(|column| {
            let mut col = quote_column(adapter, &column.name);
            append_clause(&mut col, column.modifier.as_deref());
            col
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Native type of `name` as reported by [`SchemaAdapter::column_info`],
/// rejecting an empty answer
pub(crate) fn resolve_column_type<A: SchemaAdapter + ?Sized>(
    adapter: &A,
    table: &str,
    name: &str,
) -> Result<String> {
    let column_type = adapter.column_info(table, name)?;
    let column_type = column_type.trim();
    if column_type.is_empty() {
        return Err(MigrationError::column_resolution(
            table,
            name,
            "the column type resolved to an empty string",
        ));
    }
    Ok(column_type.to_string())
}

/// Append ` fragment` when the fragment has content
pub(crate) fn append_clause(sql: &mut String, fragment: Option<&str>) {
    if let Some(fragment) = fragment.map(str::trim).filter(|f| !f.is_empty()) {
        sql.push(' ');
        sql.push_str(fragment);
    }
}

pub(crate) fn log_unrecognized_options(table: &str, options: &TableOptions) {
    for key in options.unrecognized.keys() {
        tracing::debug!(table, option = %key, "ignoring unrecognized table option");
    }
}

/// Text of `column` in the first row, used by `column_info` lookups
pub(crate) fn first_text(rows: &[Row], column: &str) -> Option<String> {
    rows.first()
        .and_then(|row| row.get(column))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_clause_skips_blank_fragments() {
        let mut sql = "DROP TABLE t".to_string();
        append_clause(&mut sql, None);
        append_clause(&mut sql, Some("   "));
        assert_eq!(sql, "DROP TABLE t");

        append_clause(&mut sql, Some(" CASCADE "));
        assert_eq!(sql, "DROP TABLE t CASCADE");
    }

    #[test]
    fn test_first_text() {
        let mut row = Row::new();
        row.insert("column_type".to_string(), Value::from("int(11)"));
        assert_eq!(
            first_text(&[row.clone()], "column_type"),
            Some("int(11)".to_string())
        );
        assert_eq!(first_text(&[row], "other"), None);
        assert_eq!(first_text(&[], "column_type"), None);
    }
}
