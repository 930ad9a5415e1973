//! PostgreSQL adapter
//!
//! PostgreSQL has no `CHANGE` clause, no `RENAME TABLE` statement and no
//! table-level storage engine, so those statements are overridden. Column
//! attributes given to `change_column` become separate `ALTER COLUMN` actions
//! of the same statement.

use super::{
    append_clause, column_definitions, first_text, log_unrecognized_options, native_type,
    quote_column, quote_table, resolve_column_type, ConstraintDrop, SchemaAdapter,
};
use crate::connection::{Connection, Param};
use crate::dialect::SqlDialect;
use crate::error::{MigrationError, Result};
use crate::schema::{ColumnDef, TableOptions};
use crate::types::TypeMap;

const COLUMN_TYPE_QUERY: &str = "SELECT format_type(a.atttypid, a.atttypmod) AS column_type \
     FROM pg_catalog.pg_attribute a \
     WHERE a.attrelid = to_regclass($1) AND a.attname = $2 AND a.attnum > 0 AND NOT a.attisdropped";

/// How foreign-key enforcement is suspended while a constraint is dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckToggle {
    /// `SET session_replication_role = replica`, which skips the triggers
    /// enforcing foreign keys. Requires a superuser or `rds_superuser` role.
    #[default]
    ReplicationRole,
    /// `SET CONSTRAINTS ALL DEFERRED`. Any role may issue it, but only
    /// constraints declared `DEFERRABLE` are postponed.
    DeferConstraints,
}

/// PostgreSQL adapter
///
/// `remove_constraint` suspends foreign-key enforcement with
/// [`CheckToggle::ReplicationRole`] unless told otherwise; roles without
/// superuser rights should use [`with_check_toggle`](Self::with_check_toggle)
/// to pick [`CheckToggle::DeferConstraints`].
pub struct PostgresAdapter<'c> {
    connection: &'c dyn Connection,
    types: TypeMap,
    check_toggle: CheckToggle,
}

impl<'c> PostgresAdapter<'c> {
    pub fn new(connection: &'c dyn Connection) -> Self {
        Self {
            connection,
            types: TypeMap::postgres(),
            check_toggle: CheckToggle::default(),
        }
    }

    /// Replace the built-in type map
    pub fn with_type_map(mut self, types: TypeMap) -> Self {
        self.types = types;
        self
    }

    pub fn with_check_toggle(mut self, toggle: CheckToggle) -> Self {
        self.check_toggle = toggle;
        self
    }
}

impl SchemaAdapter for PostgresAdapter<'_> {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    fn connection(&self) -> &dyn Connection {
        self.connection
    }

    fn type_map(&self) -> &TypeMap {
        &self.types
    }

    fn column_info(&self, table: &str, name: &str) -> Result<String> {
        // to_regclass takes a quoted name so mixed-case tables resolve
        let rows = self.query(
            COLUMN_TYPE_QUERY,
            &[
                Param::positional(1, quote_table(self, table)),
                Param::positional(2, name),
            ],
        )?;
        first_text(&rows, "column_type").ok_or_else(|| {
            MigrationError::column_resolution(table, name, "column not found in pg_attribute")
        })
    }

    fn create_table_sql(
        &self,
        name: &str,
        columns: &[ColumnDef],
        options: &TableOptions,
        extra: Option<&str>,
    ) -> Result<String> {
        log_unrecognized_options(name, options);
        tracing::debug!(
            table = name,
            engine = %options.engine,
            charset = %options.charset,
            collate = %options.collate,
            "storage options do not apply to postgresql"
        );
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_table(self, name),
            column_definitions(self, columns)?
        );
        append_clause(&mut sql, extra);
        Ok(sql)
    }

    fn rename_table_sql(&self, name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_table(self, name),
            quote_table(self, new_name)
        )
    }

    fn rename_column_sql(&self, table: &str, name: &str, new_name: &str) -> Result<String> {
        // RENAME COLUMN keeps the type; resolve it anyway so a missing column fails early
        resolve_column_type(self, table, name)?;
        Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_table(self, table),
            quote_column(self, name),
            quote_column(self, new_name)
        ))
    }

    /// `options` holds the column's new attributes (`NULL`, `NOT NULL`,
    /// `DEFAULT <expr>`) and may carry a `USING <expr>` conversion
    fn change_column_sql(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: Option<&str>,
    ) -> Result<String> {
        let attributes = ColumnAttributes::parse(options.unwrap_or_default())?;
        let column = quote_column(self, column);
        let mut sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            quote_table(self, table),
            column,
            native_type(self, column_type)?
        );
        if let Some(using) = &attributes.using {
            sql.push_str(" USING ");
            sql.push_str(using);
        }
        for action in &attributes.actions {
            sql.push_str(&format!(", ALTER COLUMN {} {}", column, action));
        }
        Ok(sql)
    }

    fn remove_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_table(self, table),
            quote_column(self, column)
        )
    }

    fn remove_index_sql(&self, _table: &str, name: &str) -> String {
        format!("DROP INDEX {}", quote_column(self, name))
    }

    fn remove_constraint_sql(&self, table: &str, name: &str) -> ConstraintDrop {
        let (disable_checks, enable_checks) = match self.check_toggle {
            CheckToggle::ReplicationRole => (
                "SET session_replication_role = replica",
                "SET session_replication_role = DEFAULT",
            ),
            CheckToggle::DeferConstraints => {
                ("SET CONSTRAINTS ALL DEFERRED", "SET CONSTRAINTS ALL IMMEDIATE")
            }
        };
        ConstraintDrop {
            disable_checks: disable_checks.to_string(),
            drop: format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                quote_table(self, table),
                quote_column(self, name)
            ),
            enable_checks: enable_checks.to_string(),
        }
    }
}

/// Column attributes split into `ALTER COLUMN` actions
#[derive(Debug, Default, PartialEq)]
struct ColumnAttributes {
    using: Option<String>,
    actions: Vec<String>,
}

impl ColumnAttributes {
    fn parse(fragment: &str) -> Result<Self> {
        let words: Vec<&str> = fragment.split_whitespace().collect();
        let mut attributes = Self::default();
        let mut i = 0;

        while i < words.len() {
            let keyword = words[i].to_ascii_uppercase();
            match keyword.as_str() {
                "NOT" if starts_attribute(&words, i) => {
                    attributes.actions.push("SET NOT NULL".to_string());
                    i += 2;
                }
                "NULL" => {
                    attributes.actions.push("DROP NOT NULL".to_string());
                    i += 1;
                }
                "DEFAULT" | "USING" if i + 1 < words.len() => {
                    // the expression runs up to the next attribute keyword
                    let end = (i + 2..words.len())
                        .find(|&j| starts_attribute(&words, j))
                        .unwrap_or(words.len());
                    let expr = words[i + 1..end].join(" ");
                    if keyword == "DEFAULT" {
                        attributes.actions.push(format!("SET DEFAULT {}", expr));
                    } else {
                        attributes.using = Some(expr);
                    }
                    i = end;
                }
                _ => {
                    return Err(MigrationError::UnsupportedModifier {
                        modifier: words[i].to_string(),
                        dialect: SqlDialect::PostgreSQL.to_string(),
                    })
                }
            }
        }

        Ok(attributes)
    }
}

fn starts_attribute(words: &[&str], i: usize) -> bool {
    match words[i].to_ascii_uppercase().as_str() {
        "NULL" | "DEFAULT" | "USING" => true,
        "NOT" => words
            .get(i + 1)
            .is_some_and(|next| next.eq_ignore_ascii_case("NULL")),
        _ => false,
    }
}
