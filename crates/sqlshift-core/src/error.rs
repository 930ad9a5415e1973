//! Error types

use miette::Diagnostic;
use thiserror::Error;

/// Boxed error produced by a connection driver
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while translating or executing a migration operation
#[derive(Debug, Error, Diagnostic)]
pub enum MigrationError {
    /// Abstract type token has no native mapping and the type map is strict
    #[error("Unknown column type '{token}' for dialect {dialect}")]
    #[diagnostic(
        code(sqlshift::translation),
        help("add '{token}' to the type map or switch the type map to lenient mode")
    )]
    Translation { token: String, dialect: String },

    /// A column attribute the dialect cannot express in an ALTER statement
    #[error("Column attribute '{modifier}' is not supported by {dialect} when altering a column")]
    #[diagnostic(
        code(sqlshift::unsupported_modifier),
        help("supported attributes are NULL, NOT NULL, DEFAULT <expr> and USING <expr>")
    )]
    UnsupportedModifier { modifier: String, dialect: String },

    /// The current native type of an existing column could not be determined
    #[error("Cannot resolve the type of column '{column}' in table '{table}': {reason}")]
    #[diagnostic(code(sqlshift::column_resolution))]
    ColumnResolution {
        table: String,
        column: String,
        reason: String,
    },

    /// The connection rejected or failed a statement
    #[error("Statement failed: {sql}")]
    #[diagnostic(code(sqlshift::execution))]
    Execution {
        sql: String,
        #[source]
        source: DriverError,
    },

    /// Dropping a foreign key failed and foreign-key checks could not be restored
    #[error(
        "Dropping constraint '{constraint}' on '{table}' failed and foreign-key checks could not be re-enabled"
    )]
    #[diagnostic(
        code(sqlshift::sequence),
        help("foreign-key checks may still be disabled for this session")
    )]
    Sequence {
        table: String,
        constraint: String,
        #[source]
        source: Box<MigrationError>,
        restore: Box<MigrationError>,
    },
}

impl MigrationError {
    /// Create a ColumnResolution error
    pub fn column_resolution(
        table: impl Into<String>,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MigrationError::ColumnResolution {
            table: table.into(),
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a driver error with the statement that produced it
    pub fn execution(sql: impl Into<String>, source: DriverError) -> Self {
        MigrationError::Execution {
            sql: sql.into(),
            source,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        if let MigrationError::Sequence { restore, .. } = self {
            output.push_str(&format!("\nRestore step:\n  {}", restore));
        }

        output
    }
}

/// Result type alias for migration operations
pub type Result<T> = std::result::Result<T, MigrationError>;
