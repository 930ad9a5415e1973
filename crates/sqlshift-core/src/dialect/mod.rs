//! SQL dialect support

use std::str::FromStr;

use crate::types::TypeMap;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    MySQL,
    PostgreSQL,
}

impl SqlDialect {
    /// Quote an identifier, doubling any embedded quote character
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            SqlDialect::MySQL => format!("`{}`", name.replace('`', "``")),
            SqlDialect::PostgreSQL => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Quote a possibly schema-qualified name, one identifier per `.` part
    pub fn quote_qualified(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_ident(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The portable-to-native type map this dialect ships with
    pub fn default_type_map(&self) -> TypeMap {
        match self {
            SqlDialect::MySQL => TypeMap::mysql(),
            SqlDialect::PostgreSQL => TypeMap::postgres(),
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mysql8" | "mariadb" => Ok(SqlDialect::MySQL),
            "postgresql" | "postgres" | "pg" => Ok(SqlDialect::PostgreSQL),
            "sqlite" => Err(
                "SQLite dialect is not yet supported. Supported dialects: mysql, postgresql."
                    .to_string(),
            ),
            _ => Err(format!(
                "Unknown dialect: '{}'. Supported dialects: mysql, postgresql.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::MySQL => write!(f, "mysql"),
            SqlDialect::PostgreSQL => write!(f, "postgresql"),
        }
    }
}
