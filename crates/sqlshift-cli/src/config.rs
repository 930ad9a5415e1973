//! Configuration file handling

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use sqlshift_core::{LookupPolicy, SqlDialect, TableOptions, TypeMap};

use crate::args::OutputFormat;

pub const CONFIG_FILE_NAME: &str = "sqlshift.toml";

/// Configuration for sqlshift
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// SQL dialect ("mysql" or "postgresql")
    #[serde(default)]
    pub dialect: Option<String>,

    /// Output format (sql, json)
    #[serde(default)]
    pub format: Option<String>,

    /// Reject column types missing from the type map
    #[serde(default)]
    pub strict_types: bool,

    /// Extra or replacement type mappings (token -> native type)
    #[serde(default)]
    pub types: IndexMap<String, String>,

    /// Default CREATE TABLE options (engine, charset, collate)
    #[serde(default)]
    pub table: IndexMap<String, String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).into_diagnostic()?;
        Ok(config)
    }

    /// Try to find and load sqlshift.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "loading configuration");
                return Ok(Some(Self::from_file(&config_path)?));
            }

            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load the given file, or discover one, or fall back to defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::find_and_load()?.unwrap_or_default()),
        }
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(
        mut self,
        dialect: &Option<String>,
        format: &Option<OutputFormat>,
        strict: bool,
    ) -> Self {
        if dialect.is_some() {
            self.dialect = dialect.clone();
        }

        if let Some(fmt) = format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        if strict {
            self.strict_types = true;
        }

        self
    }

    pub fn dialect(&self) -> Result<SqlDialect> {
        match &self.dialect {
            Some(name) => name.parse().map_err(|e: String| miette::miette!(e)),
            None => Ok(SqlDialect::default()),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format.as_deref() {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Sql,
        }
    }

    /// The dialect's type map with configured overrides and policy applied
    pub fn type_map(&self, dialect: SqlDialect) -> TypeMap {
        let policy = if self.strict_types {
            LookupPolicy::Strict
        } else {
            LookupPolicy::Lenient
        };
        dialect
            .default_type_map()
            .with_entries(self.types.clone())
            .with_policy(policy)
    }

    /// Table options for one CREATE TABLE: configured defaults, then per-table keys
    pub fn table_options(&self, per_table: &IndexMap<String, String>) -> TableOptions {
        let mut merged = self.table.clone();
        merged.extend(per_table.clone());
        TableOptions::from_map(merged)
    }
}
