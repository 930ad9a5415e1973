//! Plan files: declarative lists of schema operations

use std::path::Path;

use indexmap::IndexMap;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use sqlshift_core::{
    ColumnDef, DryRunConnection, ForeignKey, IndexColumn, MigrationError, Param, Row,
    SchemaAdapter, Value,
};

use crate::config::Config;

/// A plan file: `[[operation]]` tables applied in order
#[derive(Debug, Deserialize)]
pub struct Plan {
    #[serde(default, rename = "operation")]
    pub operations: Vec<Operation>,
}

impl Plan {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }
}

/// Column given either as a bare name or as a full definition
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ColumnEntry {
    Name(String),
    Def(ColumnDef),
}

impl From<ColumnEntry> for ColumnDef {
    fn from(entry: ColumnEntry) -> Self {
        match entry {
            ColumnEntry::Name(name) => ColumnDef::new(name),
            ColumnEntry::Def(def) => def,
        }
    }
}

/// Index column given either as a bare name or with a modifier
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndexEntry {
    Name(String),
    Column(IndexColumn),
}

impl From<IndexEntry> for IndexColumn {
    fn from(entry: IndexEntry) -> Self {
        match entry {
            IndexEntry::Name(name) => IndexColumn::new(name),
            IndexEntry::Column(column) => column,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateTable {
        name: String,
        #[serde(default)]
        columns: Vec<ColumnEntry>,
        #[serde(default)]
        options: IndexMap<String, String>,
        #[serde(default)]
        extra: Option<String>,
    },
    RenameTable {
        name: String,
        new_name: String,
    },
    DropTable {
        name: String,
    },
    RemoveTable {
        name: String,
    },
    AddColumn {
        table: String,
        column: String,
        #[serde(rename = "type")]
        column_type: String,
        #[serde(default)]
        options: Option<String>,
    },
    RenameColumn {
        table: String,
        name: String,
        new_name: String,
        /// Answer given to the column type lookup
        #[serde(default)]
        current_type: Option<String>,
    },
    ChangeColumn {
        table: String,
        column: String,
        #[serde(rename = "type")]
        column_type: String,
        #[serde(default)]
        options: Option<String>,
    },
    RemoveColumn {
        table: String,
        column: String,
    },
    AddIndex {
        table: String,
        name: String,
        columns: Vec<IndexEntry>,
        #[serde(default)]
        unique: bool,
    },
    RemoveIndex {
        table: String,
        name: String,
    },
    AddConstraint(ForeignKey),
    RemoveConstraint {
        table: String,
        name: String,
    },
    Execute {
        sql: String,
        #[serde(default)]
        params: IndexMap<String, Value>,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateTable { .. } => "create_table",
            Operation::RenameTable { .. } => "rename_table",
            Operation::DropTable { .. } => "drop_table",
            Operation::RemoveTable { .. } => "remove_table",
            Operation::AddColumn { .. } => "add_column",
            Operation::RenameColumn { .. } => "rename_column",
            Operation::ChangeColumn { .. } => "change_column",
            Operation::RemoveColumn { .. } => "remove_column",
            Operation::AddIndex { .. } => "add_index",
            Operation::RemoveIndex { .. } => "remove_index",
            Operation::AddConstraint(_) => "add_constraint",
            Operation::RemoveConstraint { .. } => "remove_constraint",
            Operation::Execute { .. } => "execute",
        }
    }

    /// Run the operation through `adapter`, which must sit on `connection`
    pub fn apply(
        &self,
        adapter: &dyn SchemaAdapter,
        connection: &DryRunConnection,
        config: &Config,
    ) -> std::result::Result<(), MigrationError> {
        match self {
            Operation::CreateTable {
                name,
                columns,
                options,
                extra,
            } => {
                let columns: Vec<ColumnDef> = columns.iter().cloned().map(Into::into).collect();
                let options = config.table_options(options);
                adapter.create_table(name, &columns, &options, extra.as_deref())?;
            }
            Operation::RenameTable { name, new_name } => {
                adapter.rename_table(name, new_name)?;
            }
            Operation::DropTable { name } => {
                adapter.drop_table(name)?;
            }
            Operation::RemoveTable { name } => {
                adapter.remove_table(name)?;
            }
            Operation::AddColumn {
                table,
                column,
                column_type,
                options,
            } => {
                adapter.add_column(table, column, column_type, options.as_deref())?;
            }
            Operation::RenameColumn {
                table,
                name,
                new_name,
                current_type,
            } => {
                if let Some(current_type) = current_type {
                    let mut row = Row::new();
                    row.insert("column_type".to_string(), Value::from(current_type.as_str()));
                    connection.push_rows(vec![row]);
                }
                adapter.rename_column(table, name, new_name)?;
            }
            Operation::ChangeColumn {
                table,
                column,
                column_type,
                options,
            } => {
                adapter.change_column(table, column, column_type, options.as_deref())?;
            }
            Operation::RemoveColumn { table, column } => {
                adapter.remove_column(table, column)?;
            }
            Operation::AddIndex {
                table,
                name,
                columns,
                unique,
            } => {
                let columns: Vec<IndexColumn> = columns.iter().cloned().map(Into::into).collect();
                adapter.add_index(table, name, &columns, *unique)?;
            }
            Operation::RemoveIndex { table, name } => {
                adapter.remove_index(table, name)?;
            }
            Operation::AddConstraint(fk) => {
                adapter.add_constraint(fk)?;
            }
            Operation::RemoveConstraint { table, name } => {
                adapter.remove_constraint(table, name)?;
            }
            Operation::Execute { sql, params } => {
                let params: Vec<Param> = params
                    .iter()
                    .map(|(key, value)| Param::named(key, value.clone()))
                    .collect();
                adapter.execute(sql, &params)?;
            }
        }
        Ok(())
    }
}
