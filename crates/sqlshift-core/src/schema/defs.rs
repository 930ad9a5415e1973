//! Column, index, table-option and constraint definitions passed to the adapter

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENGINE: &str = "InnoDB";
pub const DEFAULT_CHARSET: &str = "utf8";
pub const DEFAULT_COLLATE: &str = "utf8_general_ci";

/// Column definition
///
/// A bare definition (name only) renders as just the quoted name. The type is
/// an abstract token looked up in the dialect's type map, the modifiers are
/// appended verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(default, rename = "type")]
    pub column_type: Option<String>,
    #[serde(default)]
    pub modifiers: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: None,
            modifiers: None,
        }
    }

    pub fn typed(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self::new(name).with_type(column_type)
    }

    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: impl Into<String>) -> Self {
        self.modifiers = Some(modifiers.into());
        self
    }
}

impl From<&str> for ColumnDef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Column reference inside an index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    /// Ordering or prefix length, e.g. `DESC` or `(10)`
    #[serde(default)]
    pub modifier: Option<String>,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifier: None,
        }
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = Some(modifier.into());
        self
    }
}

impl From<&str> for IndexColumn {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for IndexColumn {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Storage options for CREATE TABLE
///
/// Defaults are applied when a key is absent. An explicitly empty value is
/// kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub engine: String,
    pub charset: String,
    pub collate: String,
    /// Keys the adapter does not recognize; never rendered into SQL
    #[serde(flatten)]
    pub unrecognized: IndexMap<String, String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            collate: DEFAULT_COLLATE.to_string(),
            unrecognized: IndexMap::new(),
        }
    }
}

impl TableOptions {
    /// Extract engine/charset/collate from a free-form option bag
    ///
    /// The three recognized keys are removed from the bag; whatever remains
    /// is kept in `unrecognized`.
    pub fn from_map(mut options: IndexMap<String, String>) -> Self {
        let engine = options
            .shift_remove("engine")
            .unwrap_or_else(|| DEFAULT_ENGINE.to_string());
        let charset = options
            .shift_remove("charset")
            .unwrap_or_else(|| DEFAULT_CHARSET.to_string());
        let collate = options
            .shift_remove("collate")
            .unwrap_or_else(|| DEFAULT_COLLATE.to_string());

        Self {
            engine,
            charset,
            collate,
            unrecognized: options,
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn with_collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = collate.into();
        self
    }
}

/// Foreign key constraint between two single columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub src_table: String,
    pub src_column: String,
    pub target_table: String,
    pub target_column: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Trailing clause such as `ON DELETE CASCADE`
    #[serde(default)]
    pub options: Option<String>,
}

impl ForeignKey {
    pub fn new(
        src_table: impl Into<String>,
        src_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            src_table: src_table.into(),
            src_column: src_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
            name: None,
            options: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Explicit name, or the lower-cased `src_table_src_column_target_table_target_column`
    pub fn constraint_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!(
                "{}_{}_{}_{}",
                self.src_table, self.src_column, self.target_table, self.target_column
            )
            .to_lowercase(),
        }
    }
}
