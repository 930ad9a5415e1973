//! Portable column types and their native spellings

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dialect::SqlDialect;
use crate::error::{MigrationError, Result};

/// What to do with a type token that has no entry in the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupPolicy {
    /// Emit the token unchanged
    #[default]
    Lenient,
    /// Fail with a translation error
    Strict,
}

/// Mapping from abstract type token to native SQL type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    dialect: SqlDialect,
    entries: IndexMap<String, String>,
    policy: LookupPolicy,
}

impl TypeMap {
    /// Create an empty, lenient map for a dialect
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            entries: IndexMap::new(),
            policy: LookupPolicy::Lenient,
        }
    }

    pub fn mysql() -> Self {
        Self::new(SqlDialect::MySQL).with_entries([
            ("string", "VARCHAR(255)"),
            ("text", "TEXT"),
            ("integer", "INT"),
            ("bigint", "BIGINT"),
            ("smallint", "SMALLINT"),
            ("float", "FLOAT"),
            ("decimal", "DECIMAL"),
            ("boolean", "TINYINT(1)"),
            ("datetime", "DATETIME"),
            ("timestamp", "TIMESTAMP"),
            ("time", "TIME"),
            ("date", "DATE"),
            ("binary", "BLOB"),
            ("primary_key", "INT NOT NULL AUTO_INCREMENT PRIMARY KEY"),
        ])
    }

    pub fn postgres() -> Self {
        Self::new(SqlDialect::PostgreSQL).with_entries([
            ("string", "VARCHAR(255)"),
            ("text", "TEXT"),
            ("integer", "INTEGER"),
            ("bigint", "BIGINT"),
            ("smallint", "SMALLINT"),
            ("float", "DOUBLE PRECISION"),
            ("decimal", "NUMERIC"),
            ("boolean", "BOOLEAN"),
            ("datetime", "TIMESTAMP"),
            ("timestamp", "TIMESTAMP"),
            ("time", "TIME"),
            ("date", "DATE"),
            ("binary", "BYTEA"),
            ("primary_key", "SERIAL PRIMARY KEY"),
        ])
    }

    /// Add or replace entries
    pub fn with_entries<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (token, native) in entries {
            self.entries.insert(token.into(), native.into());
        }
        self
    }

    pub fn with_policy(mut self, policy: LookupPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for `with_policy(LookupPolicy::Strict)`
    pub fn strict(self) -> Self {
        self.with_policy(LookupPolicy::Strict)
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn policy(&self) -> LookupPolicy {
        self.policy
    }

    /// Native type for a token, if mapped
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(|s| s.as_str())
    }

    /// Translate a token to its native type according to the lookup policy
    pub fn translate<'a>(&'a self, token: &'a str) -> Result<Cow<'a, str>> {
        if let Some(native) = self.get(token) {
            return Ok(Cow::Borrowed(native));
        }
        match self.policy {
            LookupPolicy::Lenient => Ok(Cow::Borrowed(token)),
            LookupPolicy::Strict => Err(MigrationError::Translation {
                token: token.to_string(),
                dialect: self.dialect.to_string(),
            }),
        }
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
