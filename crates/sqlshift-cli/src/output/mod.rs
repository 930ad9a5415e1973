//! Output formatting

use miette::Diagnostic;
use serde::Serialize;
use sqlshift_core::{MigrationError, TypeMap};

use crate::args::OutputFormat;

/// Statements produced by one plan operation
#[derive(Debug, Clone, Serialize)]
pub struct RenderedOperation {
    pub index: usize,
    pub op: &'static str,
    pub statements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output formatter for rendered plans
pub struct OutputFormatter {
    format: OutputFormat,
    file_name: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, file_name: String) -> Self {
        Self { format, file_name }
    }

    /// Print rendered operations in the configured format
    pub fn print_operations(&self, dialect: &str, operations: &[RenderedOperation]) {
        match self.format {
            OutputFormat::Sql => self.print_sql(operations),
            OutputFormat::Json => self.print_json(dialect, operations),
        }
    }

    fn print_sql(&self, operations: &[RenderedOperation]) {
        println!("-- {}", self.file_name);
        for rendered in operations {
            println!("-- [{}] {}", rendered.index, rendered.op);
            for statement in &rendered.statements {
                println!("{};", statement);
            }
        }
    }

    fn print_json(&self, dialect: &str, operations: &[RenderedOperation]) {
        let output = serde_json::json!({
            "file": self.file_name,
            "dialect": dialect,
            "operations": operations
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }

    /// Print a failed operation to stderr
    pub fn print_error(&self, index: usize, op: &str, error: &MigrationError) {
        let code = error
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "sqlshift".to_string());
        eprintln!("\x1b[31merror\x1b[0m[{}]: {}", code, error);
        eprintln!("  --> {} operation [{}] {}", self.file_name, index, op);

        // first line repeats the message printed above
        for line in error.format_detailed().lines().skip(1) {
            if !line.is_empty() {
                eprintln!("   {}", line);
            }
        }

        if let Some(help) = error.help() {
            eprintln!("   = help: {}", help);
        }

        eprintln!();
    }
}

/// Print a type map as `token -> native` lines or JSON
pub fn print_type_map(format: OutputFormat, types: &TypeMap) {
    match format {
        OutputFormat::Sql => {
            println!("Type map ({}, {:?}):", types.dialect(), types.policy());
            let width = types.iter().map(|(token, _)| token.len()).max().unwrap_or(0);
            for (token, native) in types.iter() {
                println!("  {:width$}  {}", token, native, width = width);
            }
        }
        OutputFormat::Json => {
            let entries: indexmap::IndexMap<&str, &str> = types.iter().collect();
            let output = serde_json::json!({
                "dialect": types.dialect().to_string(),
                "policy": types.policy(),
                "types": entries
            });
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to serialize output: {}", e),
            }
        }
    }
}
