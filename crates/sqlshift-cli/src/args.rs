//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sqlshift")]
#[command(author, version, about = "Render schema migration plans into dialect SQL")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render plan files into the SQL statements a dialect would run
    Render {
        /// Plan files to render (supports glob patterns)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// SQL dialect
        #[arg(short, long, env = "SQLSHIFT_DIALECT")]
        dialect: Option<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Configuration file (defaults to the nearest sqlshift.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Fail on column types missing from the type map
        #[arg(long)]
        strict: bool,
    },

    /// Display the effective type map of a dialect
    Types {
        /// SQL dialect
        #[arg(short, long, env = "SQLSHIFT_DIALECT")]
        dialect: Option<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Configuration file (defaults to the nearest sqlshift.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Plain SQL, one statement per line
    #[default]
    Sql,
    /// JSON output
    Json,
}
