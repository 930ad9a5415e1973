//! sqlshift CLI - render schema migration plans into dialect SQL

mod args;
mod config;
mod output;
mod plan;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use sqlshift_core::{for_dialect, DryRunConnection};

use crate::args::{Args, Command};
use crate::config::Config;
use crate::output::{print_type_map, OutputFormatter, RenderedOperation};
use crate::plan::Plan;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.quiet {
        tracing::Level::ERROR
    } else {
        match args.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Render {
            files,
            dialect,
            format,
            config: config_path,
            strict,
        } => {
            let config =
                Config::load(config_path.as_ref())?.merge_with_args(&dialect, &format, strict);
            let dialect = config.dialect()?;
            let output_format = config.output_format();

            let plan_files = expand_patterns(&files)?;
            if plan_files.is_empty() {
                miette::bail!("No plan files matched the given patterns");
            }

            let mut total_errors = 0;
            let mut total_operations = 0;

            for plan_file in &plan_files {
                let plan = Plan::from_file(plan_file)?;
                let formatter = OutputFormatter::new(output_format, plan_file.display().to_string());

                let connection = DryRunConnection::new(dialect);
                let adapter = for_dialect(dialect, &connection, config.type_map(dialect));

                let mut rendered = Vec::with_capacity(plan.operations.len());
                for (i, op) in plan.operations.iter().enumerate() {
                    let index = i + 1;
                    connection.clear();
                    let error = match op.apply(adapter.as_ref(), &connection, &config) {
                        Ok(()) => None,
                        Err(e) => {
                            formatter.print_error(index, op.name(), &e);
                            total_errors += 1;
                            Some(e.to_string())
                        }
                    };
                    rendered.push(RenderedOperation {
                        index,
                        op: op.name(),
                        statements: connection.executed(),
                        error,
                    });
                }

                total_operations += rendered.len();
                formatter.print_operations(&dialect.to_string(), &rendered);
            }

            if !args.quiet {
                if total_errors > 0 {
                    eprintln!(
                        "Found {} failing operation(s) out of {} in {} file(s)",
                        total_errors,
                        total_operations,
                        plan_files.len()
                    );
                } else {
                    eprintln!(
                        "Rendered {} operation(s) from {} file(s) for {}",
                        total_operations,
                        plan_files.len(),
                        dialect
                    );
                }
            }

            Ok(total_errors > 0)
        }

        Command::Types {
            dialect,
            format,
            config: config_path,
        } => {
            let config =
                Config::load(config_path.as_ref())?.merge_with_args(&dialect, &format, false);
            let dialect = config.dialect()?;
            print_type_map(config.output_format(), &config.type_map(dialect));
            Ok(false)
        }
    }
}

/// Expand glob patterns; plain paths are kept as given
fn expand_patterns(patterns: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.display().to_string();
        if pattern_str.contains('*') {
            for path in glob::glob(&pattern_str).into_diagnostic()?.flatten() {
                files.push(path);
            }
        } else {
            files.push(pattern.clone());
        }
    }
    Ok(files)
}
