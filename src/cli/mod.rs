//! Command-line interface for Mima
//!
//! Provides commands: run, check, tokens

mod check_cmd;
pub(crate) mod run_cmd;
mod tokens_cmd;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::diagnostics::{report, Diagnostic};
use crate::parser::include::DEFAULT_EXTENSIONS;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "MIMA_LOG";

/// Mima - a simulator for the minimal accumulator machine
#[derive(Parser, Debug)]
#[command(name = "mima")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output diagnostics and results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log interpreter activity (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a Mima program
    Run {
        /// File to run
        file: PathBuf,

        /// Configuration file (defaults to the nearest mima.toml)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Guarded steps per trampoline bounce
        #[arg(long)]
        budget: Option<usize>,

        /// Print non-zero memory cells after the run
        #[arg(long)]
        dump_memory: bool,
    },

    /// Check for syntax errors without running
    Check {
        /// Files or directories to check
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,
    },

    /// Print the tokens of a source file
    Tokens {
        /// File to tokenize
        file: PathBuf,
    },
}

impl Cli {
    pub fn execute(self) -> Result<(), Box<dyn std::error::Error>> {
        match self.command {
            Command::Run {
                file,
                config,
                budget,
                dump_memory,
            } => {
                let options = run_cmd::RunOptions {
                    config,
                    budget,
                    dump_memory,
                    json: self.json,
                    quiet: self.quiet,
                };
                run_cmd::run_program(&file, &options)?;
            }
            Command::Check { paths } => {
                check_cmd::run_check(&paths, self.json)?;
            }
            Command::Tokens { file } => {
                tokens_cmd::run_tokens(&file, self.json)?;
            }
        }

        Ok(())
    }
}

/// Install the `tracing` subscriber; `MIMA_LOG` overrides the default level
pub fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // a second initialization (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Explicit configuration, else the nearest `mima.toml` above `file`, else defaults
fn load_config(explicit: Option<&Path>, file: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        return Ok(Config::load(path)?);
    }
    let start = file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(Config::discover(start)?.unwrap_or_default())
}

/// Print a diagnostic as JSON or with source context.
///
/// Diagnostics inside included files are shown against that file's text.
fn report_diagnostic(diagnostic: &Diagnostic, file: &Path, source: &str, json: bool) {
    if json {
        println!("{}", diagnostic.to_json());
        return;
    }
    if diagnostic.span.file == file {
        report::emit(diagnostic, source);
    } else if let Ok(included) = std::fs::read_to_string(&diagnostic.span.file) {
        report::emit(diagnostic, &included);
    } else {
        eprintln!("{}", diagnostic.to_human_readable(""));
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DEFAULT_EXTENSIONS.contains(&ext))
}

/// Source files under `paths`, in a stable order
fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_file() {
            sources.push(path.clone());
        } else if path.is_dir() {
            sources.extend(walkdir(path)?.into_iter().filter(|p| is_source_file(p)));
        } else {
            return Err(format!("{}: no such file or directory", path.display()).into());
        }
    }
    sources.sort();
    sources.dedup();
    Ok(sources)
}

fn walkdir(path: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut results = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_file() {
            results.push(entry_path);
        } else if entry_path.is_dir() {
            results.extend(walkdir(&entry_path)?);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests;
