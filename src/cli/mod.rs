//! CLI module for the Ink compiler
//!
//! This module provides the command-line interface for the compiler and the
//! story runtime.
//!
//! ## Usage
//!
//! - `inkc <file>` - Compile a story and play it interactively
//! - `inkc --compile-only <file>` - Compile and report diagnostics only
//! - `inkc suite-config <dir>` - Print the conformance suite configuration
//!
//! With no file argument, the story source is read from stdin.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod suite;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::version::INK_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Ink narrative scripting language compiler
#[derive(Parser, Debug)]
#[command(name = "inkc")]
#[command(version = INK_VERSION)]
#[command(about = "The Ink narrative scripting language compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Story file to play (reads stdin when omitted)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Compile and report diagnostics without running
    #[arg(long = "compile-only")]
    pub compile_only: bool,

    /// Print the parse tree (debug)
    #[arg(long = "dump-ast")]
    pub dump_ast: bool,

    /// Print compiled bytecode (debug)
    #[arg(long = "dump-bytecode")]
    pub dump_bytecode: bool,

    /// Trace instruction execution to stderr
    #[arg(long)]
    pub trace: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the conformance test-suite configuration for a directory
    SuiteConfig {
        /// Directory holding the suite configuration file
        #[arg(value_name = "DIR")]
        config_dir: PathBuf,
        /// Use the installed-distribution layout instead of a build tree
        #[arg(long)]
        dist: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    // Structured logging with an env-based filter. The default level depends
    // on --trace so instruction tracing works without RUST_LOG gymnastics.
    let default_filter = if cli.trace { "inkc=trace" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .try_init();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Some(Command::SuiteConfig { config_dir, dist }) => {
            let layout = if dist {
                suite::SuiteLayout::Dist
            } else {
                suite::SuiteLayout::BuildTree
            };
            commands::print_suite_config(&config_dir, layout)
        }
        None => commands::play_story(
            cli.file.as_deref(),
            commands::PlayOptions {
                compile_only: cli.compile_only,
                dump_ast: cli.dump_ast,
                dump_bytecode: cli.dump_bytecode,
            },
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================
