// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `devmirror`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devmirror",
    version,
    about = "Mirror a TypeScript source tree into a runnable JavaScript tree, \
             rerunning hooks and restarting the dev server on changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Source directory (or a single source file).
    #[arg(long, short = 's', value_name = "PATH")]
    pub src: PathBuf,

    /// Destination directory (or destination file when --src is a file).
    #[arg(long, short = 'd', value_name = "PATH")]
    pub dest: PathBuf,

    /// Path to exclude from scanning; can be given multiple times.
    ///
    /// The destination directory is always excluded, so a destination
    /// nested inside the source tree never mirrors into itself.
    #[arg(long, short = 'e', value_name = "PATH")]
    pub exclude: Vec<PathBuf>,

    /// Path of the tsconfig file supplying transpile options.
    #[arg(long, short = 'p', value_name = "FILE", default_value = "tsconfig.json")]
    pub project: PathBuf,

    /// Watch for changes and keep the mirror, hooks and server live.
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Post-build hook command; can be given multiple times.
    ///
    /// A hook may carry a `#watch:<path>[,<path>...]` suffix binding it
    /// to specific trigger files; escape a literal occurrence as
    /// `\#watch:`.
    #[arg(long = "post-hook", value_name = "CMD")]
    pub post_hook: Vec<String>,

    /// Server entry file to supervise (launched with node).
    #[arg(long = "serve", value_name = "FILE")]
    pub serve: Option<PathBuf>,

    /// Working directory for hooks and the server process.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// URL to open in the browser after the first successful server start.
    #[arg(long, value_name = "URL")]
    pub open: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVMIRROR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
