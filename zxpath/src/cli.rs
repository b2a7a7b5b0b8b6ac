//! The zxpath command line interface.

use clap::{crate_version, Parser};

use crate::json::JsonError;
use crate::rules::RewriteError;

pub mod check;
pub mod rewrite;

/// CLI arguments.
#[derive(Parser, Debug)]
#[clap(version = crate_version!(), long_about = None)]
#[clap(about = "Rewrite ZX-diagrams while keeping their traced paths")]
pub enum Cli {
    /// Print a summary of a diagram and check its paths.
    Check(check::CheckArgs),
    /// Dry-run or apply a rewrite rule.
    Rewrite(rewrite::RewriteArgs),
}

/// Error type for the CLI.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum CliError {
    /// Error reading or writing files.
    #[display("IO error: {_0}")]
    IO(std::io::Error),
    /// Error decoding or encoding a diagram.
    #[display("Error reading diagram: {_0}")]
    Json(JsonError),
    /// The rewrite was rejected or failed.
    #[display("Rewrite failed: {_0}")]
    Rewrite(RewriteError),
    /// A node or edge name that is not in the diagram.
    #[display("No {_0} named {_1:?}")]
    UnknownName(&'static str, String),
    /// Some paths of the diagram are broken.
    #[display("{_0} invalid path(s)")]
    InvalidPaths(usize),
    /// A step that builds on a placeholder no earlier step created.
    #[display("{_0} needs a placeholder from an earlier step")]
    MissingHub(&'static str),
}

impl Cli {
    pub fn run(self) -> Result<(), CliError> {
        match self {
            Cli::Check(args) => args.run(),
            Cli::Rewrite(args) => args.run(),
        }
    }
}
