//! CLI definition for the formrender command-line interface.
//!
//! This module only depends on `clap` and `std`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// formrender - drive a form schema from the command line.
///
/// Builds the live field tree for a schema, mounts every field, applies a
/// values file and lets async bindings settle before reporting.
#[derive(Parser, Debug)]
#[command(name = "formrender")]
#[command(version)]
#[command(about = "Drive a declarative form schema from the command line")]
#[command(
    long_about = "formrender builds the live field tree for a JSON or YAML form schema, \
    applies values, resolves data bindings and prints the resulting values or a \
    validation report.\n\n\
    Environment variables:\n  \
    FORMRENDER_PROPAGATION__MAX_DEPTH  Bound on nested dependency propagation\n  \
    FORMRENDER_HTTP__BACKEND           http or disabled\n  \
    FORMRENDER_HTTP__BASE_URL          Prefix for binding URLs starting with /\n  \
    FORMRENDER_HTTP__TIMEOUT_MS        Request timeout for async bindings"
)]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Engine configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the values of every field as JSON
    Values {
        /// Form schema (.json, .yaml or .yml)
        schema: PathBuf,
        /// Values to apply before printing (.json, .yaml or .yml)
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,
    },

    /// Validate values against the schema rules
    Validate {
        /// Form schema (.json, .yaml or .yml)
        schema: PathBuf,
        /// Values to validate (.json, .yaml or .yml)
        #[arg(long, value_name = "FILE")]
        values: PathBuf,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}
