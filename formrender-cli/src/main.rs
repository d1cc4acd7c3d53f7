//! formrender CLI - drive a declarative form schema from the command line.
//!
//! Commands:
//! - `formrender values <schema> [--values FILE]`: Print every field value as JSON
//! - `formrender validate <schema> --values FILE [--json]`: Print the validation report
//!
//! Environment variables:
//! - FORMRENDER_*: Engine settings, nested keys separated by `__`
//! - RUST_LOG: Log filter when `--debug` is not given
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error
//! - 2: Validation failed

use clap::Parser;
use tracing_subscriber::EnvFilter;

use formrender::commands;
use formrender::{Cli, CliResult, Commands};
use formrender_fields::Validator;

/// Print a command's output and map errors to exit codes.
fn handle_result<T>(result: CliResult<T>, print: impl FnOnce(T) -> CliResult<i32>) -> i32 {
    match result.and_then(print) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level
    let filter = if cli.debug {
        EnvFilter::new("formrender=debug,formrender_fields=debug,formrender_config=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Commands::Values { schema, values } => handle_result(
            commands::run_values(&schema, values.as_deref(), config).await,
            |values| {
                println!("{}", serde_json::to_string_pretty(&values)?);
                Ok(0)
            },
        ),

        Commands::Validate {
            schema,
            values,
            json,
        } => handle_result(
            commands::run_validate(&schema, &values, config).await,
            |report| {
                println!("{}", commands::render_report(&report, json)?);
                Ok(if Validator::has_errors(&report) { 2 } else { 0 })
            },
        ),
    };

    std::process::exit(exit_code);
}
