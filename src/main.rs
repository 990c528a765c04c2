//! Doc View - Command-line tool for generating parameter documentation.
//!
//! # Usage
//!
//! ```bash
//! doc-view [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Document a type as a Markdown table:
//! ```bash
//! doc-view ./my-project -t "Page<User>"
//! ```
//!
//! Document every endpoint as JSON-Schema:
//! ```bash
//! doc-view ./my-project -f json-schema -o schemas.json
//! ```
//!
//! Save API-catalog payloads into a directory:
//! ```bash
//! doc-view ./my-project -f payload -o catalog/
//! ```

use anyhow::Result;
use clap::Parser;
use doc_view::cli;
use log::info;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Doc View starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    Ok(())
}
