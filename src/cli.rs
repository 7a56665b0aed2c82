//! Command-line interface implementation for stencil.
//! Provides argument parsing and help text formatting using clap.

use crate::error::{Error, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::PathBuf;

/// Command-line arguments structure for stencil.
#[derive(Parser, Debug)]
#[command(author, version, about = "Stencil: render project trees from templates", long_about = None)]
pub struct Args {
    /// Path to the template directory, repository URL, or zip archive
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Additional context entries as key=value pairs
    #[arg(value_name = "EXTRA_CONTEXT")]
    pub extra_context: Vec<String>,

    /// Do not prompt for parameters; use rendered manifest defaults
    #[arg(long)]
    pub no_input: bool,

    /// The branch, tag or commit ID to checkout after clone
    #[arg(short, long)]
    pub checkout: Option<String>,

    /// Directory within the repository that holds the manifest
    #[arg(long)]
    pub directory: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not prompt for parameters; read them from the saved replay
    #[arg(long)]
    pub replay: bool,

    /// Use this file as the replay source
    #[arg(long, value_name = "FILE")]
    pub replay_file: Option<PathBuf>,

    /// Overwrite the contents of the output directory if it already exists
    #[arg(short = 'f', long)]
    pub overwrite_if_exists: bool,

    /// Skip files in the output directory that already exist
    #[arg(short = 's', long)]
    pub skip_if_file_exists: bool,

    /// Where to output the generated project dir into
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// User configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Use default values rather than a config file
    #[arg(long)]
    pub default_config: bool,

    /// Whether to run hooks from the template
    #[arg(long, default_value = "yes", value_parser = ["yes", "ask", "no"])]
    pub accept_hooks: String,

    /// Keep the generated project directory even when generation fails
    #[arg(long)]
    pub keep_project_on_failure: bool,
}

/// Turns trailing `key=value` arguments into the extra override layer.
pub fn parse_extra_context(entries: &[String]) -> Result<IndexMap<String, Value>> {
    let mut extra = IndexMap::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(Error::InvalidContextEntry {
                entry: entry.clone(),
            });
        };
        extra.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(extra)
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help()
                    .unwrap();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
