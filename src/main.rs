//! Stencil's main application entry point.
//! Parses command-line arguments, configures logging and hands over to the
//! scaffolding pipeline, printing a one-line error on failure.

use stencil::cli::{get_args, parse_extra_context, Args};
use stencil::error::{default_error_handler, Result};
use stencil::prompt::{DialoguerPrompter, Prompter};
use stencil::scaffold::{scaffold, ScaffoldOptions};

fn main() {
    let args = get_args();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Off
        })
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: Args) -> Result<()> {
    let prompter = DialoguerPrompter::new();
    let extra_context = parse_extra_context(&args.extra_context)?;

    let accept_hooks = match args.accept_hooks.as_str() {
        "no" => false,
        "ask" => prompter.read_bool("Do you want to execute hooks?", true)?,
        _ => true,
    };

    let options = ScaffoldOptions {
        template: args.template,
        checkout: args.checkout,
        no_input: args.no_input,
        extra_context,
        replay: args.replay || args.replay_file.is_some(),
        replay_file: args.replay_file,
        overwrite_if_exists: args.overwrite_if_exists,
        output_dir: args.output_dir,
        config_file: args.config_file,
        default_config: args.default_config,
        password: std::env::var("STENCIL_REPO_PASSWORD").ok(),
        directory: args.directory,
        skip_if_file_exists: args.skip_if_file_exists,
        accept_hooks,
        keep_project_on_failure: args.keep_project_on_failure,
    };

    let project_dir = scaffold(&options, &prompter)?;
    println!("Project generated successfully in {}.", project_dir.display());
    Ok(())
}
