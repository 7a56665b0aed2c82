//! Error handling for the stencil application.
//! Defines the error taxonomy and the result alias used throughout.

use std::io;
use thiserror::Error;

/// All failure modes a stencil run can surface.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The manifest could not be parsed as JSON or YAML
    #[error("Decoding error while loading '{path}': {detail}")]
    ManifestDecode { path: String, detail: String },

    /// Template syntax or evaluation error; the minijinja display keeps
    /// the template name and line of the failure intact
    #[error("Template error: {0:#}")]
    Template(#[from] minijinja::Error),

    /// A template referenced a name absent from the context
    #[error("Undefined variable in template: {detail}. Context: {context}")]
    UndefinedVariable { detail: String, context: String },

    /// The manifest requested an extension that is not in the registry
    #[error("Unable to load extension: '{name}'")]
    UnknownExtension { name: String },

    #[error(
        "A valid repository for \"{template}\" could not be found in the following locations:\n{locations}"
    )]
    RepositoryNotFound { template: String, locations: String },

    /// The repository has a manifest but no templated project directory
    #[error("The repository '{path}' is not a valid template: no templated project directory found")]
    NonTemplatedInputDir { path: String },

    #[error("Hook script '{hook}' failed (exit status: {status})")]
    HookFailed { hook: String, status: i32 },

    #[error("Invalid zip archive '{path}': {detail}")]
    InvalidZip { path: String, detail: String },

    /// The version control binary required for a clone is missing
    #[error("'{vcs}' is not installed")]
    VcsNotInstalled { vcs: String },

    #[error("Unable to clone '{repo}': {detail}")]
    CloneFailed { repo: String, detail: String },

    #[error("Invalid user configuration '{path}': {detail}")]
    InvalidConfig { path: String, detail: String },

    #[error("Invalid copy-only pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    #[error("Replay file not found: '{path}'")]
    ReplayNotFound { path: String },

    #[error("Invalid context entry '{entry}': expected key=value")]
    InvalidContextEntry { entry: String },

    /// User interaction could not be completed
    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Convenience alias for results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// Prints a one-line error description to stderr and exits with status 1;
/// no backtrace is shown.
pub fn default_error_handler(err: Error) -> ! {
    eprintln!("{err}");
    std::process::exit(1);
}
