//! Stencil is a template processing system for project scaffolding.
//! It renders a concrete project tree from a template directory, collecting
//! variable values interactively, from configuration, or from a replay file.

/// Zip archive fetching and extraction
pub mod archive;

/// Command-line interface module for the stencil application
pub mod cli;

/// User configuration handling (~/.stencilrc)
pub mod config;

/// Manifest loading and context construction with layered overrides
pub mod context;

/// Template engine environment in strict mode plus the extension registry
pub mod environment;

/// Error types and handling for the stencil application
pub mod error;

/// Locating the templated project directory inside a template repository
pub mod find;

/// File-tree generation from a resolved context
pub mod generate;

/// Pre and post generation hook processing
/// Handles execution of scripts in:
/// - hooks/pre_prompt
/// - hooks/pre_gen_project
/// - hooks/post_gen_project
pub mod hooks;

/// User input and interaction handling
pub mod prompt;

/// Resolved-context persistence for replay runs
pub mod replay;

/// Template reference resolution (local path, VCS URL, zip archive)
pub mod repository;

/// End-to-end orchestration of a scaffolding run
pub mod scaffold;

/// Filesystem helpers shared across modules
pub mod utils;

/// Version control system subprocess handling
pub mod vcs;
