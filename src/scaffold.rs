//! End-to-end orchestration of a scaffolding run.
//! Wires configuration, repository resolution, the pre-prompt hook,
//! context construction, variable resolution (or replay) and file-tree
//! generation together; this is also the crate's library entry point.

use crate::config;
use crate::context::{self, Context};
use crate::error::{Error, Result};
use crate::generate;
use crate::hooks;
use crate::prompt::{self, Prompter};
use crate::replay;
use crate::repository;
use crate::utils;
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;
use std::path::PathBuf;

/// Everything a scaffolding run can be configured with; mirrors the
/// command-line surface so the library can be driven the same way.
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    /// Template reference: local path, repository URL or zip archive
    pub template: String,
    /// Branch, tag or commit to checkout after clone
    pub checkout: Option<String>,
    /// Accept rendered defaults instead of prompting
    pub no_input: bool,
    /// Caller-supplied overrides, the last (winning) layer
    pub extra_context: IndexMap<String, Value>,
    /// Resolve from the recorded replay instead of prompting
    pub replay: bool,
    /// Explicit replay file path, overriding the replay directory lookup
    pub replay_file: Option<PathBuf>,
    pub overwrite_if_exists: bool,
    pub output_dir: PathBuf,
    pub config_file: Option<PathBuf>,
    pub default_config: bool,
    /// Password for protected zip archives
    pub password: Option<String>,
    /// Directory within the repository that holds the manifest
    pub directory: Option<String>,
    pub skip_if_file_exists: bool,
    pub accept_hooks: bool,
    pub keep_project_on_failure: bool,
}

impl Default for ScaffoldOptions {
    fn default() -> Self {
        Self {
            template: String::new(),
            checkout: None,
            no_input: false,
            extra_context: IndexMap::new(),
            replay: false,
            replay_file: None,
            overwrite_if_exists: false,
            output_dir: PathBuf::from("."),
            config_file: None,
            default_config: false,
            password: None,
            directory: None,
            skip_if_file_exists: false,
            accept_hooks: true,
            keep_project_on_failure: false,
        }
    }
}

/// Basename replay files are stored under for a template reference.
fn template_basename(template: &str) -> String {
    let trimmed = template.trim_end_matches('/');
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    base.trim_end_matches(".git")
        .trim_end_matches(".zip")
        .to_string()
}

/// Runs the whole pipeline and returns the generated project directory.
///
/// # Flow
/// 1. Load user configuration
/// 2. Resolve the template reference to a local repository
/// 3. Run the pre-prompt hook on an isolated copy, if present
/// 4. Build the context from the manifest plus override layers
/// 5. Descend into a nested template when the manifest offers them
/// 6. Resolve variables interactively/non-interactively, or load a replay
/// 7. Stamp the template origin and record the replay
/// 8. Generate the file tree (hooks, rollback policy included)
/// 9. Clean up temporary clones/extracts
pub fn scaffold(options: &ScaffoldOptions, prompter: &dyn Prompter) -> Result<PathBuf> {
    let config = config::get_user_config(options.config_file.as_deref(), options.default_config)?;

    let (base_repo_dir, cleanup_base) = repository::determine_repo_dir(
        &options.template,
        &config.abbreviations,
        &config.templates_dir,
        options.checkout.as_deref(),
        options.no_input,
        options.password.as_deref(),
        options.directory.as_deref(),
        prompter,
    )?;

    // The pre-prompt hook mutates an isolated copy, which then becomes the
    // effective template root.
    let copy_root = if options.accept_hooks
        && hooks::find_hook(&base_repo_dir, hooks::PRE_PROMPT_HOOK).is_some()
    {
        Some(hooks::run_pre_prompt_hook(&base_repo_dir)?)
    } else {
        None
    };
    let repo_dir = copy_root.clone().unwrap_or_else(|| base_repo_dir.clone());

    let manifest_file = context::manifest_path(&repo_dir).ok_or_else(|| {
        Error::RepositoryNotFound {
            template: options.template.clone(),
            locations: repo_dir.display().to_string(),
        }
    })?;
    let base_context = context::generate_context(
        &manifest_file,
        Some(&config.default_context),
        Some(&options.extra_context),
    )?;

    // Nested templates move the root; the nested manifest is re-read with
    // the same override layers.
    let nested_dir =
        prompt::choose_nested_template(&base_context, &repo_dir, prompter, options.no_input)?;
    let (repo_dir, unresolved) = if nested_dir == repo_dir {
        (repo_dir, base_context)
    } else {
        debug!("Using nested template at {}", nested_dir.display());
        let nested_manifest = context::manifest_path(&nested_dir).ok_or_else(|| {
            Error::RepositoryNotFound {
                template: options.template.clone(),
                locations: nested_dir.display().to_string(),
            }
        })?;
        let nested_context = context::generate_context(
            &nested_manifest,
            Some(&config.default_context),
            Some(&options.extra_context),
        )?;
        (nested_dir, nested_context)
    };

    let template_name = template_basename(&options.template);
    let mut resolved = if options.replay {
        let loaded = match &options.replay_file {
            Some(file) => replay::load_file(file)?,
            None => replay::load(&config.replay_dir, &template_name)?,
        };
        loaded.ok_or_else(|| Error::ReplayNotFound {
            path: options
                .replay_file
                .clone()
                .unwrap_or_else(|| replay::get_file_name(&config.replay_dir, &template_name))
                .display()
                .to_string(),
        })?
    } else {
        Context::new(prompt::prompt_for_config(&unresolved, prompter, options.no_input)?)
    };

    // Stamp the template origin so rendered files can reference where they
    // came from.
    resolved
        .variables
        .insert("_template".to_string(), Value::String(options.template.clone()));

    if !options.replay {
        replay::dump(&config.replay_dir, &template_name, &resolved)?;
    }

    let project_dir = generate::generate_files(
        &repo_dir,
        &resolved,
        &options.output_dir,
        options.overwrite_if_exists,
        options.skip_if_file_exists,
        options.accept_hooks,
        options.keep_project_on_failure,
    )?;

    if let Some(copy_root) = copy_root {
        if let Err(err) = utils::rmtree(&copy_root) {
            warn!("Unable to remove {}: {}", copy_root.display(), err);
        }
    }
    if cleanup_base {
        if let Err(err) = utils::rmtree(&base_repo_dir) {
            warn!("Unable to remove {}: {}", base_repo_dir.display(), err);
        }
    }

    Ok(project_dir)
}
