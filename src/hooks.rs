//! Hook discovery and execution.
//! Templates may carry scripts under `hooks/` that run at fixed points of
//! the generation lifecycle. Pre/post generation scripts are rendered as
//! templates against the full context before execution, so they see the
//! same variables the file tree does.

use crate::context::Context;
use crate::environment;
use crate::error::{Error, Result};
use crate::utils;
use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs before any context resolution, on an isolated copy of the template.
pub const PRE_PROMPT_HOOK: &str = "pre_prompt";
/// Runs after the project directory exists but before any file is written.
pub const PRE_GEN_HOOK: &str = "pre_gen_project";
/// Runs after the whole tree has been written.
pub const POST_GEN_HOOK: &str = "post_gen_project";

/// Script types a hook may use; the extension picks the interpreter.
const SCRIPT_EXTENSIONS: [&str; 2] = [".sh", ".py"];

/// Determines if a hook file name is valid for the given hook: it must
/// start with the hook's name, end with a known script extension
/// (case-sensitively) and not be a compiled-bytecode artifact.
pub fn valid_hook(file_name: &str, hook_name: &str) -> bool {
    file_name.starts_with(hook_name)
        && SCRIPT_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
        && !file_name.ends_with(".pyc")
}

/// Finds the script for `hook_name` under the template's `hooks` directory.
/// Entries are scanned in sorted order and at most one script per hook is
/// used; missing hooks are not an error.
pub fn find_hook(repo_dir: &Path, hook_name: &str) -> Option<PathBuf> {
    let hooks_dir = repo_dir.join("hooks");
    if !hooks_dir.exists() {
        return None;
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(&hooks_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    entries.into_iter().find(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| valid_hook(name, hook_name))
    })
}

/// Executes a script as a subprocess from the given working directory.
/// `.py` scripts run through `python3`, everything else runs directly.
///
/// # Errors
/// * `Error::HookFailed` with the exit status when the process exits non-zero
pub fn run_script(script_path: &Path, cwd: &Path) -> Result<()> {
    let mut command = if script_path.extension().is_some_and(|ext| ext == "py") {
        let mut command = Command::new("python3");
        command.arg(script_path);
        command
    } else {
        Command::new(script_path)
    };

    let status = command.current_dir(cwd).status().map_err(Error::Io)?;
    if !status.success() {
        return Err(Error::HookFailed {
            hook: script_path.display().to_string(),
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

/// Renders a hook script against the context, writes it to a private
/// temporary location with the extension preserved, marks it executable and
/// runs it. The temporary file is removed on every exit path.
pub fn run_script_with_context(script_path: &Path, cwd: &Path, context: &Context) -> Result<()> {
    let script = fs::read_to_string(script_path)?;
    let env = environment::create_environment(context)?;
    let rendered = environment::render_str(&env, &script, context)?;

    let suffix = script_path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let mut temp_script = tempfile::Builder::new()
        .prefix("stencil-hook-")
        .suffix(&suffix)
        .tempfile()?;
    temp_script.write_all(rendered.as_bytes())?;
    temp_script.flush()?;

    // Close the handle before exec; the path still cleans itself up.
    let temp_path = temp_script.into_temp_path();
    utils::make_executable(&temp_path)?;
    run_script(&temp_path, cwd)
}

/// Finds and runs the named hook, if the template provides one.
/// Discovery uses the template repository; execution uses `project_dir`
/// as the working directory.
pub fn run_hook(repo_dir: &Path, hook_name: &str, project_dir: &Path, context: &Context) -> Result<()> {
    let Some(hook_path) = find_hook(repo_dir, hook_name) else {
        return Ok(());
    };
    debug!("Running hook {hook_name}");
    run_script_with_context(&hook_path, project_dir, context)
}

/// Runs the pre-prompt hook on a temporary copy of the template repository
/// and returns the copy, which becomes the effective template root. The
/// hook runs unrendered since no context exists yet.
pub fn run_pre_prompt_hook(repo_dir: &Path) -> Result<PathBuf> {
    let temp_dir = utils::create_tmp_repo_dir(repo_dir)?;
    if let Some(hook_path) = find_hook(&temp_dir, PRE_PROMPT_HOOK) {
        debug!("Running hook {PRE_PROMPT_HOOK}");
        utils::make_executable(&hook_path)?;
        run_script(&hook_path, &temp_dir)?;
    }
    Ok(temp_dir)
}
