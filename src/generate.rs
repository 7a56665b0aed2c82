//! File-tree generation from a resolved context.
//! Walks the template tree, renders every directory and file name, decides
//! per file between rendering and verbatim copying, and enforces the
//! overwrite, skip and rollback policies.

use crate::context::Context;
use crate::environment;
use crate::error::{Error, Result};
use crate::find;
use crate::hooks;
use crate::utils;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use minijinja::Environment;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Editor swap files are never written to the output tree.
const SWAP_FILE_SUFFIX: &str = ".swp";

/// How many leading bytes the binary heuristic inspects.
const BINARY_SAMPLE_LEN: usize = 1024;

/// Returns true when `bytes` look like non-text content: a null byte, or
/// more than 30% non-printable characters in the leading sample.
pub fn is_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(BINARY_SAMPLE_LEN)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let non_text = sample
        .iter()
        .filter(|&&byte| !byte.is_ascii_graphic() && !byte.is_ascii_whitespace() && byte < 0x80)
        .count();
    non_text as f64 / sample.len() as f64 > 0.3
}

/// A rendered name must stay a relative path inside the project directory.
/// Conditional names rendering to nothing are skipped, not errors.
fn is_rendered_path_valid(path: &str) -> bool {
    !path.trim().is_empty() && !path.starts_with('/') && !path.contains("//")
}

/// Compiles the manifest's `_copy_without_render` glob patterns. Patterns
/// match against the template-root-relative path, not the basename.
pub fn copy_only_globset(context: &Context) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    if let Some(Value::Array(patterns)) = context.variables.get("_copy_without_render") {
        for pattern in patterns {
            let Some(pattern) = pattern.as_str() else {
                continue;
            };
            builder.add(Glob::new(pattern).map_err(|err| Error::InvalidPattern {
                pattern: pattern.to_string(),
                detail: err.to_string(),
            })?);
        }
    }
    builder.build().map_err(|err| Error::InvalidPattern {
        pattern: "_copy_without_render".to_string(),
        detail: err.to_string(),
    })
}

/// Renders a template-relative path into its output location, or `None`
/// when the rendered name is empty/invalid and the entry must be skipped.
fn render_output_path(
    relative: &str,
    context: &Context,
    project_dir: &Path,
    env: &Environment,
) -> Result<Option<PathBuf>> {
    let rendered = environment::render_str(env, relative, context)?;
    if !is_rendered_path_valid(&rendered) {
        debug!("Skipping '{relative}': rendered name '{rendered}' is empty or invalid");
        return Ok(None);
    }
    Ok(Some(project_dir.join(rendered)))
}

/// Renders a directory name and creates it inside the project directory.
/// Creation is idempotent: an existing directory is reused as-is.
fn render_and_create_dir(
    relative: &str,
    context: &Context,
    project_dir: &Path,
    env: &Environment,
) -> Result<()> {
    if let Some(target) = render_output_path(relative, context, project_dir, env)? {
        debug!("Creating directory {}", target.display());
        fs::create_dir_all(target)?;
    }
    Ok(())
}

/// Renders one file's name and content into the project directory.
///
/// Binary and non-UTF-8 content is copied byte-identical without rendering;
/// text content goes through the template engine under the file's relative
/// path so syntax errors keep their location. With `skip_if_file_exists`
/// an existing destination is left untouched without error.
fn generate_file(
    infile: &Path,
    relative: &str,
    context: &Context,
    project_dir: &Path,
    env: &Environment,
    skip_if_file_exists: bool,
) -> Result<()> {
    let Some(outfile) = render_output_path(relative, context, project_dir, env)? else {
        return Ok(());
    };
    if skip_if_file_exists && outfile.exists() {
        debug!("File {} already exists, skipping", outfile.display());
        return Ok(());
    }
    if let Some(parent) = outfile.parent() {
        fs::create_dir_all(parent)?;
    }

    let raw = fs::read(infile)?;
    if is_binary(&raw) {
        debug!("Copying binary {relative} without rendering");
        fs::write(&outfile, &raw)?;
        return Ok(());
    }
    match String::from_utf8(raw) {
        Ok(content) => {
            let rendered = environment::render_named_str(env, relative, &content, context)?;
            debug!("Writing {}", outfile.display());
            fs::write(&outfile, rendered)?;
        }
        Err(err) => {
            // not valid UTF-8, copy like binary content
            fs::write(&outfile, err.into_bytes())?;
        }
    }
    Ok(())
}

/// Copies a copy-only file: its name is rendered, its content is not.
fn copy_without_render(
    infile: &Path,
    relative: &str,
    context: &Context,
    project_dir: &Path,
    env: &Environment,
) -> Result<()> {
    let Some(outfile) = render_output_path(relative, context, project_dir, env)? else {
        return Ok(());
    };
    if let Some(parent) = outfile.parent() {
        fs::create_dir_all(parent)?;
    }
    debug!("Copying {relative} without rendering");
    fs::copy(infile, outfile)?;
    Ok(())
}

fn populate(
    repo_dir: &Path,
    template_dir: &Path,
    context: &Context,
    project_dir: &Path,
    env: &Environment,
    skip_if_file_exists: bool,
    accept_hooks: bool,
) -> Result<()> {
    // The pre-generation hook must complete before any project file exists.
    if accept_hooks {
        hooks::run_hook(repo_dir, hooks::PRE_GEN_HOOK, project_dir, context)?;
    }

    let copy_only = copy_only_globset(context)?;

    for entry in WalkDir::new(template_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Io(err.into()))?;
        let relative = entry
            .path()
            .strip_prefix(template_dir)
            .map_err(|err| Error::Io(io::Error::other(err.to_string())))?
            .to_path_buf();
        let Some(relative_str) = relative.to_str() else {
            warn!("Skipping non-UTF-8 path {}", relative.display());
            continue;
        };

        if entry.file_type().is_dir() {
            render_and_create_dir(relative_str, context, project_dir, env)?;
        } else if relative_str.ends_with(SWAP_FILE_SUFFIX) {
            debug!("Ignoring editor swap file {relative_str}");
        } else if copy_only.is_match(relative_str) {
            copy_without_render(entry.path(), relative_str, context, project_dir, env)?;
        } else {
            generate_file(
                entry.path(),
                relative_str,
                context,
                project_dir,
                env,
                skip_if_file_exists,
            )?;
        }
    }

    if accept_hooks {
        hooks::run_hook(repo_dir, hooks::POST_GEN_HOOK, project_dir, context)?;
    }
    Ok(())
}

/// Renders the template tree rooted at `repo_dir` into `output_dir` and
/// returns the absolute path of the generated project directory.
///
/// # Arguments
/// * `repo_dir` - Template repository (manifest, hooks, templated project dir)
/// * `context` - Fully resolved context; read-only during generation
/// * `output_dir` - Where the project directory is created
/// * `overwrite_if_exists` - Delete and recreate an existing project directory
/// * `skip_if_file_exists` - Leave existing destination files untouched
/// * `accept_hooks` - Run pre/post generation hooks
/// * `keep_project_on_failure` - Leave partial output on disk when a failure occurs
///
/// # Errors
/// Any failure after the project directory exists removes the partially
/// generated tree first, unless `keep_project_on_failure` is set.
pub fn generate_files(
    repo_dir: &Path,
    context: &Context,
    output_dir: &Path,
    overwrite_if_exists: bool,
    skip_if_file_exists: bool,
    accept_hooks: bool,
    keep_project_on_failure: bool,
) -> Result<PathBuf> {
    let env = environment::create_environment(context)?;
    let template_dir = find::find_template(repo_dir)?;
    let template_name = template_dir
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::NonTemplatedInputDir {
            path: repo_dir.display().to_string(),
        })?;

    let rendered_name = environment::render_str(&env, template_name, context)?;
    let project_dir = output_dir.join(rendered_name.trim());
    if project_dir.exists() {
        if overwrite_if_exists {
            debug!("Removing existing project directory {}", project_dir.display());
            utils::rmtree(&project_dir)?;
        } else {
            debug!("Reusing existing project directory {}", project_dir.display());
        }
    }
    fs::create_dir_all(&project_dir)?;
    let project_dir = fs::canonicalize(&project_dir)?;
    debug!("Project directory is {}", project_dir.display());

    let result = populate(
        repo_dir,
        &template_dir,
        context,
        &project_dir,
        &env,
        skip_if_file_exists,
        accept_hooks,
    );
    if let Err(err) = result {
        if !keep_project_on_failure && project_dir.exists() {
            debug!("Generation failed, removing {}", project_dir.display());
            if let Err(cleanup_err) = utils::rmtree(&project_dir) {
                warn!(
                    "Unable to remove {}: {}",
                    project_dir.display(),
                    cleanup_err
                );
            }
        }
        return Err(err);
    }
    Ok(project_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn test_is_binary_detects_null_bytes() {
        assert!(is_binary(b"PK\x03\x04\x00\x00binary"));
        assert!(!is_binary(b"plain text\nwith lines\n"));
        assert!(!is_binary(b""));
    }

    #[test]
    fn test_is_binary_allows_utf8_text() {
        assert!(!is_binary("héllo wörld".as_bytes()));
    }

    #[test]
    fn test_is_rendered_path_valid() {
        assert!(is_rendered_path_valid("src/main.rs"));
        assert!(is_rendered_path_valid("README.md"));
        assert!(!is_rendered_path_valid(""));
        assert!(!is_rendered_path_valid("   "));
        assert!(!is_rendered_path_valid("/etc/passwd"));
        assert!(!is_rendered_path_valid("docs//index.md"));
    }

    #[test]
    fn test_copy_only_globset_matches_relative_paths() {
        let mut variables = IndexMap::new();
        variables.insert(
            "_copy_without_render".to_string(),
            json!(["*.html", "assets/*"]),
        );
        let globset = copy_only_globset(&Context::new(variables)).unwrap();

        assert!(globset.is_match("index.html"));
        assert!(globset.is_match("docs/index.html"));
        assert!(globset.is_match("assets/logo.svg"));
        assert!(!globset.is_match("src/main.rs"));
    }

    #[test]
    fn test_copy_only_globset_rejects_bad_pattern() {
        let mut variables = IndexMap::new();
        variables.insert("_copy_without_render".to_string(), json!(["a["]));
        assert!(matches!(
            copy_only_globset(&Context::new(variables)),
            Err(Error::InvalidPattern { .. })
        ));
    }
}
