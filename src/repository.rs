//! Template reference resolution.
//! Turns a template reference string (local path, VCS URL possibly behind
//! an abbreviation, or a zip archive) into a local directory that carries a
//! manifest, plus a flag saying whether that directory is a temporary
//! clone/extract to delete after generation.

use crate::archive;
use crate::context;
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::vcs;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Returns true when the reference looks like a repository URL: a known
/// scheme (with optional `git+`/`hg+` type prefix) or an scp-like
/// `user@host:path` form.
pub fn is_repo_url(value: &str) -> bool {
    let stripped = value
        .strip_prefix("git+")
        .or_else(|| value.strip_prefix("hg+"))
        .unwrap_or(value);

    if let Ok(url) = Url::parse(stripped) {
        if matches!(url.scheme(), "git" | "ssh" | "http" | "https" | "file") {
            return true;
        }
    }

    stripped
        .split_once('@')
        .is_some_and(|(user, rest)| !user.is_empty() && rest.contains(':'))
}

/// Returns true when the reference points at a zip archive.
pub fn is_zip_file(value: &str) -> bool {
    value.to_lowercase().ends_with(".zip")
}

/// Expands an abbreviated template reference.
///
/// An exact match replaces the whole reference; a `prefix:suffix` form
/// substitutes the suffix into the expansion's `{0}` placeholder (or keeps
/// the expansion verbatim when it has no placeholder).
pub fn expand_abbreviations(template: &str, abbreviations: &IndexMap<String, String>) -> String {
    if let Some(expansion) = abbreviations.get(template) {
        return expansion.clone();
    }
    for (abbreviation, expansion) in abbreviations {
        if let Some(suffix) = template.strip_prefix(&format!("{abbreviation}:")) {
            return expansion.replace("{0}", suffix);
        }
    }
    template.to_string()
}

/// Returns true when `repo_dir` carries a manifest file.
pub fn repository_has_manifest(repo_dir: &Path) -> bool {
    context::manifest_path(repo_dir).is_some()
}

/// Locates the repository directory for a template reference.
///
/// URLs are cloned and zip references extracted into `clone_to_dir`, both
/// flagged for cleanup; local references are tried inside `clone_to_dir`
/// first, then as a direct path. An explicit `directory` descends into the
/// repository before validation.
///
/// # Errors
/// * `Error::RepositoryNotFound` when the resolved location does not exist
///   or has no manifest file
pub fn determine_repo_dir(
    template: &str,
    abbreviations: &IndexMap<String, String>,
    clone_to_dir: &Path,
    checkout: Option<&str>,
    no_input: bool,
    password: Option<&str>,
    directory: Option<&str>,
    prompter: &dyn Prompter,
) -> Result<(PathBuf, bool)> {
    let template = expand_abbreviations(template, abbreviations);

    let (repo_dir, cleanup) = if is_repo_url(&template) {
        (
            vcs::clone(&template, checkout, clone_to_dir, no_input, prompter)?,
            true,
        )
    } else if is_zip_file(&template) {
        (
            archive::unzip(
                &template,
                is_repo_url(&template),
                clone_to_dir,
                no_input,
                password,
                prompter,
            )?,
            true,
        )
    } else {
        let stored = clone_to_dir.join(&template);
        if stored.exists() {
            (stored, false)
        } else {
            (PathBuf::from(&template), false)
        }
    };

    let repo_dir = match directory {
        Some(subdir) => repo_dir.join(subdir),
        None => repo_dir,
    };

    if repo_dir.exists() && repository_has_manifest(&repo_dir) {
        Ok((repo_dir, cleanup))
    } else {
        Err(Error::RepositoryNotFound {
            template,
            locations: repo_dir.display().to_string(),
        })
    }
}
