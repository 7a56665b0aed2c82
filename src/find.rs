//! Locating the templated project directory inside a template repository.

use crate::context::CONTEXT_KEY;
use crate::error::{Error, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Determines which child directory of `repo_dir` is the project template.
///
/// By convention the project template is the directory whose own name is a
/// template expression referencing the context key, e.g.
/// `{{ stencil.project_slug }}`. Its rendered name becomes the generated
/// project root. Entries are scanned in sorted order so discovery is
/// deterministic.
///
/// # Errors
/// * `Error::NonTemplatedInputDir` when no such directory exists
pub fn find_template(repo_dir: &Path) -> Result<PathBuf> {
    debug!("Searching {} for the project template", repo_dir.display());

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(repo_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    candidates.sort();

    for candidate in candidates {
        if !candidate.is_dir() {
            continue;
        }
        let Some(name) = candidate.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.contains("{{") && name.contains("}}") && name.contains(CONTEXT_KEY) {
            return Ok(candidate);
        }
    }

    Err(Error::NonTemplatedInputDir {
        path: repo_dir.display().to_string(),
    })
}
