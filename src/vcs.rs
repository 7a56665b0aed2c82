//! Version control system subprocess handling.
//! Clones template repositories with the system `git` or `hg` binary and
//! optionally checks out a branch, tag or commit.

use crate::error::{Error, Result};
use crate::prompt::{self, Prompter};
use crate::utils;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Splits an optional `git+`/`hg+` type prefix off a repository URL.
/// URLs without a prefix are treated as git.
pub fn identify_repo(repo_url: &str) -> (String, String) {
    if let Some(rest) = repo_url.strip_prefix("git+") {
        ("git".to_string(), rest.to_string())
    } else if let Some(rest) = repo_url.strip_prefix("hg+") {
        ("hg".to_string(), rest.to_string())
    } else {
        ("git".to_string(), repo_url.to_string())
    }
}

/// Checks whether the VCS binary for a repo type is on the path.
pub fn is_vcs_installed(repo_type: &str) -> bool {
    Command::new(repo_type)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

fn run_vcs_command(repo_url: &str, command: &mut Command) -> Result<()> {
    let output = command.output().map_err(Error::Io)?;
    if !output.status.success() {
        return Err(Error::CloneFailed {
            repo: repo_url.to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Clones a repository into `clone_to_dir` and returns the clone's path.
///
/// An existing clone triggers the delete-or-reuse prompt (auto-delete under
/// `no_input`); reuse skips the clone entirely.
///
/// # Errors
/// * `Error::VcsNotInstalled` when the required binary is missing
/// * `Error::CloneFailed` when clone or checkout exits non-zero
pub fn clone(
    repo_url: &str,
    checkout: Option<&str>,
    clone_to_dir: &Path,
    no_input: bool,
    prompter: &dyn Prompter,
) -> Result<PathBuf> {
    let (repo_type, repo_url) = identify_repo(repo_url);
    if !is_vcs_installed(&repo_type) {
        return Err(Error::VcsNotInstalled { vcs: repo_type });
    }

    std::fs::create_dir_all(clone_to_dir)?;
    let repo_name = repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("template")
        .trim_end_matches(".git");
    let repo_dir = clone_to_dir.join(repo_name);

    if repo_dir.exists() {
        let deleted = if no_input {
            utils::rmtree(&repo_dir)?;
            true
        } else {
            prompt::prompt_and_delete(&repo_dir, no_input, prompter)?
        };
        if !deleted {
            debug!("Reusing existing clone {}", repo_dir.display());
            return Ok(repo_dir);
        }
    }

    debug!("Cloning '{}' to '{}'", repo_url, repo_dir.display());
    run_vcs_command(
        &repo_url,
        Command::new(&repo_type)
            .arg("clone")
            .arg(&repo_url)
            .arg(&repo_dir),
    )?;

    if let Some(reference) = checkout {
        let checkout_args: [&str; 2] = match repo_type.as_str() {
            "hg" => ["update", reference],
            _ => ["checkout", reference],
        };
        run_vcs_command(
            &repo_url,
            Command::new(&repo_type)
                .args(checkout_args)
                .current_dir(&repo_dir),
        )?;
    }

    Ok(repo_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_repo_prefixes() {
        assert_eq!(
            identify_repo("git+https://example.com/a.git"),
            ("git".to_string(), "https://example.com/a.git".to_string())
        );
        assert_eq!(
            identify_repo("hg+https://example.com/a"),
            ("hg".to_string(), "https://example.com/a".to_string())
        );
        assert_eq!(
            identify_repo("https://example.com/a.git"),
            ("git".to_string(), "https://example.com/a.git".to_string())
        );
    }
}
