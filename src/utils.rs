//! Filesystem helpers shared across modules.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Removes a directory and all of its contents.
pub fn rmtree(path: &Path) -> Result<()> {
    fs::remove_dir_all(path).map_err(Error::Io)
}

/// Adds the executable bits to a script's permissions.
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(permissions.mode() | 0o111);
        fs::set_permissions(path, permissions)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Copies the contents of a template repository into a fresh temporary
/// directory, so a pre-prompt hook may mutate the tree without touching
/// the original.
pub fn create_tmp_repo_dir(repo_dir: &Path) -> Result<PathBuf> {
    let temp_dir = tempfile::Builder::new().prefix("stencil-repo-").tempdir()?;
    let temp_path = temp_dir.keep();
    let mut options = fs_extra::dir::CopyOptions::new();
    options.content_only = true;
    fs_extra::dir::copy(repo_dir, &temp_path, &options)
        .map_err(|err| Error::Io(io::Error::other(err.to_string())))?;
    Ok(temp_path)
}
