//! Zip archive fetching and extraction.
//! Handles both local archive paths and downloadable archive URLs, and
//! normalizes archives whose content sits inside a single top directory.

use crate::error::{Error, Result};
use crate::prompt::{self, Prompter};
use crate::utils;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn invalid_zip(path: &Path, detail: impl ToString) -> Error {
    Error::InvalidZip {
        path: path.display().to_string(),
        detail: detail.to_string(),
    }
}

/// Derives the extraction directory name from the archive reference.
fn archive_identifier(zip_uri: &str) -> String {
    zip_uri
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("template")
        .trim_end_matches(".zip")
        .trim_end_matches(".ZIP")
        .to_string()
}

fn download(zip_uri: &str, clone_to_dir: &Path) -> Result<PathBuf> {
    debug!("Downloading zip from {zip_uri}");
    let response = reqwest::blocking::get(zip_uri)
        .map_err(|err| invalid_zip(Path::new(zip_uri), err))?;
    if !response.status().is_success() {
        return Err(invalid_zip(
            Path::new(zip_uri),
            format!("download failed with status {}", response.status()),
        ));
    }
    let bytes = response
        .bytes()
        .map_err(|err| invalid_zip(Path::new(zip_uri), err))?;
    let zip_path = clone_to_dir.join("template.zip");
    fs::write(&zip_path, &bytes)?;
    Ok(zip_path)
}

fn extract(zip_path: &Path, target: &Path, password: Option<&str>) -> Result<()> {
    let file = fs::File::open(zip_path).map_err(|err| invalid_zip(zip_path, err))?;
    let mut zip_archive =
        zip::ZipArchive::new(file).map_err(|err| invalid_zip(zip_path, err))?;

    for index in 0..zip_archive.len() {
        let mut entry = match password {
            Some(password) => zip_archive
                .by_index_decrypt(index, password.as_bytes())
                .map_err(|err| invalid_zip(zip_path, err))?,
            None => zip_archive
                .by_index(index)
                .map_err(|err| invalid_zip(zip_path, err))?,
        };
        let Some(enclosed) = entry.enclosed_name() else {
            continue; // entries escaping the extraction root are dropped
        };
        let destination = target.join(enclosed);
        if entry.is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut output = fs::File::create(&destination)?;
            io::copy(&mut entry, &mut output)?;
        }
    }
    Ok(())
}

/// Fetches and unpacks a zip archive into `clone_to_dir`, returning the
/// extracted template directory.
///
/// A URL reference is downloaded first; the temporary download is removed
/// afterwards. When the archive's content lives inside exactly one top
/// directory, that directory's content becomes the template root. An
/// existing extraction triggers the delete-or-reuse prompt (auto-delete
/// under `no_input`).
///
/// # Errors
/// * `Error::InvalidZip` when the archive cannot be fetched or opened
pub fn unzip(
    zip_uri: &str,
    is_url: bool,
    clone_to_dir: &Path,
    no_input: bool,
    password: Option<&str>,
    prompter: &dyn Prompter,
) -> Result<PathBuf> {
    fs::create_dir_all(clone_to_dir)?;
    let zip_path = if is_url {
        download(zip_uri, clone_to_dir)?
    } else {
        PathBuf::from(zip_uri)
    };

    let unzip_dir = clone_to_dir.join(archive_identifier(zip_uri));
    if unzip_dir.exists() {
        let deleted = if no_input {
            utils::rmtree(&unzip_dir)?;
            true
        } else {
            prompt::prompt_and_delete(&unzip_dir, no_input, prompter)?
        };
        if !deleted {
            debug!("Reusing existing extraction {}", unzip_dir.display());
            return Ok(unzip_dir);
        }
    }

    let staging = tempfile::Builder::new().prefix("stencil-zip-").tempdir()?;
    extract(&zip_path, staging.path(), password)?;

    // A single top-level directory is the conventional archive layout;
    // its content becomes the template root.
    let top_entries: Vec<PathBuf> = fs::read_dir(staging.path())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    let extracted_root = match top_entries.as_slice() {
        [only] if only.is_dir() => only.clone(),
        _ => staging.path().to_path_buf(),
    };

    fs::create_dir_all(&unzip_dir)?;
    let mut options = fs_extra::dir::CopyOptions::new();
    options.content_only = true;
    fs_extra::dir::copy(&extracted_root, &unzip_dir, &options)
        .map_err(|err| Error::Io(io::Error::other(err.to_string())))?;

    if is_url {
        let _ = fs::remove_file(&zip_path);
    }
    Ok(unzip_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_identifier() {
        assert_eq!(archive_identifier("template.zip"), "template");
        assert_eq!(
            archive_identifier("https://example.com/path/demo.zip"),
            "demo"
        );
        assert_eq!(archive_identifier("/tmp/archives/demo.ZIP"), "demo");
    }

    #[test]
    fn test_unzip_rejects_invalid_archive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let bogus = temp_dir.path().join("bogus.zip");
        fs::write(&bogus, b"this is not a zip file").unwrap();

        let prompter = crate::prompt::DialoguerPrompter::new();
        let result = unzip(
            bogus.to_str().unwrap(),
            false,
            temp_dir.path().join("store").as_path(),
            true,
            None,
            &prompter,
        );
        assert!(matches!(result, Err(Error::InvalidZip { .. })));
    }
}
