//! Resolved-context persistence.
//! One JSON file per template name, written after resolution and read back
//! verbatim to bypass prompting on a later run.

use crate::context::Context;
use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Replay file path for a template name.
pub fn get_file_name(replay_dir: &Path, template_name: &str) -> PathBuf {
    replay_dir.join(format!("{template_name}.json"))
}

/// Writes the resolved context for `template_name`.
pub fn dump(replay_dir: &Path, template_name: &str, context: &Context) -> Result<()> {
    fs::create_dir_all(replay_dir)?;
    let file_path = get_file_name(replay_dir, template_name);
    debug!("Dumping resolved context to {}", file_path.display());
    let file = fs::File::create(&file_path)?;
    serde_json::to_writer_pretty(file, context)?;
    Ok(())
}

/// Reads back the resolved context for `template_name`, or `None` when no
/// replay file exists yet.
pub fn load(replay_dir: &Path, template_name: &str) -> Result<Option<Context>> {
    load_file(&get_file_name(replay_dir, template_name))
}

/// Reads a replay file at an explicit path.
pub fn load_file(file_path: &Path) -> Result<Option<Context>> {
    if !file_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(file_path)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|err| Error::ManifestDecode {
            path: file_path.display().to_string(),
            detail: err.to_string(),
        })
}
