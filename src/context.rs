//! Manifest loading and context construction.
//! The manifest is an ordered mapping from variable name to raw default;
//! declaration order is a correctness invariant because later defaults may
//! reference earlier answers.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Well-known key under which the manifest variables live; templates
/// reference them as `{{ stencil.<name> }}`.
pub const CONTEXT_KEY: &str = "stencil";

/// Supported manifest file names, tried in order
pub const MANIFEST_FILES: [&str; 3] = ["stencil.json", "stencil.yml", "stencil.yaml"];

/// Keys beginning with this prefix are metadata: passed through unresolved,
/// never rendered, never prompted.
pub const RESERVED_PREFIX: char = '_';

/// Top-level context wrapper holding the manifest's (resolving or resolved)
/// values plus run metadata such as the `_template` origin marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(rename = "stencil")]
    pub variables: IndexMap<String, Value>,
}

impl Context {
    pub fn new(variables: IndexMap<String, Value>) -> Self {
        Self { variables }
    }
}

/// Returns the path of the first manifest file present in `template_dir`.
pub fn manifest_path(template_dir: &Path) -> Option<PathBuf> {
    MANIFEST_FILES
        .iter()
        .map(|name| template_dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Parses manifest content, trying JSON first and YAML second.
fn parse_manifest(content: &str) -> std::result::Result<IndexMap<String, Value>, String> {
    match serde_json::from_str(content) {
        Ok(manifest) => Ok(manifest),
        Err(json_err) => serde_yaml::from_str(content)
            .map_err(|yaml_err| format!("not valid JSON ({json_err}) nor YAML ({yaml_err})")),
    }
}

/// Builds the context for a run from the manifest plus layered overrides.
///
/// # Arguments
/// * `manifest_file` - Path to the template's variable manifest
/// * `default_overrides` - Values from user configuration, applied first
/// * `extra_overrides` - Caller-supplied values, applied last (and hence winning)
///
/// # Errors
/// * `Error::ManifestDecode` with the offending path and parse diagnostic
///   on malformed input
pub fn generate_context(
    manifest_file: &Path,
    default_overrides: Option<&IndexMap<String, Value>>,
    extra_overrides: Option<&IndexMap<String, Value>>,
) -> Result<Context> {
    debug!("Loading manifest from {}", manifest_file.display());
    let content = std::fs::read_to_string(manifest_file)?;
    let mut variables = parse_manifest(&content).map_err(|detail| Error::ManifestDecode {
        path: manifest_file.display().to_string(),
        detail,
    })?;

    if let Some(defaults) = default_overrides {
        apply_overrides(&mut variables, defaults);
    }
    if let Some(extra) = extra_overrides {
        apply_overrides(&mut variables, extra);
    }

    Ok(Context::new(variables))
}

/// Applies an override set on top of manifest defaults.
///
/// Merge rule, per value shape of the override:
/// * mapping - recurse-merged key by key into the existing mapping
/// * sequence - elements appended to the existing sequence (created if absent)
/// * scalar - replaces the target entry
///
/// When the existing value's shape disagrees with the override's, the
/// override's runtime shape dictates the branch taken. Overrides may
/// introduce keys the manifest does not declare.
pub fn apply_overrides(variables: &mut IndexMap<String, Value>, overrides: &IndexMap<String, Value>) {
    for (key, value) in overrides {
        match value {
            Value::Object(incoming) => {
                let slot = variables
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                merge_object(slot, incoming);
            }
            Value::Array(items) => {
                let slot = variables
                    .entry(key.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                append_items(slot, items);
            }
            scalar => {
                variables.insert(key.clone(), scalar.clone());
            }
        }
    }
}

fn merge_object(slot: &mut Value, incoming: &serde_json::Map<String, Value>) {
    let Value::Object(existing) = slot else {
        *slot = Value::Object(incoming.clone());
        return;
    };
    for (key, value) in incoming {
        match value {
            Value::Object(inner) => {
                let nested = existing
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                merge_object(nested, inner);
            }
            Value::Array(items) => {
                let nested = existing
                    .entry(key.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                append_items(nested, items);
            }
            scalar => {
                existing.insert(key.clone(), scalar.clone());
            }
        }
    }
}

fn append_items(slot: &mut Value, items: &[Value]) {
    let Value::Array(existing) = slot else {
        *slot = Value::Array(items.to_vec());
        return;
    };
    existing.extend(items.iter().cloned());
}
