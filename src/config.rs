//! User configuration handling.
//! Loads `~/.stencilrc` (YAML) or the file named by `STENCIL_CONFIG`,
//! merging partial settings over the built-in defaults.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an alternative configuration file.
pub const CONFIG_ENV_VAR: &str = "STENCIL_CONFIG";

const USER_CONFIG_FILE: &str = ".stencilrc";

/// Per-user settings for a scaffolding run.
#[derive(Debug, Clone)]
pub struct UserConfig {
    /// Where clones and extracted archives are stored
    pub templates_dir: PathBuf,
    /// Where resolved contexts are dumped for replay
    pub replay_dir: PathBuf,
    /// Override layer applied to every manifest before extra context
    pub default_context: IndexMap<String, Value>,
    /// Template reference abbreviations, `prefix -> expansion`
    pub abbreviations: IndexMap<String, String>,
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Abbreviations every configuration starts from.
pub fn builtin_abbreviations() -> IndexMap<String, String> {
    IndexMap::from([
        ("gh".to_string(), "https://github.com/{0}.git".to_string()),
        ("gl".to_string(), "https://gitlab.com/{0}.git".to_string()),
        ("bb".to_string(), "https://bitbucket.org/{0}".to_string()),
    ])
}

impl Default for UserConfig {
    fn default() -> Self {
        let home = home_dir();
        Self {
            templates_dir: home.join(".stencils"),
            replay_dir: home.join(".stencil_replay"),
            default_context: IndexMap::new(),
            abbreviations: builtin_abbreviations(),
        }
    }
}

/// On-disk shape of the configuration file; every field is optional.
#[derive(Debug, Default, Deserialize)]
struct RawUserConfig {
    templates_dir: Option<String>,
    replay_dir: Option<String>,
    default_context: Option<IndexMap<String, Value>>,
    abbreviations: Option<IndexMap<String, String>>,
}

fn expand_user(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

/// Loads the configuration at `config_path`. Missing fields keep their
/// defaults; user abbreviations merge over the builtins.
pub fn get_config(config_path: &Path) -> Result<UserConfig> {
    debug!("Loading user configuration from {}", config_path.display());
    let content = std::fs::read_to_string(config_path).map_err(|err| Error::InvalidConfig {
        path: config_path.display().to_string(),
        detail: err.to_string(),
    })?;
    let raw: RawUserConfig =
        serde_yaml::from_str(&content).map_err(|err| Error::InvalidConfig {
            path: config_path.display().to_string(),
            detail: err.to_string(),
        })?;

    let mut config = UserConfig::default();
    if let Some(dir) = raw.templates_dir {
        config.templates_dir = expand_user(&dir);
    }
    if let Some(dir) = raw.replay_dir {
        config.replay_dir = expand_user(&dir);
    }
    if let Some(context) = raw.default_context {
        config.default_context = context;
    }
    if let Some(abbreviations) = raw.abbreviations {
        config.abbreviations.extend(abbreviations);
    }
    Ok(config)
}

/// Returns the user configuration for a run.
///
/// Resolution order: `--default-config` short-circuits to the defaults,
/// then an explicit `config_file`, then the `STENCIL_CONFIG` environment
/// variable, then `~/.stencilrc` when present, then the defaults.
pub fn get_user_config(config_file: Option<&Path>, default_config: bool) -> Result<UserConfig> {
    if default_config {
        return Ok(UserConfig::default());
    }
    if let Some(path) = config_file {
        return get_config(path);
    }
    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return get_config(Path::new(&env_path));
    }
    let user_config = home_dir().join(USER_CONFIG_FILE);
    if user_config.exists() {
        return get_config(&user_config);
    }
    Ok(UserConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_has_builtin_abbreviations() {
        let config = UserConfig::default();
        assert_eq!(
            config.abbreviations["gh"],
            "https://github.com/{0}.git"
        );
        assert!(config.default_context.is_empty());
    }

    #[test]
    fn test_partial_config_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "default_context:\n  full_name: Jane Doe\nabbreviations:\n  me: https://example.com/{{0}}.git\n"
        )
        .unwrap();

        let config = get_config(file.path()).unwrap();
        assert_eq!(config.default_context["full_name"], "Jane Doe");
        // user entries extend the builtins rather than replacing them
        assert_eq!(config.abbreviations["me"], "https://example.com/{0}.git");
        assert_eq!(config.abbreviations["gh"], "https://github.com/{0}.git");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(matches!(
            get_config(Path::new("/definitely/not/here.yml")),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
