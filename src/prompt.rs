//! User input and interaction handling.
//! Walks the ordered manifest and produces the resolved variable mapping,
//! either by prompting or by accepting rendered defaults in non-interactive
//! mode. Prompting goes through the [`Prompter`] trait so the resolution
//! logic stays testable without a terminal.

use crate::context::{Context, RESERVED_PREFIX};
use crate::environment;
use crate::error::{Error, Result};
use crate::utils;
use dialoguer::{Input, Select};
use indexmap::IndexMap;
use log::{debug, warn};
use minijinja::Environment;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Interaction seam between the resolver and the human.
pub trait Prompter {
    /// Free-text entry with a default.
    fn read_text(&self, prompt: &str, default: &str) -> Result<String>;

    /// Yes/no entry; tokens are mapped through [`parse_yes_no`] with
    /// invalid responses retried.
    fn read_bool(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Selection among `items`; returns the chosen index.
    fn read_choice(&self, prompt: &str, items: &[String], default: usize) -> Result<usize>;

    /// JSON-object entry; invalid JSON is retried.
    fn read_json(
        &self,
        prompt: &str,
        default: &serde_json::Map<String, Value>,
    ) -> Result<serde_json::Map<String, Value>>;
}

/// Maps a yes/no response token to a boolean, case-insensitively.
/// Returns `None` for tokens outside both sets, which callers treat as an
/// invalid-response retry.
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Terminal-backed prompter built on dialoguer.
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        DialoguerPrompter::new()
    }
}

impl Prompter for DialoguerPrompter {
    fn read_text(&self, prompt: &str, default: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .default(default.to_string())
            .interact_text()
            .map_err(|err| Error::Prompt(err.to_string()))
    }

    fn read_bool(&self, prompt: &str, default: bool) -> Result<bool> {
        loop {
            let answer: String = Input::new()
                .with_prompt(format!("{prompt} [y/n]"))
                .default(if default { "yes" } else { "no" }.to_string())
                .interact_text()
                .map_err(|err| Error::Prompt(err.to_string()))?;
            match parse_yes_no(&answer) {
                Some(value) => return Ok(value),
                None => eprintln!("Invalid response: '{}'", answer.trim()),
            }
        }
    }

    fn read_choice(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()
            .map_err(|err| Error::Prompt(err.to_string()))
    }

    fn read_json(
        &self,
        prompt: &str,
        default: &serde_json::Map<String, Value>,
    ) -> Result<serde_json::Map<String, Value>> {
        let default_text = serde_json::to_string(&Value::Object(default.clone()))?;
        loop {
            let answer: String = Input::new()
                .with_prompt(prompt)
                .default(default_text.clone())
                .interact_text()
                .map_err(|err| Error::Prompt(err.to_string()))?;
            match serde_json::from_str::<Value>(&answer) {
                Ok(Value::Object(map)) => return Ok(map),
                _ => eprintln!("Please enter a valid JSON object"),
            }
        }
    }
}

/// Renders a raw default against the variables resolved so far.
///
/// Strings are template-rendered; sequences and mappings are rendered
/// recursively (mapping keys included); booleans, numbers and nulls pass
/// through unchanged. A reference to an unresolved upstream variable aborts
/// with an undefined-variable error rather than substituting a blank.
pub fn render_variable(env: &Environment, raw: &Value, current: &Context) -> Result<Value> {
    match raw {
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(raw.clone()),
        Value::String(source) => {
            environment::render_str(env, source, current).map(Value::String)
        }
        Value::Array(items) => items
            .iter()
            .map(|item| render_variable(env, item, current))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(entries) => {
            let mut rendered = serde_json::Map::new();
            for (key, value) in entries {
                let rendered_key = environment::render_str(env, key, current)?;
                rendered.insert(rendered_key, render_variable(env, value, current)?);
            }
            Ok(Value::Object(rendered))
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// An option group is a mapping whose values are all mappings themselves:
/// the keys name the options, and an optional `_prompt` entry inside each
/// sub-mapping provides a human label.
fn is_option_group(options: &serde_json::Map<String, Value>) -> bool {
    !options.is_empty() && options.values().all(Value::is_object)
}

fn option_labels(options: &serde_json::Map<String, Value>) -> Vec<String> {
    options
        .iter()
        .map(|(name, value)| {
            value
                .get("_prompt")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string()
        })
        .collect()
}

fn resolve_choice(
    env: &Environment,
    prompter: &dyn Prompter,
    key: &str,
    options: &[Value],
    current: &Context,
    no_input: bool,
) -> Result<Value> {
    let rendered: Vec<Value> = options
        .iter()
        .map(|option| render_variable(env, option, current))
        .collect::<Result<_>>()?;
    if no_input {
        return Ok(rendered[0].clone());
    }
    let labels: Vec<String> = rendered.iter().map(display_value).collect();
    let index = prompter.read_choice(key, &labels, 0)?;
    Ok(rendered[index].clone())
}

fn resolve_option_group(
    prompter: &dyn Prompter,
    key: &str,
    options: &serde_json::Map<String, Value>,
    no_input: bool,
) -> Result<Value> {
    let keys: Vec<String> = options.keys().cloned().collect();
    if no_input {
        return Ok(Value::String(keys[0].clone()));
    }
    let index = prompter.read_choice(key, &option_labels(options), 0)?;
    Ok(Value::String(keys[index].clone()))
}

/// Resolves every manifest entry, in declaration order, into its final value.
///
/// Later entries render their defaults against the answers already
/// collected, so order is a correctness invariant. Metadata keys (reserved
/// prefix) pass through verbatim. Under `no_input` the rendered defaults
/// are accepted as-is; otherwise the user is prompted per value shape.
pub fn prompt_for_config(
    context: &Context,
    prompter: &dyn Prompter,
    no_input: bool,
) -> Result<IndexMap<String, Value>> {
    let env = environment::create_environment(context)?;
    let mut resolved: IndexMap<String, Value> = IndexMap::new();

    for (key, raw) in &context.variables {
        if key.starts_with(RESERVED_PREFIX) {
            resolved.insert(key.clone(), raw.clone());
            continue;
        }

        let current = Context::new(resolved.clone());
        let value = match raw {
            Value::Array(options) if !options.is_empty() => {
                resolve_choice(&env, prompter, key, options, &current, no_input)?
            }
            Value::Object(options) if is_option_group(options) => {
                resolve_option_group(prompter, key, options, no_input)?
            }
            Value::Object(_) => {
                let rendered = render_variable(&env, raw, &current)?;
                if no_input {
                    rendered
                } else {
                    let default = match &rendered {
                        Value::Object(map) => map.clone(),
                        _ => serde_json::Map::new(),
                    };
                    Value::Object(prompter.read_json(key, &default)?)
                }
            }
            Value::Bool(default) => {
                if no_input {
                    Value::Bool(*default)
                } else {
                    Value::Bool(prompter.read_bool(key, *default)?)
                }
            }
            Value::String(_) => {
                let rendered = render_variable(&env, raw, &current)?;
                let rendered_text = rendered.as_str().unwrap_or_default().to_string();
                if no_input {
                    Value::String(rendered_text)
                } else {
                    Value::String(prompter.read_text(key, &rendered_text)?)
                }
            }
            Value::Number(number) if !no_input => {
                Value::String(prompter.read_text(key, &number.to_string())?)
            }
            other => other.clone(),
        };

        debug!("Resolved '{key}'");
        resolved.insert(key.clone(), value);
    }

    Ok(resolved)
}

/// Selects the nested template to use when the manifest declares a
/// `_templates` mapping from option name to template-relative path.
/// Returns `repo_dir` unchanged when no nested templates are declared.
pub fn choose_nested_template(
    context: &Context,
    repo_dir: &Path,
    prompter: &dyn Prompter,
    no_input: bool,
) -> Result<PathBuf> {
    let Some(Value::Object(options)) = context.variables.get("_templates") else {
        return Ok(repo_dir.to_path_buf());
    };
    if options.is_empty() {
        return Ok(repo_dir.to_path_buf());
    }

    let index = if no_input {
        0
    } else {
        prompter.read_choice("Select a template", &option_labels(options), 0)?
    };

    let subpath = match options.values().nth(index) {
        Some(Value::String(path)) => path.clone(),
        Some(Value::Object(details)) => details
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };
    if subpath.is_empty() {
        warn!("Nested template entry has no usable path, staying at the repository root");
        return Ok(repo_dir.to_path_buf());
    }
    Ok(repo_dir.join(subpath))
}

/// Asks whether a previously downloaded template may be deleted and
/// re-fetched. Returns `true` when the path was deleted, `false` when the
/// existing version should be reused.
pub fn prompt_and_delete(path: &Path, no_input: bool, prompter: &dyn Prompter) -> Result<bool> {
    if no_input {
        utils::rmtree(path)?;
        return Ok(true);
    }

    let delete = prompter.read_bool(
        &format!(
            "You've downloaded {} before. Is it okay to delete and re-download it?",
            path.display()
        ),
        true,
    )?;
    if delete {
        utils::rmtree(path)?;
        return Ok(true);
    }

    let reuse = prompter.read_bool("Do you want to re-use the existing version?", true)?;
    if reuse {
        return Ok(false);
    }
    Err(Error::Prompt("aborted by user".to_string()))
}
