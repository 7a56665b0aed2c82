//! Template environment construction and rendering.
//! The environment runs in strict mode so a reference to an undefined
//! variable is a hard error instead of an empty substitution, and carries a
//! registry of named extensions (filters and functions) on top of a fixed
//! built-in set.

use crate::context::Context;
use crate::error::{Error, Result};
use minijinja::{Environment, UndefinedBehavior};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

/// A registration applies one extension to a freshly built environment.
pub type ExtensionRegistration = fn(&mut Environment<'static>);

/// Extensions applied to every environment.
const BUILTIN_EXTENSIONS: [ExtensionRegistration; 5] = [
    register_jsonify,
    register_slugify,
    register_random_string,
    register_uuid,
    register_time,
];

fn jsonify(value: minijinja::value::Value) -> std::result::Result<String, minijinja::Error> {
    serde_json::to_string_pretty(&value).map_err(|err| {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
    })
}

fn register_jsonify(env: &mut Environment<'static>) {
    env.add_filter("jsonify", jsonify);
}

fn register_slugify(env: &mut Environment<'static>) {
    env.add_filter("slugify", |value: String| cruet::to_kebab_case(&value));
}

fn register_random_string(env: &mut Environment<'static>) {
    env.add_function(
        "random_ascii_string",
        |length: usize, punctuation: Option<bool>| -> String {
            const LETTERS: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
            const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
            let mut corpus = LETTERS.to_vec();
            if punctuation.unwrap_or(false) {
                corpus.extend_from_slice(PUNCTUATION);
            }
            let mut rng = rand::thread_rng();
            (0..length)
                .map(|_| corpus[rng.gen_range(0..corpus.len())] as char)
                .collect()
        },
    );
}

fn register_uuid(env: &mut Environment<'static>) {
    env.add_function("uuid4", || uuid::Uuid::new_v4().to_string());
}

/// Default date pattern for the `now()` function.
const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d";

fn register_time(env: &mut Environment<'static>) {
    env.add_function("now", |format: Option<String>| -> String {
        let format = format.unwrap_or_else(|| DEFAULT_DATETIME_FORMAT.to_string());
        chrono::Local::now().format(&format).to_string()
    });
}

fn register_inflection(env: &mut Environment<'static>) {
    env.add_filter("snake_case", |value: String| cruet::to_snake_case(&value));
    env.add_filter("camel_case", |value: String| cruet::to_camel_case(&value));
    env.add_filter("pascal_case", |value: String| cruet::to_pascal_case(&value));
    env.add_filter("title_case", |value: String| cruet::to_title_case(&value));
}

/// Static registry mapping extension name to its registration function.
/// Requesting a name that is not listed here is an unknown-extension error,
/// never an attempt at dynamic loading.
fn lookup_extension(name: &str) -> Option<ExtensionRegistration> {
    match name {
        "jsonify" => Some(register_jsonify),
        "slugify" => Some(register_slugify),
        "random_ascii_string" => Some(register_random_string),
        "uuid" => Some(register_uuid),
        "time" => Some(register_time),
        "inflection" => Some(register_inflection),
        _ => None,
    }
}

/// Extension names requested by the manifest's `_extensions` metadata key.
fn requested_extensions(context: &Context) -> Vec<String> {
    match context.variables.get("_extensions") {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Builds a strict environment with built-in extensions plus the ones the
/// manifest requests by name.
///
/// # Errors
/// * `Error::UnknownExtension` when a requested name is not registered
pub fn create_environment(context: &Context) -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    for register in BUILTIN_EXTENSIONS {
        register(&mut env);
    }
    for name in requested_extensions(context) {
        let register = lookup_extension(&name).ok_or(Error::UnknownExtension { name })?;
        register(&mut env);
    }
    Ok(env)
}

fn convert_render_error<S: Serialize>(err: minijinja::Error, context: &S) -> Error {
    if matches!(err.kind(), minijinja::ErrorKind::UndefinedError) {
        Error::UndefinedVariable {
            detail: err.to_string(),
            context: serde_json::to_string(context).unwrap_or_default(),
        }
    } else {
        Error::Template(err)
    }
}

/// Renders an inline template string against the given context.
pub fn render_str<S: Serialize>(env: &Environment, source: &str, context: &S) -> Result<String> {
    env.render_str(source, context)
        .map_err(|err| convert_render_error(err, context))
}

/// Renders template source under an explicit name so syntax errors keep
/// their exact location diagnostics.
pub fn render_named_str<S: Serialize>(
    env: &Environment,
    name: &str,
    source: &str,
    context: &S,
) -> Result<String> {
    env.render_named_str(name, source, context)
        .map_err(|err| convert_render_error(err, context))
}
