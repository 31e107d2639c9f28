//! `-p key=value` parsing.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde_json::{Map, Value};
use vconv_media::ResultPackager;
use vconv_models::{Operation, OperationParams};

/// Fold `key=value` pairs into a JSON object.
///
/// Values that parse as JSON (`10`, `1.5`, `true`) keep their type; anything
/// else is taken as a string. Later pairs override earlier ones.
pub fn params_object(pairs: &[String]) -> anyhow::Result<Value> {
    let mut map = Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("expected key=value, got {:?}", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty parameter name in {:?}", pair);
        }
        let value = serde_json::from_str::<Value>(raw.trim())
            .ok()
            .filter(|v| !v.is_object() && !v.is_array())
            .unwrap_or_else(|| Value::String(raw.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(Value::Object(map))
}

/// Resolve the operation identifier and its parameters.
pub fn parse_operation(operation: &str, pairs: &[String]) -> anyhow::Result<OperationParams> {
    let params = params_object(pairs)?;
    OperationParams::from_parts(operation, params)
        .with_context(|| format!("invalid request for {}", operation))
}

/// Output path next to the input, named the way the packager names it.
pub fn default_output_path(input: &Path, operation: Operation) -> PathBuf {
    let filename = ResultPackager::filename(operation);
    match input.parent() {
        Some(dir) => dir.join(filename),
        None => PathBuf::from(filename),
    }
}
