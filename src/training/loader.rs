use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info, instrument};

use crate::depth_pipeline::common::error::{EnsembleError, Result};
use crate::training::schema::TrainingConfig;

/// Loads a training config, resolving `base_config` references relative to
/// the current working directory.
pub fn load_training_config<P: AsRef<Path>>(path: P) -> Result<TrainingConfig> {
    load_training_config_with_base_dir(path, Path::new("."))
}

/// Loads a training config, resolving `base_config` references relative to
/// `base_dir`.
///
/// Referenced files are loaded recursively and merged in listed order, the
/// referencing file last. Mappings merge key by key; any other value
/// replaces what the base provided.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_training_config_with_base_dir<P: AsRef<Path>, B: AsRef<Path>>(
    path: P,
    base_dir: B,
) -> Result<TrainingConfig> {
    let path = path.as_ref();
    let mut stack = Vec::new();
    let merged = load_merged(path, base_dir.as_ref(), &mut stack)?;

    let config = serde_yaml::from_value(merged).map_err(|e| EnsembleError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    info!("Training config loaded");
    Ok(config)
}

fn load_merged(path: &Path, base_dir: &Path, stack: &mut Vec<PathBuf>) -> Result<Value> {
    let canonical = path
        .canonicalize()
        .map_err(|e| EnsembleError::InputReadError(format!("{}: {}", path.display(), e)))?;

    if stack.contains(&canonical) {
        return Err(EnsembleError::InvalidConfig(format!(
            "base_config cycle through {}",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(&canonical)
        .map_err(|e| EnsembleError::InputReadError(format!("{}: {}", path.display(), e)))?;
    let own: Value = serde_yaml::from_str(&text).map_err(|e| EnsembleError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let own = match own {
        Value::Null => Value::Mapping(Mapping::new()),
        Value::Mapping(_) => own,
        _ => {
            return Err(EnsembleError::ConfigParseError {
                path: path.display().to_string(),
                message: "top level must be a mapping".to_string(),
            });
        }
    };

    let bases = base_references(&own, path)?;

    stack.push(canonical);
    let mut merged = Value::Mapping(Mapping::new());
    for base in &bases {
        debug!(base = %base, "Merging base config");
        let mut base_value = load_merged(&base_dir.join(base), base_dir, stack)?;
        // only the referencing file's own list is kept
        if let Value::Mapping(map) = &mut base_value {
            map.remove("base_config");
        }
        merge_values(&mut merged, base_value);
    }
    stack.pop();

    merge_values(&mut merged, own);
    Ok(merged)
}

fn base_references(value: &Value, path: &Path) -> Result<Vec<String>> {
    let parse_error = |message: &str| EnsembleError::ConfigParseError {
        path: path.display().to_string(),
        message: message.to_string(),
    };

    match value.get("base_config") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(single)) => Ok(vec![single.clone()]),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| parse_error("base_config entries must be strings"))
            })
            .collect(),
        Some(_) => Err(parse_error("base_config must be a string or a list of strings")),
    }
}

/// Deep-merges `overlay` into `base`.
pub(crate) fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
