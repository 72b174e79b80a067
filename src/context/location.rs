use std::path::Path;

use serde_json::{Map, Value};

use crate::context::{ConfigError, read_json};

/// Where the sensors of this host live, plus the calibration applied to them.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationContext {
    pub location: String,

    pub data_center: String,

    pub room: String,

    pub offset_celsius: f64,
}

impl LocationContext {
    /// Loads the location document, e.g.
    ///
    /// ```json
    /// { "ubicacion": "Planta 2", "cpd": "CPD1", "sala": "Sala A", "offset_celsius": -6.14 }
    /// ```
    ///
    /// `offset_celsius` may also be given as a numeric string.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let value = read_json(path)?;

        let Value::Object(object) = value else {
            return Err(ConfigError::NotAnObject {
                path: path.to_path_buf(),
            });
        };

        // Presence is checked for every key before any type is checked.
        for key in ["ubicacion", "cpd", "sala", "offset_celsius"] {
            if !object.contains_key(key) {
                return Err(ConfigError::MissingKey {
                    key,
                    path: path.to_path_buf(),
                });
            }
        }

        Ok(Self {
            location: string_field(&object, "ubicacion", path)?,
            data_center: string_field(&object, "cpd", path)?,
            room: string_field(&object, "sala", path)?,
            offset_celsius: numeric_field(&object, "offset_celsius", path)?,
        })
    }
}

fn string_field(
    object: &Map<String, Value>,
    key: &'static str,
    path: &Path,
) -> Result<String, ConfigError> {
    match &object[key] {
        Value::String(s) => Ok(s.clone()),
        other => Err(ConfigError::NotAString {
            key,
            path: path.to_path_buf(),
            found: other.to_string(),
        }),
    }
}

fn numeric_field(
    object: &Map<String, Value>,
    key: &'static str,
    path: &Path,
) -> Result<f64, ConfigError> {
    let value = &object[key];

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    parsed.ok_or_else(|| ConfigError::NotNumeric {
        key,
        path: path.to_path_buf(),
        found: value.to_string(),
    })
}
