use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read configuration file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON in {}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration in {}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a JSON object in {}", path.display())]
    NotAnObject { path: PathBuf },

    #[error("missing key '{key}' in {}", path.display())]
    MissingKey { key: &'static str, path: PathBuf },

    #[error("'{key}' in {} must be a string, found: {found}", path.display())]
    NotAString {
        key: &'static str,
        path: PathBuf,
        found: String,
    },

    #[error("'{key}' in {} must be numeric, found: {found}", path.display())]
    NotNumeric {
        key: &'static str,
        path: PathBuf,
        found: String,
    },
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, ConfigError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Maps a `serde_json` failure to [`ConfigError::Malformed`] when the text is
/// not JSON at all, and to [`ConfigError::Invalid`] when it is JSON of the
/// wrong shape.
pub(crate) fn json_error(path: &Path, source: serde_json::Error) -> ConfigError {
    let path = path.to_path_buf();

    if source.is_data() {
        ConfigError::Invalid { path, source }
    } else {
        ConfigError::Malformed { path, source }
    }
}

pub(crate) fn read_json(path: &Path) -> Result<Value, ConfigError> {
    let text = read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| json_error(path, e))
}
