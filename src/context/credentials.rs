use std::{fmt, path::Path};

use serde::Deserialize;

use crate::context::{ConfigError, json_error, read_to_string};

/// Connection settings for the telemetry store.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub host: String,

    pub port: u16,

    pub user: String,

    pub password: String,

    pub database: String,
}

#[derive(Deserialize)]
struct CredentialsDocument {
    database: Credentials,
}

impl Credentials {
    /// Loads the `database` object of a credentials document:
    ///
    /// ```json
    /// { "database": { "host": "db", "port": 3306, "user": "u", "password": "p", "database": "telemetry" } }
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read_to_string(path)?;

        let document: CredentialsDocument =
            serde_json::from_str(&text).map_err(|e| json_error(path, e))?;

        Ok(document.database)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use tempfile::NamedTempFile;

    use super::*;

    fn credentials_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_nested_database_object() {
        let file = credentials_file(
            r#"{"database": {"host": "db.local", "port": 3306, "user": "telemetry", "password": "secret", "database": "sensores"}}"#,
        );

        let credentials = Credentials::load(file.path()).unwrap();

        assert_eq!(credentials.host, "db.local");
        assert_eq!(credentials.port, 3306);
        assert_eq!(credentials.user, "telemetry");
        assert_eq!(credentials.password, "secret");
        assert_eq!(credentials.database, "sensores");
    }

    #[test]
    fn debug_output_hides_password() {
        let file = credentials_file(
            r#"{"database": {"host": "db.local", "port": 3306, "user": "telemetry", "password": "secret", "database": "sensores"}}"#,
        );

        let credentials = Credentials::load(file.path()).unwrap();

        assert!(!format!("{credentials:?}").contains("secret"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credenciales.json");

        let err = Credentials::load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("credenciales.json"));
    }

    #[test]
    fn malformed_json_is_distinguished_from_wrong_shape() {
        let malformed = credentials_file("{\"database\": ");
        let wrong_shape = credentials_file(r#"{"database": {"host": "db.local"}}"#);

        let malformed = Credentials::load(malformed.path()).unwrap_err();
        let wrong_shape = Credentials::load(wrong_shape.path()).unwrap_err();

        assert!(matches!(malformed, ConfigError::Malformed { .. }));
        assert!(matches!(wrong_shape, ConfigError::Invalid { .. }));
    }
}
