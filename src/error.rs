//! Error types for the downloads-monitor service.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // Known-file store errors
    #[error("Store error: {0}")]
    Store(String),

    // Watch errors
    #[error("Unable to resolve the downloads directory")]
    DirectoryUnresolved,

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Process exit code reported when this error ends the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) => {
                exit_codes::CONFIG_ERROR
            }
            // JSON only backs the known-file store.
            Error::Store(_) | Error::Json(_) => exit_codes::STORE_ERROR,
            Error::Watch(_) | Error::DirectoryUnresolved => exit_codes::WATCH_ERROR,
            Error::Io(_) => exit_codes::UNEXPECTED_ERROR,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const CONFIG_ERROR: i32 = 3;
    pub const WATCH_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const STORE_ERROR: i32 = 6;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_store_is_not_a_config_error() {
        let corrupt = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();

        assert_eq!(Error::Json(corrupt).exit_code(), exit_codes::STORE_ERROR);
        assert_eq!(
            Error::Store("known_files.json is not valid".into()).exit_code(),
            exit_codes::STORE_ERROR
        );
    }

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(
            Error::ConfigValidation {
                field: "workers".into(),
                message: "must be at least 1".into(),
            }
            .exit_code(),
            exit_codes::CONFIG_ERROR
        );
        assert_eq!(
            Error::DirectoryUnresolved.exit_code(),
            exit_codes::WATCH_ERROR
        );
        assert_eq!(
            Error::Io(std::io::Error::other("disk gone")).exit_code(),
            exit_codes::UNEXPECTED_ERROR
        );
    }
}
