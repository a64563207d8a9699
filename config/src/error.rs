use crate::keystore::KeystoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadSource {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {path}: {source}")]
    ParseSource {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    WriteSource {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize YAML: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Path '{path}' conflicts with existing value at '{at}'")]
    PathConflict { path: String, at: String },

    #[error("Config path must not be empty")]
    EmptyPath,

    #[error("No configuration sources given")]
    NoSources,

    #[error("Failed to persist {} configuration file(s): {}", .0.len(), join_errors(.0))]
    PersistFailed(Vec<ConfigError>),

    #[error("The {0} configuration is not valid and was not saved")]
    InvalidSection(&'static str),

    #[error("Keystore check failed: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
