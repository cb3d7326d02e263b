//! Error types for HiveMind.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Log error: {0}")]
    Log(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Provider error: {0}")]
    Provider(#[from] crate::providers::ProviderError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Invalid name '{0}': use letters, digits, '.', '_' or '-'")]
    InvalidName(String),

    #[error("{0}")]
    Other(String),
}
