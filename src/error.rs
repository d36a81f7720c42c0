use thiserror::Error;

#[derive(Error, Debug)]
pub enum AacError {
    #[error("Not in an aacneo project. Run 'aacneo init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .aacneo/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed for field '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// Reserved for outbound calls; the local SQLite store never produces it.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Insert into {collection} failed: {message}")]
    InsertFailure { collection: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AacError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AacError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AacError>;
