/// Error types for the text-generation engine
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Backend request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {message}")]
    BackendRejected { status: u16, message: String },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Backend returned an empty completion")]
    EmptyCompletion,

    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
