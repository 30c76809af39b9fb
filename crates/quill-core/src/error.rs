use thiserror::Error;

/// Top-level error type for Quill.
#[derive(Debug, Error)]
pub enum QuillError {
    /// Error from the completion service.
    #[error("provider error: {0}")]
    Provider(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// The transcript document could not be read or updated.
    #[error("document error: {0}")]
    Document(String),

    /// File-change notification error.
    #[error("watch error: {0}")]
    Watch(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
