//! Error types for dca.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DcaError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Stream errors
    #[error("Malformed stream: {message}")]
    MalformedStream { message: String },

    // Codec errors
    #[error("Codec error: {message}")]
    Codec { message: String },

    #[error("Encoded frame of {len} bytes exceeds the 65535 byte frame limit")]
    FrameTooLarge { len: usize },

    // Metadata errors
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Probe failed for {path}: {message}")]
    Probe { path: String, message: String },

    #[error("Cover art extraction failed: {message}")]
    Cover { message: String },

    // Input errors
    #[error("Invalid input: {message}")]
    Input { message: String },

    #[error("Failed to start {tool}: {message}")]
    ToolSpawn { tool: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl From<opus::Error> for DcaError {
    fn from(err: opus::Error) -> Self {
        DcaError::Codec {
            message: err.to_string(),
        }
    }
}

impl DcaError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        DcaError::MalformedStream {
            message: message.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DcaError>;
