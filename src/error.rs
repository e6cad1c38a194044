use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?} connecting to {1}")]
    ConnectTimeout(Duration, String),

    #[error("Connection closed by server while reading reply to '{0}'")]
    ConnectionClosed(String),

    #[error("Server rejected '{command}': {reply}")]
    Server { command: String, reply: String },

    #[error("Unexpected line in reply to '{command}': {line}")]
    MalformedResponse { command: String, line: String },

    #[error("Malformed size '{raw}' for key '{key}': expected '<bytes> b'")]
    MalformedSize { key: String, raw: String },

    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Percentile must satisfy 0 <= P < 100, got {0}")]
    InvalidPercentile(f64),

    #[error("Cannot compute a percentile over an empty sample")]
    EmptySample,
}
