//! Error types for kvload

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Network Errors ===
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// A status the workload is not designed to absorb. ALREADY_EXISTS on
    /// create and NOT_FOUND on retrieve/update never surface here.
    #[error("fatal RPC status: {0}")]
    Grpc(#[from] tonic::Status),

    // === Integrity Errors ===
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    // === Workload Errors ===
    #[error("no keys are currently tracked")]
    EmptyKeySet,

    // === Config Errors ===
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
