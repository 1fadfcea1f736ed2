//! CLI error types

use std::path::PathBuf;

use olio_session::SessionError;
use thiserror::Error;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Invalid fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid replay event '{0}' (expected sign-in:<user>, sign-out, refresh or reload)")]
    InvalidEvent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
