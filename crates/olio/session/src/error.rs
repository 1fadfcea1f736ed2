//! Error types for olio-session.
//!
//! Collaborator failures are reported with these variants. The hydration
//! coordinator never returns them to callers: it renders them into the
//! `auth_error` / `org_error` fields of the snapshot. Organization setup
//! actions do return them.

use thiserror::Error;

/// Errors produced by session collaborators and setup actions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The identity provider could not be reached or answered garbage.
    #[error("identity provider error: {0}")]
    Identity(String),

    /// The tenant store rejected the operation.
    #[error("permission denied on {table}: {reason}")]
    PermissionDenied { table: String, reason: String },

    /// Network or transport failure talking to the tenant store.
    #[error("network error: {0}")]
    Network(String),

    /// A row expected to exist was not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persisted key-value store failure.
    #[error("cache error: {0}")]
    Cache(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// Setup actions require a signed-in identity.
    #[error("not signed in")]
    NotSignedIn,

    /// No organization uses this join code, or it is malformed.
    #[error("invalid organization code")]
    InvalidJoinCode,

    /// Organization name too short once trimmed.
    #[error("organization name must be at least {min} characters")]
    InvalidOrganizationName { min: usize },

    /// Icon color outside the palette.
    #[error("unsupported organization color: {0}")]
    InvalidColor(String),

    /// Every candidate join code was already taken.
    #[error("failed to generate unique organization code after {attempts} attempts")]
    JoinCodeExhausted { attempts: u32 },

    /// A collaborator future panicked.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub fn permission_denied(table: impl Into<String>, reason: impl Into<String>) -> Self {
        SessionError::PermissionDenied {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(e: toml::de::Error) -> Self {
        SessionError::Config(e.to_string())
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
