//! Error types for osc-core
//!
//! Two families live here. [`Error`] covers local failures that happen before
//! or around a remote call (bad configuration, unreadable files). [`RemoteError`]
//! is the raw failure surfaced by a store backend, which the classifier turns
//! into a [`ClassifiedError`](crate::ClassifiedError) before any caller sees it.

use thiserror::Error;

/// Result type alias for osc-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Local errors that can occur in osc-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file is invalid or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bucket or key is malformed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// General error
    #[error("{0}")]
    General(String),
}

/// Raw failure returned by an [`ObjectStore`](crate::ObjectStore) backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The store answered with an error response
    #[error("{message}")]
    Service {
        /// Upstream error code, e.g. `AccessDenied`
        code: Option<String>,
        message: String,
    },

    /// No usable response was received (timeout, dispatch failure)
    #[error("transport error: {0}")]
    Transport(String),

    /// The request could not be built or its body could not be streamed
    #[error("request error: {0}")]
    Request(String),
}

impl RemoteError {
    /// Shorthand for a service error carrying an upstream code
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Upstream error code, if the store sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => code.as_deref(),
            Self::Transport(_) | Self::Request(_) => None,
        }
    }
}
