//! Remote error classification
//!
//! Maps every [`RemoteError`] into a closed taxonomy so call sites never
//! compare raw error strings themselves.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::error::RemoteError;

/// Upstream code -> kind. Anything absent from this table is `Unknown`.
const CODE_TABLE: &[(&str, ErrorKind)] = &[
    ("AccessDenied", ErrorKind::AccessDenied),
    ("EntityTooLarge", ErrorKind::ObjectTooLarge),
];

/// Closed set of failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Permission problem; surfaced, never retried
    AccessDenied,
    /// Object exceeds the single-put ceiling
    ObjectTooLarge,
    /// Network or service hiccup; the caller may retry
    Transient,
    /// Anything unmatched
    Unknown,
}

impl ErrorKind {
    /// Only transient failures are worth retrying at the caller's discretion
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::AccessDenied => "access denied",
            ErrorKind::ObjectTooLarge => "object too large",
            ErrorKind::Transient => "transient",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Where a failure was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    /// Before any remote call was made; nothing happened in the store
    Local,
    /// The store rejected or failed the request
    Remote,
}

/// A failure mapped into [`ErrorKind`]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub origin: ErrorOrigin,
}

impl ClassifiedError {
    /// A failure detected before contacting the store
    pub fn local(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            origin: ErrorOrigin::Local,
        }
    }

    pub fn is_local(&self) -> bool {
        self.origin == ErrorOrigin::Local
    }
}

/// Classify a remote failure. Pure and total.
pub fn classify(err: &RemoteError) -> ClassifiedError {
    let kind = match err {
        RemoteError::Service { code, .. } => code
            .as_deref()
            .and_then(|c| {
                CODE_TABLE
                    .iter()
                    .find(|(known, _)| *known == c)
                    .map(|(_, kind)| *kind)
            })
            .unwrap_or(ErrorKind::Unknown),
        RemoteError::Transport(_) => ErrorKind::Transient,
        RemoteError::Request(_) => ErrorKind::Unknown,
    };

    ClassifiedError {
        kind,
        message: err.to_string(),
        code: err.code().map(str::to_string),
        origin: ErrorOrigin::Remote,
    }
}

impl From<RemoteError> for ClassifiedError {
    fn from(err: RemoteError) -> Self {
        classify(&err)
    }
}
