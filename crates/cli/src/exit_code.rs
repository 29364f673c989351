//! Process exit codes
//!
//! Every classified error kind maps to its own code, and a visibility timeout
//! is distinct from all of them, so scripts can react without parsing output.

use osc_core::{ClassifiedError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Unclassified remote failure
    GeneralError = 1,
    /// Invalid arguments or configuration
    UsageError = 2,
    /// Network or service hiccup; retrying may help
    TransientError = 3,
    AccessDenied = 4,
    ObjectTooLarge = 5,
    /// A local precondition failed; the store was not contacted
    LocalFailure = 6,
    /// The upload went through but the object was not confirmed visible in time
    TimedOut = 7,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_classified(err: &ClassifiedError) -> Self {
        match err.kind {
            ErrorKind::AccessDenied => ExitCode::AccessDenied,
            ErrorKind::ObjectTooLarge => ExitCode::ObjectTooLarge,
            ErrorKind::Transient => ExitCode::TransientError,
            ErrorKind::Unknown if err.is_local() => ExitCode::LocalFailure,
            ErrorKind::Unknown => ExitCode::GeneralError,
        }
    }
}
