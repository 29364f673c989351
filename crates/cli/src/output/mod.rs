//! Output formatting
//!
//! Human-readable output goes to stdout with optional colors; JSON mode
//! prints a single document per command. Errors and warnings go to stderr.

mod formatter;

pub use formatter::Formatter;

/// Output settings taken from global flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit JSON instead of human-readable text
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
