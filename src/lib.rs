/// flagsweep - runs the usual forensics tools against a CTF file
///
/// This library dispatches a file to the external tools that suit its type,
/// records their output in an append-only section log, and scans that output
/// for flags in both plain and ROT13 form.

pub mod core;
pub mod utils;

// Re-export main types for convenience
pub use crate::core::dispatcher::{AnalysisTarget, DispatchOptions, Dispatcher, Outcome, RunSummary};
pub use crate::core::errors::{ExternalToolError, ForensicsError};
pub use crate::core::flags::{build_pattern, find_flags, rot13, FlagPattern};
pub use crate::core::header::{format_hex_dump, rewrite_header};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scan `text` for flags matching `format` or its ROT13 rotation
///
/// This is a convenience function for one-off scans; build a `FlagPattern`
/// once when scanning many texts.
pub fn scan_text(format: &str, text: &str) -> crate::core::errors::Result<Vec<String>> {
    let pattern = build_pattern(format)?;
    Ok(find_flags(&pattern, text))
}
