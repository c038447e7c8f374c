/// Core module for the forensics sweep
///
/// This module contains flag matching, header repair, the preflight checks,
/// and the dispatcher that runs the external steps for a file type.

pub mod dispatcher;
pub mod errors;
pub mod flags;
pub mod header;
pub mod preflight;
