/// Utility modules for the forensics sweep
///
/// This module contains file type detection, external tool invocation,
/// the section log, and interactive prompts.

pub mod file_utils;
pub mod prompt;
pub mod section_log;
pub mod tools;
