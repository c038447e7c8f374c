/// Append-only section log
///
/// Every step of a run lands in a plain text log as a titled section. Entries
/// are only ever appended; the file is opened, written and closed per entry.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::core::errors::{ForensicsError, Result};

/// Width of the `=` separator the section title is centered in
pub const HEADING_WIDTH: usize = 70;

/// Default log file name, created in the working directory
pub const DEFAULT_LOG_FILE: &str = "flagsweep_log.txt";

/// Destination for section entries
pub trait SectionLog {
    /// Append `body` under a heading built from `section`
    fn append(&self, section: &str, body: &str) -> Result<()>;
}

/// Title-case a section name: letters following a non-letter are uppercased,
/// all other letters lowercased.
pub fn title_case(text: &str) -> String {
    let mut previous_is_letter = false;
    text.chars()
        .map(|c| {
            let mapped = if previous_is_letter {
                c.to_lowercase().collect::<String>()
            } else {
                c.to_uppercase().collect::<String>()
            };
            previous_is_letter = c.is_alphabetic();
            mapped
        })
        .collect()
}

/// Render the heading line for a section
///
/// The plain title is centered in a line of `=`; the title is then swapped
/// for its ` [ Title Case ] ` form, so the decorated line is six characters
/// wider than `HEADING_WIDTH`.
pub fn format_heading(section: &str) -> String {
    let title_len = section.chars().count();
    let padding = HEADING_WIDTH.saturating_sub(title_len);
    let left = padding / 2;
    let right = padding - left;

    format!(
        "{} [ {} ] {}",
        "=".repeat(left),
        title_case(section),
        "=".repeat(right)
    )
}

/// Render a complete entry: heading, body, and a trailing blank line
pub fn format_entry(section: &str, body: &str) -> String {
    format!("{}\n{}\n\n", format_heading(section), body)
}

/// Section log backed by a file on disk
#[derive(Debug, Clone)]
pub struct FileLog {
    path: PathBuf,
}

impl FileLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SectionLog for FileLog {
    fn append(&self, section: &str, body: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ForensicsError::io(&self.path, e))?;

        file.write_all(format_entry(section, body).as_bytes())
            .map_err(|e| ForensicsError::io(&self.path, e))?;

        debug!("Appended section '{}' to {}", section, self.path.display());
        Ok(())
    }
}
