/// File handling utilities
///
/// Type detection by magic numbers and raw byte access for the header
/// display.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::core::errors::{ForensicsError, Result};

/// Number of leading bytes shown when a header looks corrupt
pub const HEADER_PREVIEW_BYTES: usize = 25;

/// The file types the dispatcher knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// Windows bitmap
    Bmp,
    /// ZIP archive
    Zip,
    /// Nothing recognizable at the start of the file
    Unrecognized,
}

impl FileKind {
    /// Short label for the detected type
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Jpeg => "jpeg",
            FileKind::Png => "png",
            FileKind::Bmp => "bmp",
            FileKind::Zip => "zip",
            FileKind::Unrecognized => "data",
        }
    }

    /// Identify a type from the first bytes of a file
    pub fn from_magic(header: &[u8]) -> Self {
        // (signature, kind) pairs, checked in order
        const SIGNATURES: &[(&[u8], FileKind)] = &[
            (&[0xff, 0xd8, 0xff], FileKind::Jpeg),
            (&[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a], FileKind::Png),
            (b"PK\x03\x04", FileKind::Zip),
            (b"PK\x05\x06", FileKind::Zip),
            (b"PK\x07\x08", FileKind::Zip),
        ];

        for (signature, kind) in SIGNATURES {
            if header.starts_with(signature) {
                return *kind;
            }
        }

        if is_bmp(header) {
            return FileKind::Bmp;
        }

        FileKind::Unrecognized
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `BM` alone is too weak; also require the reserved header words to be zero
fn is_bmp(header: &[u8]) -> bool {
    header.len() >= 10 && header.starts_with(b"BM") && header[6..10].iter().all(|&b| b == 0)
}

/// Read up to `count` bytes from the start of a file
pub fn read_leading_bytes(file_path: &Path, count: usize) -> Result<Vec<u8>> {
    let file = File::open(file_path).map_err(|e| ForensicsError::io(file_path, e))?;

    let mut buffer = Vec::with_capacity(count);
    file.take(count as u64)
        .read_to_end(&mut buffer)
        .map_err(|e| ForensicsError::io(file_path, e))?;

    Ok(buffer)
}

/// Lowercase hex of the first `count` bytes of a file
pub fn read_header_hex(file_path: &Path, count: usize) -> Result<String> {
    Ok(hex::encode(read_leading_bytes(file_path, count)?))
}

/// Detect the file type from its magic number
pub fn detect_file_kind(file_path: &Path) -> Result<FileKind> {
    let header = read_leading_bytes(file_path, 16)?;
    let kind = FileKind::from_magic(&header);
    debug!("Detected {} for {}", kind, file_path.display());
    Ok(kind)
}

/// Size of the file in bytes
pub fn file_size(file_path: &Path) -> Result<u64> {
    std::fs::metadata(file_path)
        .map(|m| m.len())
        .map_err(|e| ForensicsError::io(file_path, e))
}
