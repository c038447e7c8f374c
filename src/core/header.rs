/// Header repair helpers
///
/// CTF files often ship with a deliberately broken magic number. These helpers
/// show the leading bytes and write a copy with a replacement header.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::core::errors::{ForensicsError, Result};

/// Prefix of the repaired copy's file name
pub const FIXED_PREFIX: &str = "fixed_";

/// Group a hex string into space-separated byte pairs
///
/// Whitespace in the input is ignored, so already grouped text comes back
/// unchanged.
pub fn format_hex_dump(hex: &str) -> String {
    let digits: Vec<char> = hex.chars().filter(|c| !c.is_whitespace()).collect();
    digits
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Path of the repaired copy: same directory, `fixed_` prepended to the name
pub fn fixed_path(original: &Path) -> PathBuf {
    let name = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    original.with_file_name(format!("{}{}", FIXED_PREFIX, name))
}

/// Write a copy of `original` whose leading bytes are replaced by `new_header_hex`
///
/// As many bytes are dropped from the original as the header text encodes
/// (`len / 2`), the remainder is appended to the new header and the result is
/// written next to the original as `fixed_<name>`. Nothing is written when the
/// combined hex does not decode.
pub fn rewrite_header(original: &Path, new_header_hex: &str) -> Result<PathBuf> {
    let data = fs::read(original).map_err(|e| ForensicsError::io(original, e))?;

    let skip = new_header_hex.len() / 2;
    let rest = data.get(skip..).unwrap_or(&[]);

    let combined = format!("{}{}", new_header_hex, hex::encode(rest));
    let repaired = hex::decode(combined)?;

    let output = fixed_path(original);
    fs::write(&output, repaired).map_err(|e| ForensicsError::io(&output, e))?;

    info!(
        "Wrote {} with header {}",
        output.display(),
        format_hex_dump(new_header_hex)
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::file_utils::read_header_hex;

    #[test]
    fn test_format_hex_dump() {
        assert_eq!(format_hex_dump("89504e470d0a"), "89 50 4e 47 0d 0a");
        assert_eq!(format_hex_dump("abc"), "ab c");
        assert_eq!(format_hex_dump(""), "");
    }

    #[test]
    fn test_format_hex_dump_is_idempotent() {
        let once = format_hex_dump("ffd8ffe000104a46494600\n0101");
        assert_eq!(format_hex_dump(&once), once);
    }

    #[test]
    fn test_fixed_path() {
        assert_eq!(
            fixed_path(Path::new("/tmp/ctf/broken.png")),
            PathBuf::from("/tmp/ctf/fixed_broken.png")
        );
        assert_eq!(fixed_path(Path::new("broken.png")), PathBuf::from("fixed_broken.png"));
    }

    #[test]
    fn test_rewrite_header_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("broken.png");
        fs::write(&original, b"\x00\x00\x00\x00\r\n\x1a\nIHDR-rest").unwrap();

        let output = rewrite_header(&original, "89504e47").unwrap();

        assert_eq!(output, dir.path().join("fixed_broken.png"));
        assert_eq!(read_header_hex(&output, 4).unwrap(), "89504e47");
        assert_eq!(fs::read(&output).unwrap(), b"\x89PNG\r\n\x1a\nIHDR-rest".to_vec());
        // original untouched
        assert_eq!(fs::read(&original).unwrap()[..4], [0, 0, 0, 0]);
    }

    #[test]
    fn test_header_longer_than_file() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("tiny.bin");
        fs::write(&original, b"\x01").unwrap();

        let output = rewrite_header(&original, "ffd8ff").unwrap();
        assert_eq!(fs::read(output).unwrap(), vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_invalid_header_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("broken.jpg");
        fs::write(&original, b"\x00\x00\x00\x00").unwrap();

        for bad in ["ffd", "zz00", "ff d8"] {
            assert!(matches!(
                rewrite_header(&original, bad),
                Err(ForensicsError::Decode(_))
            ));
            assert!(!fixed_path(&original).exists());
        }
    }
}
