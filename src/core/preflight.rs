/// Checks that must pass before any analysis starts

use std::path::Path;

use log::debug;

use crate::core::errors::{ForensicsError, Result};

/// Effective user id of the process
#[cfg(unix)]
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() }
}

/// Refuse to run without root privileges
///
/// Several of the tools write extraction output next to the target and
/// binwalk's extractors expect to run as root.
#[cfg(unix)]
pub fn check_root() -> Result<()> {
    require_root(effective_uid())
}

/// Privilege cannot be verified off Unix, so the check always fails
#[cfg(not(unix))]
pub fn check_root() -> Result<()> {
    Err(ForensicsError::Privilege { uid: u32::MAX })
}

fn require_root(uid: u32) -> Result<()> {
    debug!("Effective uid: {}", uid);
    if uid == 0 {
        Ok(())
    } else {
        Err(ForensicsError::Privilege { uid })
    }
}

/// Fail with `FileNotFound` unless `path` exists
pub fn check_file_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ForensicsError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}
