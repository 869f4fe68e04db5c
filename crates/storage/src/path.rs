//! Path validation for a flat cache directory.
//!
//! This module makes sure storage paths can't escape the cache directory
//! or reach into subdirectories.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path: it must resolve to exactly one filename.
///
/// Leading `./` components are dropped; anything containing `..`, a root,
/// a prefix, a null byte, or more than one normal component is rejected.
///
/// # Returns
/// Returns the bare filename if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ird_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("BLES01234-1A2B3C4D.ird").is_ok());
/// assert_eq!(validate_path("./file.ird").unwrap(), Path::new("file.ird"));
/// // Invalid paths
/// assert!(validate_path("../file.ird").is_err());
/// assert!(validate_path("sub/file.ird").is_err());
/// assert!(validate_path("/etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let invalid = || ErrorKind::InvalidPath(path.as_ref().to_path_buf());
    let mut filename = None;
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls; reject them explicitly.
                if s.as_encoded_bytes().contains(&0) || filename.is_some() {
                    exn::bail!(invalid());
                }
                filename = Some(s);
            },
            Component::CurDir => {},
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => exn::bail!(invalid()),
        }
    }
    match filename {
        Some(name) => Ok(PathBuf::from(name)),
        None => exn::bail!(invalid()),
    }
}
