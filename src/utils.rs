//! # Utility Functions Module
//!
//! Helpers for building external command lines.

use std::ffi::{OsStr, OsString};

/// Convert anything that looks like an OS string into an owned argument.
///
/// Paths go through untouched, so non UTF-8 file names still reach the
/// external tool intact.
pub fn os_arg<S: AsRef<OsStr>>(item: S) -> OsString {
    item.as_ref().to_os_string()
}

/// Build a `Vec<OsString>` from mixed `&str`, `String` and `&Path` items.
///
/// # Example
/// ```rust
/// use std::path::Path;
///
/// let path = Path::new("photo.jpg");
/// let args = imgsqueeze::args!["--quality", 84.to_string(), path, path];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$($crate::utils::os_arg($item)),*]
    };
}
