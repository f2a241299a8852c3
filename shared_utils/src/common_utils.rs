//! Common Utilities Module
//!
//! Small filesystem and tool-lookup helpers shared by the conversion tools.

use std::io;
use std::path::{Path, PathBuf};

/// Create `dir` if it is missing, without creating any of its parents.
///
/// An existing directory is fine; an existing non-directory is an
/// `AlreadyExists` error.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use shared_utils::common_utils::ensure_dir_exists;
///
/// ensure_dir_exists(Path::new("/tmp/out/sub")).unwrap();
/// ```
pub fn ensure_dir_exists(dir: &Path) -> io::Result<()> {
    match std::fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if dir.is_dir() {
                Ok(())
            } else {
                Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a directory", dir.display()),
                ))
            }
        }
        Err(e) => Err(e),
    }
}

/// Locate an executable on `PATH` (or check an explicit path).
pub fn find_tool(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Whether `name` resolves to an executable.
///
/// # Examples
/// ```no_run
/// use shared_utils::common_utils::is_command_available;
///
/// if is_command_available("convert") {
///     println!("ImageMagick is available");
/// }
/// ```
pub fn is_command_available(name: &str) -> bool {
    find_tool(name).is_some()
}

/// Size of a file in bytes, following symlinks.
pub fn file_size(path: &Path) -> io::Result<u64> {
    std::fs::metadata(path).map(|m| m.len())
}
