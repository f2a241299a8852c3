//! Safety Module
//!
//! Checks that keep a batch run from writing into system directories or into
//! the tree it is reading.

use std::path::Path;

const DANGEROUS_DIRS: &[&str] = &[
    "/",
    "/System",
    "/usr",
    "/bin",
    "/sbin",
    "/etc",
    "/var",
    "/private",
    "/Library",
    "/Applications",
    "/Users",
    "/home",
    "/root",
    "/boot",
    "/dev",
    "/proc",
    "/sys",
    "/tmp",
    "/opt",
];

pub fn check_dangerous_directory(path: &Path) -> Result<(), String> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_str = canonical.to_string_lossy();

    for dangerous in DANGEROUS_DIRS {
        if path_str == *dangerous || path.to_string_lossy() == *dangerous {
            return Err(format!(
                "🚨 DANGEROUS OPERATION BLOCKED!\n\
                 ❌ Target directory '{}' is a protected system directory.\n\
                 💡 Please specify a safe subdirectory instead.",
                dangerous
            ));
        }
    }

    let components = canonical.components().count();
    if components <= 3 && (path_str.starts_with("/Users/") || path_str.starts_with("/home/")) {
        return Err(format!(
            "🚨 DANGEROUS OPERATION BLOCKED!\n\
             ❌ Target '{}' is too close to your home directory root.\n\
             💡 Please specify a subdirectory like ~/Pictures/converted instead.",
            path.display()
        ));
    }

    Ok(())
}

/// Reject an output directory that is the input directory or lies inside it.
///
/// Both paths are expected to be canonical.
pub fn check_not_nested(input: &Path, output: &Path) -> Result<(), String> {
    if output == input {
        return Err(format!(
            "❌ PATH CONFLICT ERROR: Input and output directories are identical: {}",
            input.display()
        ));
    }
    if output.starts_with(input) {
        return Err(format!(
            "❌ PATH CONFLICT ERROR: Output directory {} is inside input directory {}",
            output.display(),
            input.display()
        ));
    }
    Ok(())
}
