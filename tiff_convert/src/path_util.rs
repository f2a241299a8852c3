//! File-name helpers.
//!
//! All functions work on the final path component as a string, so a name
//! like `.tif` has the extension `tif` and an empty base name.

use std::ffi::{OsStr, OsString};

/// Prefix every source extension must start with (case-sensitive).
pub const QUALIFYING_PREFIX: &str = "tif";

/// Text after the final `.`, or `None` when the name has no `.`.
///
/// ```
/// use tiff_convert::path_util::extension;
///
/// assert_eq!(extension("scan.tiff"), Some("tiff"));
/// assert_eq!(extension("archive.tar.gz"), Some("gz"));
/// assert_eq!(extension("noext"), None);
/// ```
pub fn extension(name: &str) -> Option<&str> {
    name.rfind('.').map(|i| &name[i + 1..])
}

/// File name with its final `.`-delimited extension removed. A name without
/// a `.` is returned unchanged.
///
/// ```
/// use tiff_convert::path_util::base_name;
///
/// assert_eq!(base_name("photo.TIF"), "photo");
/// assert_eq!(base_name("a.b.tif"), "a.b");
/// assert_eq!(base_name("noext"), "noext");
/// ```
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) => &name[..i],
        None => name,
    }
}

/// First three characters of the extension, as shown in skip notices.
pub fn extension_prefix(name: &str) -> &str {
    match extension(name) {
        Some(ext) => match ext.char_indices().nth(3) {
            Some((i, _)) => &ext[..i],
            None => ext,
        },
        None => "",
    }
}

/// `true` when the extension starts with `tif`.
pub fn is_qualifying(name: &str) -> bool {
    extension(name).is_some_and(|ext| ext.starts_with(QUALIFYING_PREFIX))
}

/// `base_name + "." + format`, built on the raw file name so names that
/// are not valid UTF-8 keep their exact bytes.
pub fn destination_name(name: &OsStr, output_format: &str) -> OsString {
    let bytes = name.as_encoded_bytes();
    let stem = match bytes.iter().rposition(|b| *b == b'.') {
        // SAFETY: the split lands directly before an ASCII '.'.
        Some(i) => unsafe { OsStr::from_encoded_bytes_unchecked(&bytes[..i]) },
        None => name,
    };
    let mut destination = stem.to_os_string();
    destination.push(".");
    destination.push(output_format);
    destination
}

/// Backslash-escape whitespace for display in a shell-like command line.
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `.` and `..`
pub fn is_dot_entry(name: &str) -> bool {
    name == "." || name == ".."
}
