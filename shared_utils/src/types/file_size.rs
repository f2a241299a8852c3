//! Byte counts for conversion reports.

use serde::Serialize;
use std::fmt;

/// File size in bytes.
///
/// ```
/// use shared_utils::types::file_size::FileSize;
///
/// let size = FileSize::new(1024 * 1024);
/// assert_eq!(size.mebibytes(), 1.0);
/// assert_eq!(size.to_string(), "1.00 MiB");
/// assert_eq!(FileSize::new(u64::MAX).saturating_add(size).bytes(), u64::MAX);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileSize(u64);

const MIB: u64 = 1024 * 1024;

impl FileSize {
    pub const ZERO: FileSize = FileSize(0);

    #[inline]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn from_mb(mb: u64) -> Self {
        Self(mb * MIB)
    }

    #[inline]
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// bytes / 1024 / 1024, the unit of the per-file report line.
    #[inline]
    pub fn mebibytes(&self) -> f64 {
        self.0 as f64 / MIB as f64
    }

    #[inline]
    pub fn saturating_add(&self, other: FileSize) -> FileSize {
        FileSize(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= MIB {
            write!(f, "{:.2} MiB", self.mebibytes())
        } else if self.0 >= 1024 {
            write!(f, "{:.2} KiB", self.0 as f64 / 1024.0)
        } else {
            write!(f, "{} B", self.0)
        }
    }
}
