//! Batch Processing Module
//!
//! Counters for batch runs and the one-level directory listing used by the
//! recursive walkers.

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// List the immediate children of `dir`, sorted by file name.
///
/// Symlinks are followed for the entry type, so a link to a directory lists
/// as a directory. Failing to open `dir` itself is the outer error; a broken
/// individual entry is returned in place as an inner error so the caller can
/// report it and carry on with its siblings.
pub fn list_directory(dir: &Path) -> Result<Vec<walkdir::Result<DirEntry>>, walkdir::Error> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut entries = Vec::new();
    for item in walker {
        match item {
            Err(e) if e.depth() == 0 => return Err(e),
            other => entries.push(other),
        }
    }
    Ok(entries)
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }

    pub fn success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

impl Default for BatchResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_batch_result_new() {
        let result = BatchResult::new();
        assert_eq!(result.total, 0);
        assert_eq!(result.succeeded, 0);
        assert_eq!(result.failed, 0);
        assert_eq!(result.skipped, 0);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_batch_result_mixed() {
        let mut result = BatchResult::new();
        result.success();
        result.success();
        result.fail(PathBuf::from("c.tif"), "Error".to_string());
        result.skip();

        assert_eq!(result.total, 4);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors[0].0, PathBuf::from("c.tif"));
        assert_eq!(
            result.total,
            result.succeeded + result.failed + result.skipped,
            "total must equal succeeded + failed + skipped"
        );
    }

    #[test]
    fn test_success_rate_empty() {
        let result = BatchResult::new();
        assert!((result.success_rate() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_with_skipped() {
        let mut result = BatchResult::new();
        result.success();
        result.success();
        result.skip();
        result.skip();

        assert!(
            (result.success_rate() - 50.0).abs() < 0.01,
            "2 success, 2 skipped should be 50%, got {}",
            result.success_rate()
        );
    }

    #[test]
    fn test_list_directory_sorted_one_level() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.tif"), b"b").unwrap();
        fs::write(temp.path().join("a.tif"), b"a").unwrap();
        fs::create_dir(temp.path().join("c")).unwrap();
        fs::write(temp.path().join("c").join("nested.tif"), b"n").unwrap();

        let names: Vec<String> = list_directory(temp.path())
            .unwrap()
            .into_iter()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.tif", "b.tif", "c"]);
    }

    #[test]
    fn test_list_directory_empty() {
        let temp = TempDir::new().unwrap();
        assert!(list_directory(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_list_directory_missing_is_outer_error() {
        let temp = TempDir::new().unwrap();
        assert!(list_directory(&temp.path().join("missing")).is_err());
    }
}
