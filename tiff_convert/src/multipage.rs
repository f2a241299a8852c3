//! Multipage detection through ImageMagick `identify`.
//!
//! `identify` prints one descriptor line per frame. A file with more than one
//! frame cannot be converted until the operator picks a frame index, so that
//! case stops the whole run.

use crate::error::{ConvertError, Result};
use crate::invoker::ToolRunner;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use tracing::debug;

/// Non-empty lines of `identify` output, one per frame.
pub fn parse_frame_descriptors(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct MultipageResolver<'a, R: ToolRunner> {
    identify: &'a OsStr,
    runner: &'a R,
    frame_index: Option<u32>,
}

impl<'a, R: ToolRunner> MultipageResolver<'a, R> {
    pub fn new(identify: &'a OsStr, runner: &'a R, frame_index: Option<u32>) -> Self {
        Self {
            identify,
            runner,
            frame_index,
        }
    }

    /// Frame to pass to the converter.
    ///
    /// A configured frame index is returned as is without probing. Otherwise
    /// a single-frame file resolves to `None` (no explicit selection) and a
    /// multi-frame file is `AmbiguousInput`.
    pub fn resolve(&self, file: &Path) -> Result<Option<u32>> {
        if let Some(index) = self.frame_index {
            return Ok(Some(index));
        }

        let frames = self.frames(file)?;
        debug!(file = %file.display(), frames = frames.len(), "Counted frames");

        match frames.len() {
            0 => Err(ConvertError::SubprocessFailure {
                tool: self.identify.to_string_lossy().to_string(),
                path: file.to_path_buf(),
                exit_code: Some(0),
                stderr: "no frames reported".to_string(),
            }),
            1 => Ok(None),
            _ => Err(ConvertError::AmbiguousInput {
                path: file.to_path_buf(),
                frames,
            }),
        }
    }

    pub fn frames(&self, file: &Path) -> Result<Vec<String>> {
        let tool = self.identify.to_string_lossy().to_string();
        let args = [OsString::from(file.as_os_str())];

        let output = self
            .runner
            .run(self.identify, &args)
            .map_err(|e| ConvertError::SubprocessFailure {
                tool: tool.clone(),
                path: file.to_path_buf(),
                exit_code: None,
                stderr: format!("{:#}", e),
            })?;

        if !output.success() {
            return Err(ConvertError::SubprocessFailure {
                tool,
                path: file.to_path_buf(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        Ok(parse_frame_descriptors(&output.stdout))
    }
}
