use shared_utils::ErrorCategory;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{} contains {} frames; re-run with an explicit frame index", .path.display(), .frames.len())]
    AmbiguousInput { path: PathBuf, frames: Vec<String> },

    #[error("Cannot create target directory {}", .path.display())]
    TargetDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read directory {}", .path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Cannot read source file {}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed for {}{}{}", .path.display(), exit_suffix(.exit_code), stderr_suffix(.stderr))]
    SubprocessFailure {
        tool: String,
        path: PathBuf,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Converter produced no output file {}", .path.display())]
    OutputMissing { path: PathBuf },

    #[error("Cannot replace existing output {}", .path.display())]
    StaleOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!(" (exit code {})", c),
        None => " (no exit code)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

impl ConvertError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::InvalidConfig(_)
            | ConvertError::AmbiguousInput { .. }
            | ConvertError::TargetDirectory { .. } => ErrorCategory::Fatal,

            ConvertError::DirectoryRead { .. }
            | ConvertError::SourceUnreadable { .. }
            | ConvertError::SubprocessFailure { .. }
            | ConvertError::OutputMissing { .. }
            | ConvertError::StaleOutput { .. } => ErrorCategory::Recoverable,
        }
    }

    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::InvalidConfig(_) => 2,
            ConvertError::AmbiguousInput { .. } => 3,
            ConvertError::TargetDirectory { .. } => 4,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
