//! Run report.
//!
//! Every event of a run becomes one or more human-readable lines on the
//! report stream (stdout in the binary). The reporter also keeps the tallies
//! that feed the final summary. All writes for one call happen under a single
//! lock, so a file's lines stay together when conversions run in parallel.

use crate::error::ConvertError;
use crate::invoker::ConversionResult;
use serde::Serialize;
use shared_utils::{write_summary_report, BatchResult, FileSize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

pub enum ReportEvent<'a> {
    DirectoryEntered {
        path: &'a Path,
    },
    DotEntrySkipped {
        name: &'a str,
    },
    NonQualifyingSkipped {
        name: &'a str,
        extension: &'a str,
    },
    Processing {
        source: &'a Path,
        invocation: &'a str,
    },
    Converted {
        result: &'a ConversionResult,
    },
    FileFailed {
        path: &'a Path,
        error: &'a ConvertError,
    },
    DirectoryFailed {
        path: &'a Path,
        error: &'a ConvertError,
    },
    AmbiguousInput {
        path: &'a Path,
        frames: &'a [String],
    },
}

/// Report lines for one event.
pub fn format_event(event: &ReportEvent<'_>) -> Vec<String> {
    match event {
        ReportEvent::DirectoryEntered { path } => {
            vec![format!("Processing directory {}", path.display())]
        }
        ReportEvent::DotEntrySkipped { name } => vec![format!("Skipping dot file '{}'", name)],
        ReportEvent::NonQualifyingSkipped { name, extension } => vec![format!(
            "Skipping non-TIFF file {} (extension '{}')",
            name, extension
        )],
        ReportEvent::Processing { source, invocation } => vec![
            format!("Processing {}", source.display()),
            format!("  {}", invocation),
        ],
        ReportEvent::Converted { result } => vec![
            format!(
                "  compressed {:.6} Mb to {:.6} Mb in {:.6} s",
                result.source_size.mebibytes(),
                result.destination_size.mebibytes(),
                result.elapsed.as_secs_f64()
            ),
            String::new(),
        ],
        ReportEvent::FileFailed { path, error } => {
            vec![format!("  FAILED {}: {}", path.display(), error), String::new()]
        }
        ReportEvent::DirectoryFailed { path, error } => vec![format!(
            "Skipping unreadable directory {}: {}",
            path.display(),
            error_chain(error)
        )],
        ReportEvent::AmbiguousInput { path, frames } => {
            let mut lines = vec![format!(
                "Multipage image {} contains {} frames:",
                path.display(),
                frames.len()
            )];
            lines.extend(
                frames
                    .iter()
                    .enumerate()
                    .map(|(i, frame)| format!("  [{}] {}", i, frame)),
            );
            lines.push(
                "Re-run with an explicit frame index (last positional argument) to select one."
                    .to_string(),
            );
            lines
        }
    }
}

fn error_chain(error: &ConvertError) -> String {
    let mut text = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        text.push_str(": ");
        text.push_str(&err.to_string());
        source = err.source();
    }
    text
}

/// Totals for a finished (or aborted) run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub files: BatchResult,
    pub failed_directories: Vec<(PathBuf, String)>,
    pub input_bytes: FileSize,
    pub output_bytes: FileSize,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn converted(&self) -> usize {
        self.files.succeeded
    }

    pub fn failed(&self) -> usize {
        self.files.failed
    }

    pub fn skipped(&self) -> usize {
        self.files.skipped
    }

    /// Pretty-printed JSON document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

struct ReporterState<W> {
    out: W,
    files: BatchResult,
    failed_directories: Vec<(PathBuf, String)>,
    input_bytes: FileSize,
    output_bytes: FileSize,
}

impl<W: Write> ReporterState<W> {
    fn tally(&mut self, event: &ReportEvent<'_>) {
        match event {
            ReportEvent::DotEntrySkipped { .. } | ReportEvent::NonQualifyingSkipped { .. } => {
                self.files.skip()
            }
            ReportEvent::Converted { result } => {
                self.files.success();
                self.input_bytes = self.input_bytes.saturating_add(result.source_size);
                self.output_bytes = self.output_bytes.saturating_add(result.destination_size);
            }
            ReportEvent::FileFailed { path, error } => {
                self.files.fail(path.to_path_buf(), error.to_string())
            }
            ReportEvent::DirectoryFailed { path, error } => self
                .failed_directories
                .push((path.to_path_buf(), error_chain(error))),
            ReportEvent::DirectoryEntered { .. }
            | ReportEvent::Processing { .. }
            | ReportEvent::AmbiguousInput { .. } => {}
        }
    }

    fn write_lines(&mut self, lines: &[String]) {
        for line in lines {
            if let Err(e) = writeln!(self.out, "{}", line) {
                warn!(error = %e, "Failed to write report line");
                return;
            }
        }
    }
}

pub struct RunReporter<W: Write> {
    state: Mutex<ReporterState<W>>,
    started: Instant,
}

impl<W: Write> RunReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new(ReporterState {
                out,
                files: BatchResult::new(),
                failed_directories: Vec::new(),
                input_bytes: FileSize::ZERO,
                output_bytes: FileSize::ZERO,
            }),
            started: Instant::now(),
        }
    }

    pub fn emit(&self, event: &ReportEvent<'_>) {
        self.emit_all(std::slice::from_ref(event));
    }

    /// Write several events as one uninterrupted block.
    pub fn emit_all(&self, events: &[ReportEvent<'_>]) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        for event in events {
            state.tally(event);
            let lines = format_event(event);
            state.write_lines(&lines);
        }
        if let Err(e) = state.out.flush() {
            warn!(error = %e, "Failed to flush report stream");
        }
    }

    pub fn summary(&self) -> RunSummary {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        RunSummary {
            files: state.files.clone(),
            failed_directories: state.failed_directories.clone(),
            input_bytes: state.input_bytes,
            output_bytes: state.output_bytes,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }

    /// Boxed human-readable summary on the report stream.
    pub fn write_summary(&self, summary: &RunSummary) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let result = write_summary_report(
            &mut state.out,
            &summary.files,
            Duration::from_secs_f64(summary.elapsed_secs),
            summary.input_bytes.bytes(),
            summary.output_bytes.bytes(),
            "TIFF Conversion",
        );
        if let Err(e) = result {
            warn!(error = %e, "Failed to write summary report");
            return;
        }
        if !summary.failed_directories.is_empty() {
            let mut lines = vec![String::new(), "⚠️ Directories skipped:".to_string()];
            lines.extend(
                summary
                    .failed_directories
                    .iter()
                    .map(|(path, error)| format!("   {} → {}", path.display(), error)),
            );
            state.write_lines(&lines);
        }
        let _ = state.out.flush();
    }

    pub fn into_inner(self) -> W {
        self.state
            .into_inner()
            .unwrap_or_else(|p| p.into_inner())
            .out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted() -> ConversionResult {
        ConversionResult {
            elapsed: Duration::from_millis(1500),
            source_size: FileSize::from_mb(2),
            destination_size: FileSize::new(512 * 1024),
        }
    }

    #[test]
    fn test_converted_line_uses_mebibytes() {
        let result = converted();
        let lines = format_event(&ReportEvent::Converted { result: &result });
        assert_eq!(lines[0], "  compressed 2.000000 Mb to 0.500000 Mb in 1.500000 s");
    }

    #[test]
    fn test_skip_lines() {
        assert_eq!(
            format_event(&ReportEvent::DotEntrySkipped { name: ".." }),
            vec!["Skipping dot file '..'"]
        );
        assert_eq!(
            format_event(&ReportEvent::NonQualifyingSkipped {
                name: "readme.txt",
                extension: "txt"
            }),
            vec!["Skipping non-TIFF file readme.txt (extension 'txt')"]
        );
    }

    #[test]
    fn test_processing_lines_include_invocation() {
        let lines = format_event(&ReportEvent::Processing {
            source: Path::new("/in/a.tif"),
            invocation: "convert /in/a.tif -depth 8 -quality 75 -quiet /out/a.jp2",
        });
        assert_eq!(lines[0], "Processing /in/a.tif");
        assert_eq!(lines[1], "  convert /in/a.tif -depth 8 -quality 75 -quiet /out/a.jp2");
    }

    #[test]
    fn test_ambiguous_lists_every_frame() {
        let frames = vec!["m.tif[0] TIFF".to_string(), "m.tif[1] TIFF".to_string()];
        let lines = format_event(&ReportEvent::AmbiguousInput {
            path: Path::new("/in/m.tif"),
            frames: &frames,
        });
        assert!(lines[0].contains("contains 2 frames"));
        assert_eq!(lines[1], "  [0] m.tif[0] TIFF");
        assert_eq!(lines[2], "  [1] m.tif[1] TIFF");
        assert!(lines[3].contains("frame index"));
    }

    #[test]
    fn test_reporter_tallies_events() {
        let reporter = RunReporter::new(Vec::new());
        let result = converted();
        let err = ConvertError::OutputMissing {
            path: PathBuf::from("/out/c.jp2"),
        };

        reporter.emit(&ReportEvent::DirectoryEntered {
            path: Path::new("/in"),
        });
        reporter.emit(&ReportEvent::NonQualifyingSkipped {
            name: "readme.txt",
            extension: "txt",
        });
        reporter.emit_all(&[
            ReportEvent::Processing {
                source: Path::new("/in/a.tif"),
                invocation: "convert ...",
            },
            ReportEvent::Converted { result: &result },
        ]);
        reporter.emit(&ReportEvent::FileFailed {
            path: Path::new("/in/c.tif"),
            error: &err,
        });

        let summary = reporter.summary();
        assert_eq!(summary.converted(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.input_bytes.bytes(), 2 * 1024 * 1024);
        assert_eq!(summary.output_bytes.bytes(), 512 * 1024);

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.starts_with("Processing directory /in\n"));
        assert!(text.contains("  FAILED /in/c.tif: Converter produced no output file /out/c.jp2"));
    }

    #[test]
    fn test_summary_outputs() {
        let reporter = RunReporter::new(Vec::new());
        let result = converted();
        reporter.emit(&ReportEvent::Converted { result: &result });
        let summary = reporter.summary();
        reporter.write_summary(&summary);

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains("TIFF Conversion Summary Report"));

        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["files"]["succeeded"], 1);
        assert_eq!(json["input_bytes"], 2097152);
    }
}
