//! Recursive source-tree walk with a mirrored target tree.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, Result};
use crate::invoker::{FileTask, ToolRunner};
use crate::multipage::MultipageResolver;
use crate::path_util::{destination_name, extension_prefix, is_dot_entry, is_qualifying};
use crate::reporter::{ReportEvent, RunReporter};
use shared_utils::{ensure_dir_exists, list_directory};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Receives every qualifying file in walk order.
///
/// An error returned here stops the walk and the run.
pub trait TaskSink {
    fn dispatch(&mut self, task: FileTask) -> Result<()>;
}

pub struct DirectoryWalker<'a, R: ToolRunner, W: Write> {
    config: &'a ConversionConfig,
    resolver: MultipageResolver<'a, R>,
    reporter: &'a RunReporter<W>,
}

impl<'a, R: ToolRunner, W: Write> DirectoryWalker<'a, R, W> {
    pub fn new(config: &'a ConversionConfig, runner: &'a R, reporter: &'a RunReporter<W>) -> Self {
        Self {
            config,
            resolver: MultipageResolver::new(&config.tools.identify, runner, config.frame_index),
            reporter,
        }
    }

    /// Walk `source_dir` depth-first, entries sorted by name.
    ///
    /// `target_dir` is created if missing; its parent must already exist.
    /// An unreadable source directory is reported and its subtree skipped.
    pub fn walk(&self, source_dir: &Path, target_dir: &Path, sink: &mut dyn TaskSink) -> Result<()> {
        self.reporter
            .emit(&ReportEvent::DirectoryEntered { path: source_dir });

        ensure_dir_exists(target_dir).map_err(|source| ConvertError::TargetDirectory {
            path: target_dir.to_path_buf(),
            source,
        })?;

        let entries = match list_directory(source_dir) {
            Ok(entries) => entries,
            Err(source) => {
                let error = ConvertError::DirectoryRead {
                    path: source_dir.to_path_buf(),
                    source,
                };
                warn!(directory = %source_dir.display(), error = %error, "Skipping unreadable directory");
                self.reporter.emit(&ReportEvent::DirectoryFailed {
                    path: source_dir,
                    error: &error,
                });
                return Ok(());
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(source_dir).to_path_buf();
                    let error = ConvertError::SourceUnreadable {
                        path: path.clone(),
                        source: e.into(),
                    };
                    self.reporter.emit(&ReportEvent::FileFailed {
                        path: &path,
                        error: &error,
                    });
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy();

            if is_dot_entry(&name) {
                self.reporter.emit(&ReportEvent::DotEntrySkipped { name: &name });
                continue;
            }

            if entry.file_type().is_dir() {
                self.walk(entry.path(), &target_dir.join(entry.file_name()), sink)?;
                continue;
            }

            if !is_qualifying(&name) {
                self.reporter.emit(&ReportEvent::NonQualifyingSkipped {
                    name: &name,
                    extension: extension_prefix(&name),
                });
                continue;
            }

            let frame = match self.resolver.resolve(entry.path()) {
                Ok(frame) => frame,
                Err(error) if error.category().is_fatal() => {
                    if let ConvertError::AmbiguousInput { path, frames } = &error {
                        self.reporter
                            .emit(&ReportEvent::AmbiguousInput { path, frames });
                    }
                    return Err(error);
                }
                Err(error) => {
                    self.reporter.emit(&ReportEvent::FileFailed {
                        path: entry.path(),
                        error: &error,
                    });
                    continue;
                }
            };

            let task = FileTask {
                source_path: entry.path().to_path_buf(),
                destination_path: target_dir
                    .join(destination_name(entry.file_name(), &self.config.output_format)),
                frame,
            };
            debug!(source = %task.source_path.display(), destination = %task.destination_path.display(), "Dispatching file");
            sink.dispatch(task)?;
        }

        Ok(())
    }
}
