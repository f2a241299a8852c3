//! Run orchestration: walk the source tree and convert every qualifying file,
//! either inline or on a rayon pool.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, Result};
use crate::invoker::{ConverterInvoker, FileTask, ToolRunner};
use crate::reporter::{ReportEvent, RunReporter};
use crate::walker::{DirectoryWalker, TaskSink};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

/// Converts each task as soon as the walker finds it.
struct SequentialSink<'a, R: ToolRunner, W: Write> {
    invoker: ConverterInvoker<'a, R>,
    reporter: &'a RunReporter<W>,
}

impl<R: ToolRunner, W: Write> TaskSink for SequentialSink<'_, R, W> {
    fn dispatch(&mut self, task: FileTask) -> Result<()> {
        let invocation = self.invoker.invocation(&task);
        self.reporter.emit(&ReportEvent::Processing {
            source: &task.source_path,
            invocation: &invocation,
        });
        match self.invoker.convert(&task) {
            Ok(result) => self.reporter.emit(&ReportEvent::Converted { result: &result }),
            Err(error) => self.reporter.emit(&ReportEvent::FileFailed {
                path: &task.source_path,
                error: &error,
            }),
        }
        Ok(())
    }
}

/// Collects tasks grouped by destination, first-seen order preserved.
#[derive(Default)]
struct ParallelSink {
    groups: Vec<Vec<FileTask>>,
    index: HashMap<PathBuf, usize>,
}

impl TaskSink for ParallelSink {
    fn dispatch(&mut self, task: FileTask) -> Result<()> {
        match self.index.get(&task.destination_path) {
            Some(&i) => {
                warn!(
                    source = %task.source_path.display(),
                    destination = %task.destination_path.display(),
                    "Destination shared with an earlier file; it will be overwritten"
                );
                self.groups[i].push(task);
            }
            None => {
                self.index
                    .insert(task.destination_path.clone(), self.groups.len());
                self.groups.push(vec![task]);
            }
        }
        Ok(())
    }
}

/// Convert one task and emit its lines as one block.
fn convert_buffered<R: ToolRunner, W: Write>(
    invoker: &ConverterInvoker<'_, R>,
    reporter: &RunReporter<W>,
    task: &FileTask,
) {
    let invocation = invoker.invocation(task);
    let processing = ReportEvent::Processing {
        source: &task.source_path,
        invocation: &invocation,
    };
    match invoker.convert(task) {
        Ok(result) => reporter.emit_all(&[processing, ReportEvent::Converted { result: &result }]),
        Err(error) => reporter.emit_all(&[
            processing,
            ReportEvent::FileFailed {
                path: &task.source_path,
                error: &error,
            },
        ]),
    }
}

/// Run one conversion pass over `config.source_root`.
///
/// Per-file and per-directory failures are reported and the run goes on.
/// The returned error is always fatal: an ambiguous multipage input or a
/// target directory that cannot be created.
pub fn run<R: ToolRunner, W: Write + Send>(
    config: &ConversionConfig,
    runner: &R,
    reporter: &RunReporter<W>,
) -> Result<()> {
    info!(
        source = %config.source_root.display(),
        target = %config.target_root.display(),
        jobs = config.jobs,
        "Starting conversion run"
    );

    let walker = DirectoryWalker::new(config, runner, reporter);
    let invoker = ConverterInvoker::new(config.command_template(), runner);

    if config.jobs <= 1 {
        let mut sink = SequentialSink { invoker, reporter };
        return walker.walk(&config.source_root, &config.target_root, &mut sink);
    }

    let mut sink = ParallelSink::default();
    let walked = walker.walk(&config.source_root, &config.target_root, &mut sink);
    if let Err(ConvertError::TargetDirectory { .. }) = &walked {
        return walked;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .map_err(|e| ConvertError::InvalidConfig(format!("Failed to create thread pool: {}", e)))?;

    info!(
        groups = sink.groups.len(),
        threads = config.jobs,
        "Converting collected files"
    );
    pool.install(|| {
        sink.groups.par_iter().for_each(|group| {
            for task in group {
                convert_buffered(&invoker, reporter, task);
            }
        });
    });

    walked
}
