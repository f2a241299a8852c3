//! Batch TIFF → JPEG2000 conversion over a mirrored directory tree.
//!
//! The source tree is walked depth-first; every directory is recreated under
//! the target root and every `*.tif*` file is handed to ImageMagick `convert`.
//! Multipage files are detected with `identify` and stop the run unless a
//! frame index is configured.

pub mod config;
pub mod error;
pub mod invoker;
pub mod job;
pub mod multipage;
pub mod path_util;
pub mod reporter;
pub mod run;
pub mod walker;

pub use config::{ConversionConfig, ConversionSettings, ToolSet};
pub use error::{ConvertError, Result};
pub use invoker::{ConversionResult, ConverterInvoker, FileTask, SystemRunner, ToolRunner};
pub use job::{CommandTemplate, ConversionJobBuilder, TemplateArg, DEFAULT_OUTPUT_FORMAT};
pub use multipage::MultipageResolver;
pub use reporter::{ReportEvent, RunReporter, RunSummary};
pub use run::run;
pub use walker::{DirectoryWalker, TaskSink};
