//! Runs the external converter for one file.

use crate::error::{ConvertError, Result};
use crate::job::{source_argument, CommandTemplate};
use shared_utils::{execute_external_command, file_size, ExternalCommandResult, FileSize};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Process execution seam between the orchestration core and the OS.
pub trait ToolRunner: Sync {
    /// Run `program` with `args` to completion. Only failing to start or
    /// wait for the child is an error; a non-zero exit is returned in the
    /// result.
    fn run(&self, program: &OsStr, args: &[OsString]) -> anyhow::Result<ExternalCommandResult>;
}

/// Spawns real child processes, no shell in between.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &OsStr, args: &[OsString]) -> anyhow::Result<ExternalCommandResult> {
        execute_external_command(program, args)
    }
}

/// One qualifying source file on its way to the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    /// Explicit frame passed to the converter as `path[N]`.
    pub frame: Option<u32>,
}

impl FileTask {
    pub fn source_argument(&self) -> OsString {
        source_argument(&self.source_path, self.frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionResult {
    pub elapsed: Duration,
    pub source_size: FileSize,
    pub destination_size: FileSize,
}

pub struct ConverterInvoker<'a, R: ToolRunner> {
    template: &'a CommandTemplate,
    runner: &'a R,
}

impl<'a, R: ToolRunner> ConverterInvoker<'a, R> {
    pub fn new(template: &'a CommandTemplate, runner: &'a R) -> Self {
        Self { template, runner }
    }

    /// The literal command line for the report, paths escaped.
    pub fn invocation(&self, task: &FileTask) -> String {
        self.template
            .display(&task.source_argument(), &task.destination_path)
    }

    pub fn convert(&self, task: &FileTask) -> Result<ConversionResult> {
        let source_size =
            file_size(&task.source_path).map_err(|source| ConvertError::SourceUnreadable {
                path: task.source_path.clone(),
                source,
            })?;

        // A file left by an earlier run must not pass for fresh output.
        match std::fs::remove_file(&task.destination_path) {
            Ok(()) => debug!(destination = %task.destination_path.display(), "Removed stale output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ConvertError::StaleOutput {
                    path: task.destination_path.clone(),
                    source,
                })
            }
        }

        let args = self
            .template
            .render(&task.source_argument(), &task.destination_path);
        let tool = self.template.program().to_string_lossy().to_string();

        let start = Instant::now();
        let outcome = self.runner.run(self.template.program(), &args);
        let elapsed = start.elapsed();

        let output = outcome.map_err(|e| ConvertError::SubprocessFailure {
            tool: tool.clone(),
            path: task.source_path.clone(),
            exit_code: None,
            stderr: format!("{:#}", e),
        })?;

        if !output.success() {
            warn!(
                source = %task.source_path.display(),
                exit_code = ?output.exit_code,
                "Converter exited unsuccessfully"
            );
            return Err(ConvertError::SubprocessFailure {
                tool,
                path: task.source_path.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        let destination_size =
            file_size(&task.destination_path).map_err(|_| ConvertError::OutputMissing {
                path: task.destination_path.clone(),
            })?;

        debug!(
            source = %task.source_path.display(),
            destination = %task.destination_path.display(),
            source_bytes = source_size,
            destination_bytes = destination_size,
            elapsed_secs = elapsed.as_secs_f64(),
            "File converted"
        );

        Ok(ConversionResult {
            elapsed,
            source_size: FileSize::new(source_size),
            destination_size: FileSize::new(destination_size),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted stand-in for ImageMagick used across the crate's tests.

    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeRunner {
        pub calls: Mutex<Vec<(OsString, Vec<OsString>)>>,
        /// Source file names whose conversion exits with status 1.
        pub failing: Vec<String>,
        /// Source file names converted with exit 0 but no output written.
        pub silent: Vec<String>,
        /// `identify` stdout keyed by source file name; one frame otherwise.
        pub frames: HashMap<String, Vec<String>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls_to(&self, program: &str) -> Vec<Vec<OsString>> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| p == program)
                .map(|(_, a)| a.clone())
                .collect()
        }

        fn file_name(arg: &OsStr) -> String {
            let text = arg.to_string_lossy();
            let text = match text.rfind('[') {
                Some(i) if text.ends_with(']') => &text[..i],
                _ => &text[..],
            };
            Path::new(text)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        }

        fn ok(stdout: String) -> ExternalCommandResult {
            ExternalCommandResult {
                exit_code: Some(0),
                stdout,
                stderr: String::new(),
                duration: Duration::from_millis(1),
            }
        }
    }

    impl ToolRunner for FakeRunner {
        fn run(&self, program: &OsStr, args: &[OsString]) -> anyhow::Result<ExternalCommandResult> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_os_string(), args.to_vec()));

            let program = program.to_string_lossy();
            if program.ends_with("identify") || program.ends_with("identify.exe") {
                let name = Self::file_name(&args[0]);
                let lines = self
                    .frames
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| vec![format!("{} TIFF 10x10 10x10+0+0 8-bit sRGB", name)]);
                return Ok(Self::ok(lines.join("\n") + "\n"));
            }

            if program == "missing-binary" {
                anyhow::bail!("No such file or directory (os error 2)");
            }

            let name = Self::file_name(&args[0]);
            if self.failing.contains(&name) {
                return Ok(ExternalCommandResult {
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: format!("convert: unable to open image `{}'", name),
                    duration: Duration::from_millis(1),
                });
            }
            if !self.silent.contains(&name) {
                let destination = args.last().expect("destination argument");
                std::fs::write(destination, b"jp2 bytes")?;
            }
            Ok(Self::ok(String::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeRunner;
    use super::*;
    use crate::job::ConversionJobBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn task(temp: &TempDir, name: &str) -> FileTask {
        let source_path = temp.path().join(name);
        fs::write(&source_path, vec![0u8; 4096]).unwrap();
        FileTask {
            destination_path: temp.path().join(crate::path_util::destination_name(OsStr::new(name), "jp2")),
            source_path,
            frame: None,
        }
    }

    #[test]
    fn test_convert_measures_sizes() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("convert").build().unwrap();
        let runner = FakeRunner::new();
        let invoker = ConverterInvoker::new(&template, &runner);

        let task = task(&temp, "a.tif");
        let result = invoker.convert(&task).unwrap();

        assert_eq!(result.source_size.bytes(), 4096);
        assert_eq!(result.destination_size.bytes(), 9);
        assert_eq!(runner.calls_to("convert").len(), 1);
    }

    #[test]
    fn test_nonzero_exit_is_subprocess_failure() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("convert").build().unwrap();
        let runner = FakeRunner {
            failing: vec!["c.tif".to_string()],
            ..FakeRunner::new()
        };
        let invoker = ConverterInvoker::new(&template, &runner);

        let err = invoker.convert(&task(&temp, "c.tif")).unwrap_err();
        match err {
            ConvertError::SubprocessFailure { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(1));
                assert!(stderr.contains("unable to open image"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_output_is_reported() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("convert").build().unwrap();
        let runner = FakeRunner {
            silent: vec!["e.tif".to_string()],
            ..FakeRunner::new()
        };
        let invoker = ConverterInvoker::new(&template, &runner);

        let err = invoker.convert(&task(&temp, "e.tif")).unwrap_err();
        assert!(matches!(err, ConvertError::OutputMissing { .. }), "{:?}", err);
    }

    #[test]
    fn test_leftover_output_does_not_hide_missing_output() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("convert").build().unwrap();
        let runner = FakeRunner {
            silent: vec!["e.tif".to_string()],
            ..FakeRunner::new()
        };
        let invoker = ConverterInvoker::new(&template, &runner);

        let task = task(&temp, "e.tif");
        fs::write(&task.destination_path, vec![0u8; 777]).unwrap();

        let err = invoker.convert(&task).unwrap_err();
        assert!(matches!(err, ConvertError::OutputMissing { .. }), "{:?}", err);
        assert!(!task.destination_path.exists());
    }

    #[test]
    fn test_existing_output_is_replaced() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("convert").build().unwrap();
        let runner = FakeRunner::new();
        let invoker = ConverterInvoker::new(&template, &runner);

        let task = task(&temp, "r.tif");
        fs::write(&task.destination_path, vec![0u8; 777]).unwrap();

        let result = invoker.convert(&task).unwrap();
        assert_eq!(result.destination_size.bytes(), 9);
    }

    #[test]
    fn test_destination_that_cannot_be_cleared_fails_the_file() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("convert").build().unwrap();
        let runner = FakeRunner::new();
        let invoker = ConverterInvoker::new(&template, &runner);

        let task = task(&temp, "d.tif");
        fs::create_dir(&task.destination_path).unwrap();

        let err = invoker.convert(&task).unwrap_err();
        assert!(matches!(err, ConvertError::StaleOutput { .. }), "{:?}", err);
        assert!(!err.category().is_fatal());
        assert!(runner.calls_to("convert").is_empty());
    }

    #[test]
    fn test_spawn_failure_is_subprocess_failure() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("missing-binary").build().unwrap();
        let runner = FakeRunner::new();
        let invoker = ConverterInvoker::new(&template, &runner);

        let err = invoker.convert(&task(&temp, "a.tif")).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::SubprocessFailure { exit_code: None, .. }
        ));
    }

    #[test]
    fn test_unreadable_source_fails_before_running() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("convert").build().unwrap();
        let runner = FakeRunner::new();
        let invoker = ConverterInvoker::new(&template, &runner);

        let task = FileTask {
            source_path: temp.path().join("gone.tif"),
            destination_path: temp.path().join("gone.jp2"),
            frame: None,
        };
        let err = invoker.convert(&task).unwrap_err();
        assert!(matches!(err, ConvertError::SourceUnreadable { .. }));
        assert!(runner.calls_to("convert").is_empty());
    }

    #[test]
    fn test_frame_selection_in_arguments_and_invocation() {
        let temp = TempDir::new().unwrap();
        let template = ConversionJobBuilder::new("convert").build().unwrap();
        let runner = FakeRunner::new();
        let invoker = ConverterInvoker::new(&template, &runner);

        let mut task = task(&temp, "pages.tif");
        task.frame = Some(1);
        invoker.convert(&task).unwrap();

        let calls = runner.calls_to("convert");
        assert!(calls[0][0].to_string_lossy().ends_with("pages.tif[1]"));
        assert!(invoker.invocation(&task).contains("pages.tif[1] -depth 8"));
    }
}
