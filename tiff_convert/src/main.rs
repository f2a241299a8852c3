use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use shared_utils::{
    init_logging, install_panic_handler, is_command_available, report_error, LogConfig,
};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use tiff_convert::{
    run, ConversionConfig, ConversionSettings, ConvertError, RunReporter, SystemRunner, ToolSet,
    DEFAULT_OUTPUT_FORMAT,
};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "tiff-convert")]
#[command(
    version,
    about = "Convert every TIFF under a directory tree to JPEG2000 with ImageMagick",
    long_about = None,
    allow_negative_numbers = true
)]
struct CliArgs {
    /// Directory tree to read TIFF files from
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Root of the mirrored output tree (its parent must exist)
    #[arg(value_name = "TARGET")]
    target: PathBuf,

    /// Resize width in pixels, 0 = unset
    #[arg(value_name = "WIDTH")]
    width: u32,

    /// Resize height in pixels, 0 = unset
    #[arg(value_name = "HEIGHT")]
    height: u32,

    /// Output quality, 1-100
    #[arg(value_name = "QUALITY")]
    quality: i64,

    /// Output format / extension
    #[arg(value_name = "FORMAT", default_value = DEFAULT_OUTPUT_FORMAT)]
    format: String,

    /// Frame to convert from multipage files
    #[arg(value_name = "FRAME_INDEX")]
    frame_index: Option<u32>,

    /// Concurrent conversions
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Path to the ImageMagick `convert` executable
    #[arg(long, value_name = "PATH")]
    convert_bin: Option<PathBuf>,

    /// Path to the ImageMagick `identify` executable
    #[arg(long, value_name = "PATH")]
    identify_bin: Option<PathBuf>,

    /// Summary printed at the end of the run. With `json`, stdout carries
    /// only the JSON document and the per-file report goes to stderr.
    #[arg(long, value_enum, default_value = "human")]
    summary: SummaryFormat,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Directory for log files (system temp dir by default)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SummaryFormat {
    Human,
    Json,
}

/// `None` when required positionals are missing; the caller prints usage
/// and exits 0. Other argument errors are returned for clap to report.
fn parse_cli<I, T>(args: I) -> Result<Option<CliArgs>, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match CliArgs::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => Ok(None),
        Err(e) => Err(e),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = match parse_cli(std::env::args_os()) {
        Ok(Some(cli)) => cli,
        Ok(None) => {
            CliArgs::command().print_help()?;
            println!();
            return Ok(());
        }
        Err(e) => e.exit(),
    };

    let mut log_config = LogConfig::new();
    if let Some(dir) = &cli.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    if cli.verbose {
        log_config = log_config
            .with_level(Level::DEBUG)
            .with_stderr_level(Level::DEBUG);
    }
    if let Err(e) = init_logging("tiff_convert", log_config) {
        eprintln!("⚠️  Logging disabled: {:#}", e);
    }
    install_panic_handler();

    let tools = ToolSet::platform_default().with_overrides(cli.convert_bin, cli.identify_bin);
    for tool in [&tools.convert, &tools.identify] {
        let name = tool.to_string_lossy();
        if !is_command_available(&name) {
            warn!(tool = %name, "Tool not found; conversions will fail until it is installed");
        }
    }

    let settings = ConversionSettings {
        width: cli.width,
        height: cli.height,
        quality: cli.quality,
        output_format: cli.format,
        frame_index: cli.frame_index,
        tools,
        jobs: cli.jobs,
        ..ConversionSettings::new(cli.source, cli.target)
    };

    let config = match ConversionConfig::new(settings) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let report_stream: Box<dyn Write + Send> = match cli.summary {
        SummaryFormat::Human => Box::new(io::stdout()),
        SummaryFormat::Json => Box::new(io::stderr()),
    };
    let reporter = RunReporter::new(report_stream);
    let outcome = run(&config, &SystemRunner, &reporter);

    let summary = reporter.summary();
    match cli.summary {
        SummaryFormat::Human => reporter.write_summary(&summary),
        SummaryFormat::Json => match summary.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "Failed to serialize run summary"),
        },
    }
    info!(
        converted = summary.converted(),
        failed = summary.failed(),
        skipped = summary.skipped(),
        elapsed_secs = summary.elapsed_secs,
        "Run finished"
    );

    if let Err(e) = outcome {
        exit_with(&e);
    }
    Ok(())
}

fn exit_with(error: &ConvertError) -> ! {
    report_error(error);
    std::process::exit(error.exit_code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_positionals_mean_usage() {
        assert!(parse_cli(["tiff-convert"]).unwrap().is_none());
        assert!(parse_cli(["tiff-convert", "/in", "/out"]).unwrap().is_none());
        assert!(parse_cli(["tiff-convert", "/in", "/out", "0", "0"])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_full_positionals_parse() {
        let cli = parse_cli(["tiff-convert", "/in", "/out", "800", "0", "85", "png", "2"])
            .unwrap()
            .unwrap();
        assert_eq!(cli.width, 800);
        assert_eq!(cli.quality, 85);
        assert_eq!(cli.format, "png");
        assert_eq!(cli.frame_index, Some(2));
        assert_eq!(cli.jobs, 1);

        let cli = parse_cli(["tiff-convert", "/in", "/out", "0", "0", "75"])
            .unwrap()
            .unwrap();
        assert_eq!(cli.format, DEFAULT_OUTPUT_FORMAT);
        assert_eq!(cli.frame_index, None);
    }

    #[test]
    fn test_malformed_arguments_are_errors() {
        let err = parse_cli(["tiff-convert", "/in", "/out", "wide", "0", "75"]).err();
        assert!(matches!(err.map(|e| e.kind()), Some(ErrorKind::ValueValidation)));
        let err = parse_cli(["tiff-convert", "/in", "/out", "0", "0", "75", "--nope"]).err();
        assert!(err.is_some());
    }
}
