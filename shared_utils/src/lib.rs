//! Shared Utilities for the tiff-convert tools
//!
//! Ambient functionality kept out of the conversion core:
//! - Logging setup and external tool logging
//! - Error categories and loud error reporting
//! - Batch counters and sorted directory listing
//! - Summary reports
//! - Safety checks (dangerous directory detection, nested input/output)
//! - Type-safe file sizes

pub mod batch;
pub mod common_utils;
pub mod error_handler;
pub mod logging;
pub mod report;
pub mod safety;
pub mod types;

pub use batch::{list_directory, BatchResult};
pub use common_utils::{ensure_dir_exists, file_size, find_tool, is_command_available};
pub use error_handler::{install_panic_handler, report_error, ErrorCategory};
pub use logging::{execute_external_command, init_logging, ExternalCommandResult, LogConfig};
pub use report::{format_duration, size_reduction_percent, write_summary_report};
pub use safety::{check_dangerous_directory, check_not_nested};
pub use types::FileSize;
