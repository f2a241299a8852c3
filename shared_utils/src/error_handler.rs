//! Unified Error Handler Module
//!
//! ## Error categories
//! - Recoverable: the current item fails, the batch continues
//! - Fatal: the whole run stops
//!
//! ## Reporting
//! - `report_error()`: loud report to stderr and the log, with the cause chain
//! - `install_panic_handler()`: records panics before the default hook runs

use std::fmt;
use std::panic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Recoverable,
    Fatal,
}

impl ErrorCategory {
    pub fn is_fatal(self) -> bool {
        self == ErrorCategory::Fatal
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Recoverable => write!(f, "RECOVERABLE"),
            ErrorCategory::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Print an error and every `source()` below it to stderr and the log.
pub fn report_error<E: std::error::Error + ?Sized>(error: &E) {
    eprintln!("🔥 ERROR: {}", error);

    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        eprintln!("   {}. Caused by: {}", level, err);
        source = err.source();
        level += 1;
    }

    tracing::error!("Error occurred: {}", error);

    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        tracing::error!("  Caused by (level {}): {}", level, err);
        source = err.source();
        level += 1;
    }
}

pub fn install_panic_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        let location = if let Some(loc) = panic_info.location() {
            format!("{}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            "Unknown location".to_string()
        };

        eprintln!("💥 PANIC occurred!");
        eprintln!("   Message: {}", message);
        eprintln!("   Location: {}", location);
        eprintln!("   This is a bug! Please report it.");

        tracing::error!("PANIC: {} at {}", message, location);

        default_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug)]
    struct Outer(io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "outer failure")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Fatal.to_string(), "FATAL");
        assert_eq!(ErrorCategory::Recoverable.to_string(), "RECOVERABLE");
    }

    #[test]
    fn test_only_fatal_is_fatal() {
        assert!(ErrorCategory::Fatal.is_fatal());
        assert!(!ErrorCategory::Recoverable.is_fatal());
    }

    #[test]
    fn test_report_error_walks_chain_without_panic() {
        let err = Outer(io::Error::new(io::ErrorKind::NotFound, "inner"));
        report_error(&err);
    }
}
