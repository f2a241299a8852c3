//! Conversion job template.
//!
//! The template is built once per run from the resize, quality and format
//! settings. It holds the converter program and its argument list with two
//! open slots, source and destination, filled in per file.

use crate::error::{ConvertError, Result};
use crate::path_util::escape_path;
use std::ffi::{OsStr, OsString};
use std::path::Path;

pub const MIN_QUALITY: u32 = 1;
pub const MAX_QUALITY: u32 = 100;
pub const DEFAULT_OUTPUT_FORMAT: &str = "jp2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateArg {
    Literal(String),
    Source,
    Destination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: OsString,
    args: Vec<TemplateArg>,
}

impl CommandTemplate {
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[TemplateArg] {
        &self.args
    }

    pub fn has_resize(&self) -> bool {
        self.args
            .iter()
            .any(|a| matches!(a, TemplateArg::Literal(s) if s == "-resize"))
    }

    /// Argument vector for the child process, slots substituted.
    pub fn render(&self, source: &OsStr, destination: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg {
                TemplateArg::Literal(s) => OsString::from(s),
                TemplateArg::Source => source.to_os_string(),
                TemplateArg::Destination => destination.as_os_str().to_os_string(),
            })
            .collect()
    }

    /// The invocation as one command line, whitespace in paths escaped.
    pub fn display(&self, source: &OsStr, destination: &Path) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(escape_path(&self.program.to_string_lossy()));
        for arg in &self.args {
            parts.push(match arg {
                TemplateArg::Literal(s) => s.clone(),
                TemplateArg::Source => escape_path(&source.to_string_lossy()),
                TemplateArg::Destination => escape_path(&destination.to_string_lossy()),
            });
        }
        parts.join(" ")
    }
}

/// `path[N]` when a frame is selected, the bare path otherwise.
pub fn source_argument(path: &Path, frame: Option<u32>) -> OsString {
    let mut arg = path.as_os_str().to_os_string();
    if let Some(index) = frame {
        arg.push(format!("[{}]", index));
    }
    arg
}

/// `WxH` with an unset side left empty; `None` when neither side is set.
pub fn resize_geometry(width: Option<u32>, height: Option<u32>) -> Option<String> {
    let width = width.filter(|w| *w > 0);
    let height = height.filter(|h| *h > 0);
    if width.is_none() && height.is_none() {
        return None;
    }
    let side = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
    Some(format!("{}x{}", side(width), side(height)))
}

pub fn validate_quality(quality: i64) -> Result<u32> {
    if (MIN_QUALITY as i64..=MAX_QUALITY as i64).contains(&quality) {
        Ok(quality as u32)
    } else {
        Err(ConvertError::InvalidConfig(format!(
            "quality must be between {} and {}, got {}",
            MIN_QUALITY, MAX_QUALITY, quality
        )))
    }
}

pub fn validate_format(format: &str) -> Result<()> {
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConvertError::InvalidConfig(format!(
            "output format must be a plain file extension such as \"{}\", got {:?}",
            DEFAULT_OUTPUT_FORMAT, format
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ConversionJobBuilder {
    program: OsString,
    width: Option<u32>,
    height: Option<u32>,
    quality: i64,
    format: String,
}

impl ConversionJobBuilder {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            width: None,
            height: None,
            quality: 75,
            format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }

    pub fn resize(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn quality(mut self, quality: i64) -> Self {
        self.quality = quality;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// `<source> -depth 8 [-resize WxH] -quality Q -quiet <destination>`
    pub fn build(self) -> Result<CommandTemplate> {
        let quality = validate_quality(self.quality)?;
        validate_format(&self.format)?;

        let mut args = vec![
            TemplateArg::Source,
            TemplateArg::Literal("-depth".to_string()),
            TemplateArg::Literal("8".to_string()),
        ];
        if let Some(geometry) = resize_geometry(self.width, self.height) {
            args.push(TemplateArg::Literal("-resize".to_string()));
            args.push(TemplateArg::Literal(geometry));
        }
        args.push(TemplateArg::Literal("-quality".to_string()));
        args.push(TemplateArg::Literal(quality.to_string()));
        args.push(TemplateArg::Literal("-quiet".to_string()));
        args.push(TemplateArg::Destination);

        Ok(CommandTemplate {
            program: self.program,
            args,
        })
    }
}
