//! Run configuration.
//!
//! `ConversionSettings` is what the front end collects; `ConversionConfig`
//! is the validated, immutable form shared by every component of a run.

use crate::error::{ConvertError, Result};
use crate::job::{CommandTemplate, ConversionJobBuilder, DEFAULT_OUTPUT_FORMAT};
use shared_utils::{check_dangerous_directory, check_not_nested, ensure_dir_exists};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// External ImageMagick executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    pub convert: OsString,
    pub identify: OsString,
}

impl ToolSet {
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self {
                convert: OsString::from("convert.exe"),
                identify: OsString::from("identify.exe"),
            }
        } else {
            Self {
                convert: OsString::from("convert"),
                identify: OsString::from("identify"),
            }
        }
    }

    pub fn with_overrides(mut self, convert: Option<PathBuf>, identify: Option<PathBuf>) -> Self {
        if let Some(convert) = convert {
            self.convert = convert.into_os_string();
        }
        if let Some(identify) = identify {
            self.identify = identify.into_os_string();
        }
        self
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Raw settings before validation. Width and height of 0 mean unset.
#[derive(Debug, Clone)]
pub struct ConversionSettings {
    pub source: PathBuf,
    pub target: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: i64,
    pub output_format: String,
    pub frame_index: Option<u32>,
    pub tools: ToolSet,
    pub jobs: usize,
}

impl ConversionSettings {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            width: 0,
            height: 0,
            quality: 75,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            frame_index: None,
            tools: ToolSet::default(),
            jobs: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub resize_width: Option<u32>,
    pub resize_height: Option<u32>,
    pub quality: u32,
    pub output_format: String,
    pub frame_index: Option<u32>,
    pub tools: ToolSet,
    pub jobs: usize,
    command_template: CommandTemplate,
}

impl ConversionConfig {
    /// Validate settings, create the target root if needed and build the
    /// command template.
    ///
    /// Only the last component of the target is created; its parent must
    /// already exist.
    pub fn new(settings: ConversionSettings) -> Result<Self> {
        let resize_width = Some(settings.width).filter(|w| *w > 0);
        let resize_height = Some(settings.height).filter(|h| *h > 0);

        let command_template = ConversionJobBuilder::new(settings.tools.convert.clone())
            .resize(resize_width, resize_height)
            .quality(settings.quality)
            .format(settings.output_format.clone())
            .build()?;

        if settings.jobs == 0 {
            return Err(ConvertError::InvalidConfig(
                "jobs must be at least 1".to_string(),
            ));
        }

        let source_root = settings.source.canonicalize().map_err(|e| {
            ConvertError::InvalidConfig(format!(
                "source directory {} is not accessible: {}",
                settings.source.display(),
                e
            ))
        })?;
        if !source_root.is_dir() {
            return Err(ConvertError::InvalidConfig(format!(
                "source {} is not a directory",
                settings.source.display()
            )));
        }

        let target_abs = absolute_target(&settings.target)?;
        check_not_nested(&source_root, &target_abs).map_err(ConvertError::InvalidConfig)?;
        check_dangerous_directory(&target_abs).map_err(ConvertError::InvalidConfig)?;

        ensure_dir_exists(&target_abs).map_err(|source| ConvertError::TargetDirectory {
            path: target_abs.clone(),
            source,
        })?;
        let target_root = target_abs
            .canonicalize()
            .map_err(|source| ConvertError::TargetDirectory {
                path: target_abs.clone(),
                source,
            })?;

        let quality = settings.quality as u32;
        info!(
            source = %source_root.display(),
            target = %target_root.display(),
            width = ?resize_width,
            height = ?resize_height,
            quality,
            format = %settings.output_format,
            frame_index = ?settings.frame_index,
            jobs = settings.jobs,
            "Conversion configured"
        );
        debug!(template = ?command_template, "Command template built");

        Ok(Self {
            source_root,
            target_root,
            resize_width,
            resize_height,
            quality,
            output_format: settings.output_format,
            frame_index: settings.frame_index,
            tools: settings.tools,
            jobs: settings.jobs,
            command_template,
        })
    }

    pub fn command_template(&self) -> &CommandTemplate {
        &self.command_template
    }
}

/// Absolute form of a target that may not exist yet.
fn absolute_target(target: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = target.canonicalize() {
        return Ok(canonical);
    }

    let invalid = || {
        ConvertError::InvalidConfig(format!(
            "target directory {} cannot be created: parent directory does not exist",
            target.display()
        ))
    };
    let name = target.file_name().ok_or_else(invalid)?;
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let parent = parent.canonicalize().map_err(|_| invalid())?;
    Ok(parent.join(name))
}
