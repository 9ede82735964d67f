//! Configuration types for figure extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The output location and prefix are
//! per-run arguments of [`crate::extract()`], not configuration.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use drg_figures::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .archive(true)
///     .retain_original_filenames(true)
///     .build()
///     .unwrap();
/// assert!(config.auto_prefix);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Deliver one `{prefix}.zip` instead of loose files. Default: false.
    pub archive: bool,

    /// Log skipped figures at `warn` instead of `debug`. Default: false.
    pub verbose: bool,

    /// Derive the prefix from document metadata when no explicit prefix is
    /// given. Default: true.
    ///
    /// With this off, the prefix is `"figure"` unless one is passed in.
    pub auto_prefix: bool,

    /// Append the image's original file stem to every generated name.
    /// Default: false.
    pub retain_original_filenames: bool,

    /// Parent directory for the temporary staging directory. Default: None
    /// (system temp directory).
    ///
    /// Put this on the same filesystem as the output to make the final move a
    /// rename.
    pub staging_root: Option<PathBuf>,

    /// Optional per-figure progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            archive: false,
            verbose: false,
            auto_prefix: true,
            retain_original_filenames: false,
            staging_root: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("archive", &self.archive)
            .field("verbose", &self.verbose)
            .field("auto_prefix", &self.auto_prefix)
            .field("retain_original_filenames", &self.retain_original_filenames)
            .field("staging_root", &self.staging_root)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check the configuration and an explicit prefix, if any.
    ///
    /// Runs once at the start of [`crate::extract()`].
    pub fn validate(&self, prefix: Option<&str>) -> Result<(), ExtractError> {
        if let Some(root) = &self.staging_root {
            if !root.is_dir() {
                return Err(ExtractError::InvalidConfig(format!(
                    "staging root '{}' is not an existing directory",
                    root.display()
                )));
            }
        }
        if let Some(prefix) = prefix {
            validate_prefix(prefix)?;
        }
        Ok(())
    }
}

/// A prefix becomes part of a filename, so it must not escape the output
/// directory.
fn validate_prefix(prefix: &str) -> Result<(), ExtractError> {
    if prefix.contains(['/', '\\']) || Path::new(prefix).components().count() > 1 {
        return Err(ExtractError::InvalidConfig(format!(
            "prefix '{prefix}' must not contain path separators"
        )));
    }
    if prefix == "." || prefix == ".." {
        return Err(ExtractError::InvalidConfig(format!(
            "prefix '{prefix}' is not a valid filename prefix"
        )));
    }
    Ok(())
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn archive(mut self, v: bool) -> Self {
        self.config.archive = v;
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.config.verbose = v;
        self
    }

    pub fn auto_prefix(mut self, v: bool) -> Self {
        self.config.auto_prefix = v;
        self
    }

    pub fn retain_original_filenames(mut self, v: bool) -> Self {
        self.config.retain_original_filenames = v;
        self
    }

    pub fn staging_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_root = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        self.config.validate(None)?;
        Ok(self.config)
    }
}
