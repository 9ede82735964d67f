//! Error types for the drg-figures library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`ExtractError`]: **Fatal**, the run cannot proceed at all (missing
//!   input file, malformed XML, the output could not be delivered). Returned
//!   as `Err(ExtractError)` from [`crate::extract()`].
//!
//! * [`SkipReason`]: **Non-fatal**, a single figure could not be extracted
//!   (no `autonum`, broken data URI, external reference) but every other
//!   figure is fine. Recorded in [`crate::output::ExtractionReport::skipped`]
//!   so callers can see exactly what was left out.
//!
//! * [`FilenameValidationError`]: the naming engine was handed a description
//!   that violates one or more DRG rules. Every violated rule is listed, not
//!   just the first.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the drg-figures library.
///
/// Figure-level failures use [`SkipReason`] and never abort a run.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file '{path}' does not exist.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but is a directory or other non-regular file.
    #[error("Input '{path}' is not a regular file")]
    NotAFile { path: PathBuf },

    /// The file could not be read (I/O failure or invalid UTF-8).
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not well-formed XML.
    #[error("Error processing file '{path}': {detail}")]
    MalformedXml { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or entry-point validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Delivery errors ───────────────────────────────────────────────────
    /// The temporary staging directory could not be created.
    #[error("Failed to create staging directory: {source}")]
    StagingFailed {
        #[source]
        source: std::io::Error,
    },

    /// A figure could not be written into the staging directory.
    #[error("Failed to write figure {autonum} to '{path}': {source}")]
    FigureWriteFailed {
        autonum: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A staged file could not be moved into the final output location.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ZIP archive could not be assembled.
    #[error("Failed to create ZIP archive '{path}': {detail}")]
    ArchiveFailed { path: PathBuf, detail: String },
}

impl ExtractError {
    /// `true` for errors caused by the input document rather than by
    /// configuration or the output filesystem.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExtractError::FileNotFound { .. }
                | ExtractError::PermissionDenied { .. }
                | ExtractError::NotAFile { .. }
                | ExtractError::ReadFailed { .. }
                | ExtractError::MalformedXml { .. }
        )
    }
}

/// Why a single figure was left out of the output.
///
/// `index` is the 1-based position of the figure node in document order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SkipReason {
    /// The figure carries no (or a blank) `autonum` attribute.
    #[error("Skipping figure {index} - missing autonum")]
    MissingAutonum { index: usize },

    /// The figure has no `image` element of its own.
    #[error("Skipping figure {index} (autonum: {autonum}) - no image element")]
    MissingImage { index: usize, autonum: String },

    /// The `src` starts with `data:` but has no payload separator or an
    /// unusable header.
    #[error("Skipping figure {autonum} - malformed data URI")]
    MalformedDataUri { index: usize, autonum: String },

    /// A well-formed data URI whose payload is not base64.
    #[error("Skipping figure {autonum} - unsupported data URI encoding (only base64 is embeddable)")]
    UnsupportedEncoding { index: usize, autonum: String },

    /// The data URI payload is not valid base64.
    #[error("Skipping figure {autonum} - invalid data URI payload: {detail}")]
    InvalidPayload {
        index: usize,
        autonum: String,
        detail: String,
    },

    /// An inline SVG image with no markup inside it.
    #[error("Skipping figure {autonum} - empty SVG content")]
    EmptySvg { index: usize, autonum: String },

    /// The image points at an external file, which cannot be embedded.
    #[error("Skipping figure {autonum} - external file not supported: {file}")]
    ExternalReference {
        index: usize,
        autonum: String,
        file: String,
    },

    /// Neither a usable `src` nor a recognised MIME type was found.
    #[error("Skipping figure {autonum} - no valid source or mimetype found")]
    NoSource { index: usize, autonum: String },
}

impl SkipReason {
    /// 1-based position of the skipped figure node.
    pub fn index(&self) -> usize {
        match self {
            SkipReason::MissingAutonum { index }
            | SkipReason::MissingImage { index, .. }
            | SkipReason::MalformedDataUri { index, .. }
            | SkipReason::UnsupportedEncoding { index, .. }
            | SkipReason::InvalidPayload { index, .. }
            | SkipReason::EmptySvg { index, .. }
            | SkipReason::ExternalReference { index, .. }
            | SkipReason::NoSource { index, .. } => *index,
        }
    }
}

/// Every DRG rule violated by a filename description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation errors: {}", .violations.join("; "))]
pub struct FilenameValidationError {
    pub violations: Vec<String>,
}

impl FilenameValidationError {
    /// `true` if any violation message mentions `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.contains(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = ExtractError::FileNotFound {
            path: PathBuf::from("missing.xml"),
        };
        assert!(e.to_string().contains("missing.xml"));
        assert!(e.is_input_error());
    }

    #[test]
    fn config_error_is_not_input_error() {
        let e = ExtractError::InvalidConfig("bad prefix".into());
        assert!(!e.is_input_error());
        assert!(e.to_string().contains("bad prefix"));
    }

    #[test]
    fn skip_reason_display_names_autonum() {
        let skip = SkipReason::ExternalReference {
            index: 3,
            autonum: "A.1".into(),
            file: "diagram.png".into(),
        };
        let msg = skip.to_string();
        assert!(msg.contains("A.1"), "got: {msg}");
        assert!(msg.contains("diagram.png"), "got: {msg}");
        assert_eq!(skip.index(), 3);
    }

    #[test]
    fn validation_error_joins_all_violations() {
        let e = FilenameValidationError {
            violations: vec![
                "standard_number is required".into(),
                "edition_number is required".into(),
            ],
        };
        assert_eq!(
            e.to_string(),
            "Validation errors: standard_number is required; edition_number is required"
        );
        assert!(e.mentions("edition_number"));
        assert!(!e.mentions("stage_code"));
    }
}
