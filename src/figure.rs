//! One extracted graphic and how it is written to disk.

use crate::metadata::DocumentMetadata;
use crate::naming::{autonum_token, normalize_figure_number, IsoGraphicFilename};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Every payload encoding the extractor understands.
///
/// `DataUri*` variants carry base64 text from a `data:` URI; `Svg` carries
/// SVG markup that was inlined in the image element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureFormat {
    DataUriPng,
    DataUriJpeg,
    DataUriGif,
    DataUriSvg,
    DataUriWebp,
    Svg,
}

impl FigureFormat {
    /// Map a data-URI MIME type to a format. Unknown or empty types are PNG.
    pub fn from_mime_type(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => FigureFormat::DataUriJpeg,
            "image/gif" => FigureFormat::DataUriGif,
            "image/svg+xml" => FigureFormat::DataUriSvg,
            "image/webp" => FigureFormat::DataUriWebp,
            _ => FigureFormat::DataUriPng,
        }
    }

    /// Display name used in per-format statistics.
    pub fn name(self) -> &'static str {
        match self {
            FigureFormat::DataUriPng => "PNG",
            FigureFormat::DataUriJpeg => "JPEG",
            FigureFormat::DataUriGif => "GIF",
            FigureFormat::DataUriSvg | FigureFormat::Svg => "SVG",
            FigureFormat::DataUriWebp => "WebP",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FigureFormat::DataUriPng => "png",
            FigureFormat::DataUriJpeg => "jpg",
            FigureFormat::DataUriGif => "gif",
            FigureFormat::DataUriSvg | FigureFormat::Svg => "svg",
            FigureFormat::DataUriWebp => "webp",
        }
    }

    /// Whether the decoded payload is binary rather than text.
    pub fn is_binary(self) -> bool {
        !matches!(self, FigureFormat::DataUriSvg | FigureFormat::Svg)
    }

    /// Whether the content is base64 from a data URI.
    pub fn is_data_uri(self) -> bool {
        !matches!(self, FigureFormat::Svg)
    }
}

/// One figure accepted for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Figure {
    autonum: String,
    content: String,
    format: FigureFormat,
    original_filename: Option<String>,
    file_size: usize,
}

impl Figure {
    pub fn new(
        autonum: impl Into<String>,
        content: impl Into<String>,
        format: FigureFormat,
        original_filename: Option<String>,
    ) -> Self {
        let mut figure = Self {
            autonum: autonum.into(),
            content: content.into(),
            format,
            original_filename: original_filename.filter(|f| !f.trim().is_empty()),
            file_size: 0,
        };
        figure.file_size = figure.decode().map(|bytes| bytes.len()).unwrap_or(0);
        figure
    }

    pub fn autonum(&self) -> &str {
        &self.autonum
    }

    /// Raw content: base64 text for data-URI formats, markup for inline SVG.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn format(&self) -> FigureFormat {
        self.format
    }

    pub fn format_name(&self) -> &'static str {
        self.format.name()
    }

    pub fn original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }

    /// Bytes that [`persist`](Self::persist) will write; zero when a data-URI
    /// payload does not decode.
    pub fn file_size(&self) -> usize {
        self.file_size
    }

    /// The bytes to write: base64-decoded for data URIs, the markup itself for
    /// inline SVG.
    ///
    /// Whitespace inside the base64 payload (line-wrapped attributes) is
    /// ignored.
    pub fn decode(&self) -> Result<Cow<'_, [u8]>, base64::DecodeError> {
        if !self.format.is_data_uri() {
            return Ok(Cow::Borrowed(self.content.as_bytes()));
        }
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact).map(Cow::Owned)
    }

    /// Filename under the DRG grammar when `metadata` is given, otherwise the
    /// prefix-based fallback.
    ///
    /// A metadata-derived description that fails validation (e.g. a
    /// non-numeric document number) also falls back.
    pub fn filename(
        &self,
        prefix: &str,
        metadata: Option<&DocumentMetadata>,
        retain_original_name: bool,
    ) -> String {
        let original = if retain_original_name {
            self.original_filename.as_deref()
        } else {
            None
        };

        if let Some(metadata) = metadata {
            let drg = IsoGraphicFilename::for_figure(
                metadata,
                &self.autonum,
                self.format.extension(),
                original,
            );
            match drg.generate_filename() {
                Ok(name) => return name,
                Err(e) => warn!(
                    "Figure {}: cannot build DRG filename ({}); using prefix naming",
                    self.autonum, e
                ),
            }
        }

        self.fallback_filename(prefix, original)
    }

    /// `{prefix}fig{autonum}[_{stem}].{ext}`; the autonum loses dots and
    /// whitespace, path separators become `-`.
    fn fallback_filename(&self, prefix: &str, original: Option<&str>) -> String {
        let autonum = normalize_figure_number(&autonum_token(&self.autonum));
        let stem = original
            .and_then(|f| Path::new(f).file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty());

        match stem {
            Some(stem) => format!("{prefix}fig{autonum}_{stem}.{}", self.format.extension()),
            None => format!("{prefix}fig{autonum}.{}", self.format.extension()),
        }
    }

    /// Write the figure into `output_dir` and return the written path.
    ///
    /// Creates `output_dir` if needed. Exactly one file is created.
    pub fn persist(
        &self,
        output_dir: &Path,
        prefix: &str,
        metadata: Option<&DocumentMetadata>,
        retain_original_name: bool,
    ) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let filename = self.filename(prefix, metadata, retain_original_name);
        let path = output_dir.join(&filename);
        let bytes = self
            .decode()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(&path, &bytes)?;
        debug!("Saved: {} ({} bytes)", filename, bytes.len());
        Ok(path)
    }
}
