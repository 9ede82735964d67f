//! Result types returned by [`crate::extract()`].

use crate::error::SkipReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

const RULE_WIDTH: usize = 60;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// Figures were found and delivered.
    Extracted(ExtractionReport),
    /// The document has no figure elements. Nothing was written.
    NoFigures,
}

impl ExtractionOutcome {
    pub fn report(&self) -> Option<&ExtractionReport> {
        match self {
            ExtractionOutcome::Extracted(report) => Some(report),
            ExtractionOutcome::NoFigures => None,
        }
    }

    pub fn into_report(self) -> Option<ExtractionReport> {
        match self {
            ExtractionOutcome::Extracted(report) => Some(report),
            ExtractionOutcome::NoFigures => None,
        }
    }
}

/// Summary of one extraction run.
///
/// `Display` renders the human-readable summary block printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Description of the source document, when metadata was found.
    pub document: Option<String>,

    /// Prefix used for fallback names and the archive name.
    pub prefix: String,

    /// Metadata-derived prefix, reported when auto-prefix is enabled.
    pub auto_prefix: Option<String>,

    /// Figure nodes found in the document, accepted or not.
    pub figures_found: usize,

    /// Figures delivered.
    pub total_figures: usize,

    /// Delivered figures per format name (`"PNG"`, `"SVG"`, ...).
    pub format_counts: BTreeMap<String, usize>,

    /// Sum of written payload sizes in bytes.
    pub total_size: u64,

    /// Output directory (directory mode) or the directory holding the
    /// archive.
    pub output_dir: PathBuf,

    /// Final archive path in archive mode.
    pub archive: Option<PathBuf>,

    /// Final paths of the delivered figure files. Empty in archive mode.
    pub files: Vec<PathBuf>,

    /// Names of the delivered figures, in document order.
    pub filenames: Vec<String>,

    /// Figures that were left out, in document order.
    pub skipped: Vec<SkipReason>,

    pub metadata_found: bool,

    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

impl ExtractionReport {
    /// [`total_size`](Self::total_size) as a human-readable string.
    pub fn formatted_size(&self) -> String {
        format_bytes(self.total_size)
    }

    /// Where the figures ended up: the archive path, else the directory.
    pub fn output_location(&self) -> &PathBuf {
        self.archive.as_ref().unwrap_or(&self.output_dir)
    }

    fn svg_count(&self) -> usize {
        self.format_counts.get("SVG").copied().unwrap_or(0)
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "EXTRACTION SUMMARY")?;
        writeln!(f, "{rule}")?;

        if let Some(document) = &self.document {
            writeln!(f, "Document: {document}")?;
        }
        if let Some(auto_prefix) = &self.auto_prefix {
            writeln!(f, "Auto-generated prefix: {auto_prefix}")?;
        }
        writeln!(f, "File prefix used: {}", self.prefix)?;
        writeln!(f, "Total figures extracted: {}", self.total_figures)?;
        for (format, count) in &self.format_counts {
            writeln!(f, "{format} files: {count}")?;
        }
        if !self.skipped.is_empty() {
            writeln!(f, "Figures skipped: {}", self.skipped.len())?;
        }
        writeln!(f, "Total size: {}", self.formatted_size())?;
        writeln!(f, "Output directory: {}", self.output_dir.display())?;
        writeln!(
            f,
            "ZIP archive: {}",
            if self.archive.is_some() { "Created" } else { "Not requested" }
        )?;

        writeln!(f)?;
        writeln!(f, "ISO DRG COMPLIANCE:")?;
        writeln!(
            f,
            "✓ Revisable vector graphics (SVG): {}",
            yes_no(self.svg_count() > 0)
        )?;
        writeln!(f, "✓ Proper file naming convention: Yes")?;
        writeln!(f, "✓ Language-neutral graphics: Yes (extracted from Metanorma)")?;
        writeln!(
            f,
            "✓ Document metadata extraction: {}",
            yes_no(self.metadata_found)
        )?;
        write!(f, "{rule}")
    }
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "Yes"
    } else {
        "No"
    }
}

/// Render a byte count with 1024-based units and two decimals.
///
/// ```rust
/// use drg_figures::format_bytes;
///
/// assert_eq!(format_bytes(512), "512.00 B");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ExtractionReport {
        ExtractionReport {
            document: Some("ISO/DIS 17301-1:2023 - Cereals and pulses".into()),
            prefix: "17301_dis_ed3".into(),
            auto_prefix: Some("17301_dis_ed3".into()),
            figures_found: 7,
            total_figures: 6,
            format_counts: BTreeMap::from([("PNG".into(), 5), ("SVG".into(), 1)]),
            total_size: 1536,
            output_dir: PathBuf::from("17301_dis_ed3"),
            archive: None,
            files: Vec::new(),
            filenames: Vec::new(),
            skipped: vec![SkipReason::MissingAutonum { index: 4 }],
            metadata_found: true,
            duration_ms: 3,
        }
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
        assert_eq!(format_bytes(2048 * 1024 * 1024 * 1024), "2048.00 GB");
    }

    #[test]
    fn summary_block() {
        let text = report().to_string();
        let rule = "=".repeat(60);
        assert!(text.starts_with(&format!("{rule}\nEXTRACTION SUMMARY\n{rule}\n")));
        assert!(text.ends_with(&rule));
        assert!(text.contains("Document: ISO/DIS 17301-1:2023 - Cereals and pulses"));
        assert!(text.contains("File prefix used: 17301_dis_ed3"));
        assert!(text.contains("Total figures extracted: 6"));
        assert!(text.contains("PNG files: 5\nSVG files: 1"));
        assert!(text.contains("Figures skipped: 1"));
        assert!(text.contains("Total size: 1.50 KB"));
        assert!(text.contains("ZIP archive: Not requested"));
        assert!(text.contains("✓ Revisable vector graphics (SVG): Yes"));
        assert!(text.contains("✓ Document metadata extraction: Yes"));
    }

    #[test]
    fn summary_without_metadata_or_svg() {
        let r = ExtractionReport {
            document: None,
            auto_prefix: None,
            metadata_found: false,
            format_counts: BTreeMap::from([("PNG".into(), 1)]),
            archive: Some(PathBuf::from("figure.zip")),
            skipped: Vec::new(),
            ..report()
        };
        let text = r.to_string();
        assert!(!text.contains("Document:"));
        assert!(!text.contains("Auto-generated prefix"));
        assert!(!text.contains("Figures skipped"));
        assert!(text.contains("ZIP archive: Created"));
        assert!(text.contains("✓ Revisable vector graphics (SVG): No"));
        assert!(text.contains("✓ Document metadata extraction: No"));
        assert_eq!(r.output_location(), &PathBuf::from("figure.zip"));
    }

    #[test]
    fn outcome_serialises_with_tag() {
        let json = serde_json::to_value(ExtractionOutcome::NoFigures).unwrap();
        assert_eq!(json["outcome"], "no_figures");

        let json = serde_json::to_value(ExtractionOutcome::Extracted(report())).unwrap();
        assert_eq!(json["outcome"], "extracted");
        assert_eq!(json["total_figures"], 6);
        assert_eq!(json["format_counts"]["PNG"], 5);
    }
}
