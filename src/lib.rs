//! # drg-figures
//!
//! Extract embedded figures from Metanorma XML and name them according to the
//! ISO DRG graphic-file naming convention.
//!
//! Metanorma presentation XML carries figures inline, either as base64 `data:`
//! URIs or as inline SVG markup. Graphic-production workflows expect loose
//! files whose names encode the document, edition, stage and figure number,
//! e.g. `17301_dis_ed3figA1.png`. This crate bridges the two.
//!
//! ## Pipeline Overview
//!
//! ```text
//! XML
//!  │
//!  ├─ 1. Input     validate the path, read and parse
//!  ├─ 2. Bibdata   number, edition, stage → DocumentMetadata
//!  ├─ 3. Discover  figure nodes in document order → Figure | SkipReason
//!  ├─ 4. Stage     write every figure into a private temp directory
//!  └─ 5. Deliver   move into the output directory, or pack one ZIP
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drg_figures::{extract, ExtractionConfig, ExtractionOutcome};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     match extract("document.presentation.xml", None, None, &config)? {
//!         ExtractionOutcome::Extracted(report) => println!("{report}"),
//!         ExtractionOutcome::NoFigures => eprintln!("No figures found"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Naming
//!
//! When the document's bibliographic block yields a number, edition and
//! stage, figures are named with [`IsoGraphicFilename`]. Otherwise the
//! fallback `{prefix}fig{autonum}.{ext}` is used. The naming engine can also
//! be used on its own:
//!
//! ```rust
//! use drg_figures::IsoGraphicFilename;
//!
//! let name = IsoGraphicFilename {
//!     standard_number: Some(12345),
//!     part_number: Some(1),
//!     edition_number: Some(1),
//!     content_type: Some("figure".into()),
//!     figure_number: Some("1".into()),
//!     subfigure: Some("a".into()),
//!     file_extension: Some("dwg".into()),
//!     ..Default::default()
//! };
//! assert_eq!(name.generate_filename().unwrap(), "12345-1_ed1fig1a.dwg");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `drg-figures` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! drg-figures = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod figure;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractError, FilenameValidationError, SkipReason};
pub use extract::{extract, DEFAULT_PREFIX};
pub use figure::{Figure, FigureFormat};
pub use metadata::DocumentMetadata;
pub use naming::{
    normalize_figure_number, ContentType, IsoGraphicFilename, LanguageCode, StageCode,
    SupplementType, ValidatedFilename,
};
pub use output::{format_bytes, ExtractionOutcome, ExtractionReport};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
