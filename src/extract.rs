//! The extraction entry point.
//!
//! One call runs the whole pipeline: validate and parse the input, resolve
//! metadata, process every figure node in document order, stage the
//! accepted figures, then deliver them as loose files or one archive.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::figure::Figure;
use crate::metadata::DocumentMetadata;
use crate::output::{ExtractionOutcome, ExtractionReport};
use crate::pipeline::discover::{self, FigureOutcome};
use crate::pipeline::{bibdata, deliver, input};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Prefix used when none is given and none can be derived.
pub const DEFAULT_PREFIX: &str = "figure";

/// Extract every embedded figure from a Metanorma XML document.
///
/// # Arguments
/// * `input`  - path to the XML document
/// * `output` - output directory; defaults to the current directory in
///   archive mode and to a directory named after the prefix otherwise
/// * `prefix` - filename prefix; blank counts as absent
/// * `config` - run options
///
/// # Returns
/// [`ExtractionOutcome::NoFigures`] when the document has no figure
/// elements (nothing is written), otherwise a report of what was delivered.
/// Individual figures that cannot be extracted are listed in
/// [`ExtractionReport::skipped`] and do not fail the run.
///
/// # Errors
/// Fatal problems only: a missing, unreadable or malformed input, an invalid
/// configuration, or a failure to write the output.
pub fn extract(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    prefix: Option<&str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutcome, ExtractError> {
    let start = Instant::now();
    let explicit_prefix = prefix.map(str::trim).filter(|p| !p.is_empty());
    config.validate(explicit_prefix)?;

    // ── Step 1: Validate and parse input ─────────────────────────────────
    let path = input::validate_input(input.as_ref())?;
    let text = input::read_document(&path)?;
    let doc = input::parse_document(&path, &text)?;

    // ── Step 2: Resolve metadata ─────────────────────────────────────────
    let metadata = bibdata::resolve_metadata(&doc);

    // ── Step 3: Discover figures ─────────────────────────────────────────
    let nodes = discover::find_figures(&doc);
    info!("Found {} figures", nodes.len());
    if nodes.is_empty() {
        info!("No figures found in the document");
        return Ok(ExtractionOutcome::NoFigures);
    }

    let callback = config.progress_callback.as_ref();
    if let Some(cb) = callback {
        cb.on_extraction_start(nodes.len());
    }

    // ── Step 4: Process figures ──────────────────────────────────────────
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let index = i + 1;
        match discover::process_figure(*node, index, &text) {
            FigureOutcome::Accepted(figure) => {
                if let Some(cb) = callback {
                    cb.on_figure_accepted(index, figure.autonum(), figure.format_name());
                }
                accepted.push(figure);
            }
            FigureOutcome::Skipped(reason) => {
                if config.verbose {
                    warn!("{}", reason);
                } else {
                    debug!("{}", reason);
                }
                if let Some(cb) = callback {
                    cb.on_figure_skipped(&reason);
                }
                skipped.push(reason);
            }
        }
    }

    // ── Step 5: Prefix and output location ───────────────────────────────
    let auto_prefix = metadata
        .as_ref()
        .filter(|_| config.auto_prefix)
        .map(DocumentMetadata::auto_prefix);
    let prefix = resolve_prefix(explicit_prefix, auto_prefix.as_deref());
    let output_dir = resolve_output_dir(output, &prefix, config.archive)?;

    // ── Step 6: Stage ────────────────────────────────────────────────────
    let staging = deliver::create_staging(config.staging_root.as_deref())?;
    info!(
        "Extracting {} figures to temporary directory: {}",
        accepted.len(),
        staging.path().display()
    );
    let staged = stage_figures(&accepted, staging.path(), &prefix, metadata.as_ref(), config)?;

    // ── Step 7: Deliver ──────────────────────────────────────────────────
    let staged_paths: Vec<PathBuf> = staged.iter().map(|s| s.path.clone()).collect();
    let (files, archive) = if config.archive {
        let archive_name = format!("{prefix}.zip");
        info!("Creating ZIP archive: {}", archive_name);
        let archive =
            deliver::commit_to_archive(staging.path(), &staged_paths, &output_dir, &archive_name)?;
        (Vec::new(), Some(archive))
    } else {
        info!("Moving files to final destination: {}", output_dir.display());
        (deliver::commit_to_directory(&staged_paths, &output_dir)?, None)
    };
    drop(staging);

    // ── Step 8: Report ───────────────────────────────────────────────────
    let mut format_counts = BTreeMap::new();
    for s in &staged {
        *format_counts.entry(s.format_name.to_string()).or_insert(0) += 1;
    }
    let report = ExtractionReport {
        document: metadata.as_ref().map(ToString::to_string),
        prefix,
        auto_prefix,
        figures_found: nodes.len(),
        total_figures: staged.len(),
        format_counts,
        total_size: staged.iter().map(|s| s.bytes).sum(),
        output_dir,
        archive,
        files,
        filenames: staged.into_iter().map(|s| s.filename).collect(),
        skipped,
        metadata_found: metadata.is_some(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    if let Some(cb) = callback {
        cb.on_extraction_complete(report.figures_found, report.total_figures);
    }
    info!(
        "Successfully extracted {} figures to {}",
        report.total_figures,
        report.output_location().display()
    );
    Ok(ExtractionOutcome::Extracted(report))
}

/// Explicit prefix, else the metadata-derived one, else [`DEFAULT_PREFIX`].
fn resolve_prefix(explicit: Option<&str>, auto_prefix: Option<&str>) -> String {
    if let Some(prefix) = explicit {
        return prefix.to_string();
    }
    if let Some(prefix) = auto_prefix.filter(|p| !p.is_empty()) {
        info!("Auto-generated prefix: {}", prefix);
        return prefix.to_string();
    }
    info!("Using default prefix: {}", DEFAULT_PREFIX);
    DEFAULT_PREFIX.to_string()
}

fn resolve_output_dir(
    output: Option<&Path>,
    prefix: &str,
    archive: bool,
) -> Result<PathBuf, ExtractError> {
    if let Some(dir) = output.filter(|d| !d.as_os_str().is_empty()) {
        return Ok(dir.to_path_buf());
    }
    if archive {
        let cwd = std::env::current_dir().map_err(|source| ExtractError::OutputWriteFailed {
            path: PathBuf::from("."),
            source,
        })?;
        info!("Using current directory for ZIP output: {}", cwd.display());
        Ok(cwd)
    } else {
        info!("Using auto-generated output directory: {}", prefix);
        Ok(PathBuf::from(prefix))
    }
}

struct StagedFigure {
    path: PathBuf,
    filename: String,
    format_name: &'static str,
    bytes: u64,
}

/// Write every figure into the staging directory.
///
/// Two figures mapping to the same name leave only the later one.
fn stage_figures(
    figures: &[Figure],
    staging: &Path,
    prefix: &str,
    metadata: Option<&DocumentMetadata>,
    config: &ExtractionConfig,
) -> Result<Vec<StagedFigure>, ExtractError> {
    let mut staged: Vec<StagedFigure> = Vec::with_capacity(figures.len());

    for figure in figures {
        let path = figure
            .persist(staging, prefix, metadata, config.retain_original_filenames)
            .map_err(|source| ExtractError::FigureWriteFailed {
                autonum: figure.autonum().to_string(),
                path: staging.to_path_buf(),
                source,
            })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(pos) = staged.iter().position(|s| s.filename == filename) {
            warn!(
                "Figure {}: filename {} is already used; the earlier figure is replaced",
                figure.autonum(),
                filename
            );
            staged.remove(pos);
        }

        if let Some(cb) = &config.progress_callback {
            cb.on_figure_written(figure.autonum(), &filename, figure.file_size());
        }
        staged.push(StagedFigure {
            path,
            filename,
            format_name: figure.format_name(),
            bytes: figure.file_size() as u64,
        });
    }

    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_precedence() {
        assert_eq!(resolve_prefix(Some("mine_"), Some("17301_dis_ed3")), "mine_");
        assert_eq!(resolve_prefix(None, Some("17301_dis_ed3")), "17301_dis_ed3");
        assert_eq!(resolve_prefix(None, Some("")), DEFAULT_PREFIX);
        assert_eq!(resolve_prefix(None, None), DEFAULT_PREFIX);
    }

    #[test]
    fn output_dir_defaults() {
        let explicit = Path::new("out/figs");
        assert_eq!(resolve_output_dir(Some(explicit), "p", false).unwrap(), explicit);
        assert_eq!(resolve_output_dir(None, "p", false).unwrap(), PathBuf::from("p"));
        assert_eq!(
            resolve_output_dir(Some(Path::new("")), "p", false).unwrap(),
            PathBuf::from("p")
        );
        assert_eq!(
            resolve_output_dir(None, "p", true).unwrap(),
            std::env::current_dir().unwrap()
        );
    }
}
