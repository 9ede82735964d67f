//! Two-phase delivery: every figure is written into a private staging
//! directory first, and only then moved to the final location.
//!
//! A failure while staging leaves the output location untouched. The
//! staging directory is a [`TempDir`] and is removed when dropped.

use crate::error::ExtractError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const STAGING_PREFIX: &str = "drg_figures_";

/// Create a fresh staging directory under `root`, or under the system temp
/// directory when `root` is `None`.
pub fn create_staging(root: Option<&Path>) -> Result<TempDir, ExtractError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGING_PREFIX);
    let dir = match root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(|source| ExtractError::StagingFailed { source })?;

    debug!("Staging directory: {}", dir.path().display());
    Ok(dir)
}

/// Move staged files into `output_dir`, creating it if needed.
///
/// Files are moved in the given order; the returned paths follow it.
pub fn commit_to_directory(
    staged: &[PathBuf],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, ExtractError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ExtractError::OutputWriteFailed {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(staged.len());
    for from in staged {
        let Some(name) = from.file_name() else {
            continue;
        };
        let to = output_dir.join(name);
        move_file(from, &to).map_err(|source| ExtractError::OutputWriteFailed {
            path: to.clone(),
            source,
        })?;
        written.push(to);
    }

    info!(
        "Moved {} figure(s) to {}",
        written.len(),
        output_dir.display()
    );
    Ok(written)
}

/// Pack staged files into `{staging}/{archive_name}` (flat, deflated, in the
/// given order), then move the archive into `output_dir`.
///
/// Returns the final archive path.
pub fn commit_to_archive(
    staging: &Path,
    staged: &[PathBuf],
    output_dir: &Path,
    archive_name: &str,
) -> Result<PathBuf, ExtractError> {
    let staged_archive = staging.join(archive_name);
    build_archive(&staged_archive, staged).map_err(|e| ExtractError::ArchiveFailed {
        path: staged_archive.clone(),
        detail: e.to_string(),
    })?;

    std::fs::create_dir_all(output_dir).map_err(|source| ExtractError::OutputWriteFailed {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let target = output_dir.join(archive_name);
    move_file(&staged_archive, &target).map_err(|source| ExtractError::OutputWriteFailed {
        path: target.clone(),
        source,
    })?;

    info!("ZIP archive created: {}", target.display());
    Ok(target)
}

fn build_archive(path: &Path, staged: &[PathBuf]) -> zip::result::ZipResult<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for from in staged {
        let Some(name) = from.file_name() else {
            continue;
        };
        let name = name.to_string_lossy().into_owned();
        let bytes = std::fs::read(from)?;
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&bytes)?;
        debug!("Added to ZIP: {} ({} bytes)", name, bytes.len());
    }

    zip.finish()?;
    Ok(())
}

/// Rename, falling back to copy + remove when the rename crosses
/// filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn stage_files(staging: &Path, files: &[(&str, &[u8])]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, bytes)| {
                let path = staging.join(name);
                std::fs::write(&path, bytes).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn staging_dir_uses_prefix_and_root() {
        let root = tempfile::tempdir().unwrap();
        let staging = create_staging(Some(root.path())).unwrap();
        assert!(staging.path().starts_with(root.path()));
        let name = staging.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(STAGING_PREFIX));
    }

    #[test]
    fn staging_dir_is_removed_on_drop() {
        let staging = create_staging(None).unwrap();
        let path = staging.path().to_path_buf();
        assert!(path.is_dir());
        drop(staging);
        assert!(!path.exists());
    }

    #[test]
    fn missing_staging_root_fails() {
        let err = create_staging(Some(Path::new("/no/such/staging/root"))).unwrap_err();
        assert!(matches!(err, ExtractError::StagingFailed { .. }));
    }

    #[test]
    fn directory_commit_moves_files_in_order() {
        let staging = create_staging(None).unwrap();
        let staged = stage_files(staging.path(), &[("b.png", b"one"), ("a.svg", b"<svg/>")]);
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("figures");

        let written = commit_to_directory(&staged, &target).unwrap();
        assert_eq!(written, vec![target.join("b.png"), target.join("a.svg")]);
        assert_eq!(std::fs::read(&written[0]).unwrap(), b"one");
        assert!(!staged[0].exists());
    }

    #[test]
    fn archive_commit_is_flat_and_ordered() {
        let staging = create_staging(None).unwrap();
        let staged = stage_files(
            staging.path(),
            &[("x_fig2.png", b"\x89PNG"), ("x_fig1.svg", b"<svg/>")],
        );
        let out = tempfile::tempdir().unwrap();

        let archive = commit_to_archive(staging.path(), &staged, out.path(), "x_.zip").unwrap();
        assert_eq!(archive, out.path().join("x_.zip"));
        assert!(!staging.path().join("x_.zip").exists());

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 2);
        assert_eq!(zip.by_index(0).unwrap().name(), "x_fig2.png");
        let mut svg = String::new();
        zip.by_index(1).unwrap().read_to_string(&mut svg).unwrap();
        assert_eq!(svg, "<svg/>");
    }

    #[test]
    fn empty_archive_is_still_created() {
        let staging = create_staging(None).unwrap();
        let out = tempfile::tempdir().unwrap();
        let archive = commit_to_archive(staging.path(), &[], out.path(), "empty.zip").unwrap();
        let zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 0);
    }
}
