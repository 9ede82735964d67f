//! Input resolution: validate the path, read the file, parse the XML.
//!
//! The parsed [`roxmltree::Document`] borrows the text it was parsed from, so
//! reading and parsing are separate steps and the caller owns the `String`.

use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Validate that `path` names an existing, readable regular file.
pub fn validate_input(path: &Path) -> Result<PathBuf, ExtractError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }
    if !path.is_file() {
        return Err(ExtractError::NotAFile { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound { path });
        }
    }

    debug!("Resolved input XML: {}", path.display());
    Ok(path)
}

/// Read the whole document as UTF-8 text.
pub fn read_document(path: &Path) -> Result<String, ExtractError> {
    info!("Reading XML file: {}", path.display());
    std::fs::read_to_string(path).map_err(|source| ExtractError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `text` as XML. DTDs are allowed; entities are not fetched.
pub fn parse_document<'a>(
    path: &Path,
    text: &'a str,
) -> Result<roxmltree::Document<'a>, ExtractError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    roxmltree::Document::parse_with_options(text, options).map_err(|e| {
        ExtractError::MalformedXml {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = validate_input(Path::new("/definitely/not/here.xml")).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_input(dir.path()).unwrap_err();
        assert!(matches!(err, ExtractError::NotAFile { .. }));
    }

    #[test]
    fn malformed_xml_is_reported_with_path() {
        let err = parse_document(Path::new("bad.xml"), "not valid xml content").unwrap_err();
        match err {
            ExtractError::MalformedXml { path, .. } => assert_eq!(path, Path::new("bad.xml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn well_formed_xml_parses() {
        let doc = parse_document(Path::new("ok.xml"), "<root flavor=\"iso\"/>").unwrap();
        assert_eq!(doc.root_element().attribute("flavor"), Some("iso"));
    }
}
