//! Pipeline stages for figure extraction.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own with a small XML string or a temp directory.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ bibdata ──▶ discover ──▶ deliver
//! (path)    (naming)    (figures)    (dir / zip)
//!                          │
//!                       datauri
//! ```
//!
//! 1. [`input`]    validate the path, read and parse the XML
//! 2. [`bibdata`]  resolve document metadata for DRG naming and the prefix
//! 3. [`discover`] walk `figure` elements in document order; accept or skip
//! 4. [`datauri`]  split `data:` URIs into MIME type and base64 payload
//! 5. [`deliver`]  write into a staging directory, then move the result
//!    (directory or zip archive) into place

pub mod bibdata;
pub mod datauri;
pub mod deliver;
pub mod discover;
pub mod input;

use roxmltree::Node;

/// `node` is an element named `name` in namespace `ns`.
pub(crate) fn is_element(node: &Node<'_, '_>, name: &str, ns: Option<&str>) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == ns
}

/// All descendant text, trimmed; `None` when blank.
pub(crate) fn element_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
