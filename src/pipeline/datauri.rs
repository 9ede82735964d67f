//! `data:` URI parsing.
//!
//! Only base64 data URIs are embeddable: `data:<mime>[;param]*;base64,<payload>`.
//! A well-formed URI in any other encoding is recognised but rejected as
//! unsupported. The payload is kept as text; decoding happens in
//! [`crate::figure::Figure`].

use crate::figure::FigureFormat;

/// A parsed data URI. `payload` borrows from the source attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime_type: String,
    pub format: FigureFormat,
    pub payload: &'a str,
}

/// Why a `data:` URI cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataUriError {
    /// No `data:` scheme, no `,` separating header from payload, or a MIME
    /// type that is not `type/subtype`.
    Malformed,
    /// Well-formed, but the payload is not base64 (e.g. percent-encoded).
    NotBase64,
}

/// Parse a `data:` URI. An empty MIME type is accepted and maps to PNG.
pub fn parse_data_uri(uri: &str) -> Result<DataUri<'_>, DataUriError> {
    let rest = uri
        .trim_start()
        .strip_prefix("data:")
        .ok_or(DataUriError::Malformed)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUriError::Malformed)?;

    let mut params = header.split(';');
    let mime_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !mime_type.is_empty() && !is_valid_mime(&mime_type) {
        return Err(DataUriError::Malformed);
    }
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(DataUriError::NotBase64);
    }

    Ok(DataUri {
        format: FigureFormat::from_mime_type(&mime_type),
        mime_type,
        payload,
    })
}

/// `type/subtype`, each an RFC 6838 restricted name.
fn is_valid_mime(mime: &str) -> bool {
    let Some((kind, subtype)) = mime.split_once('/') else {
        return false;
    };
    let token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&^_.+-".contains(c))
    };
    token(kind) && token(subtype)
}
