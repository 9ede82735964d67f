//! Bibliographic facts scraped from the document header.

use crate::naming::StageCode;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_flavor() -> String {
    "iso".to_string()
}

/// Document identity used for prefixes, summaries and DRG names.
///
/// Every field except `flavor` may be absent; rendering never fails, missing
/// values simply become empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub docnumber: Option<String>,
    /// Human-readable stage name, e.g. "Draft International Standard".
    pub stage: Option<String>,
    pub substage: Option<String>,
    pub docidentifier: Option<String>,
    pub standard_number: Option<String>,
    pub part_number: Option<String>,
    pub edition: Option<String>,
    /// Harmonized stage code, e.g. "40.00".
    pub stage_code: Option<String>,
    /// Stage abbreviation, e.g. "DIS".
    pub stage_abbreviation: Option<String>,
    #[serde(default = "default_flavor")]
    pub flavor: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: None,
            docnumber: None,
            stage: None,
            substage: None,
            docidentifier: None,
            standard_number: None,
            part_number: None,
            edition: None,
            stage_code: None,
            stage_abbreviation: None,
            flavor: default_flavor(),
        }
    }
}

impl DocumentMetadata {
    /// Metadata for the given flavor. An empty flavor falls back to `"iso"`.
    pub fn with_flavor(flavor: impl Into<String>) -> Self {
        let flavor = flavor.into();
        Self {
            flavor: if flavor.trim().is_empty() {
                default_flavor()
            } else {
                flavor
            },
            ..Self::default()
        }
    }

    /// Default output prefix derived from the document identity.
    ///
    /// `iso` documents render `{number}_{abbr}_ed{edition}`; any other flavor
    /// is prepended, e.g. `iec_62304_dis_ed1`.
    pub fn auto_prefix(&self) -> String {
        let number = self.standard_number.as_deref().unwrap_or_default();
        let abbreviation = self
            .stage_abbreviation
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        let edition = self.edition.as_deref().unwrap_or_default();

        if self.flavor == "iso" {
            format!("{number}_{abbreviation}_ed{edition}")
        } else {
            format!("{}_{number}_{abbreviation}_ed{edition}", self.flavor)
        }
    }

    /// The stage abbreviation as a DRG stage code, if it is one.
    ///
    /// Published stages (e.g. "IS") have no DRG code and yield `None`.
    pub fn drg_stage_code(&self) -> Option<StageCode> {
        self.stage_abbreviation
            .as_deref()
            .and_then(|abbr| abbr.trim().to_lowercase().parse().ok())
    }
}

impl fmt::Display for DocumentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(id), Some(title)) = (&self.docidentifier, &self.title) {
            return write!(f, "{id} - {title}");
        }
        write!(
            f,
            "ISO {} Edition {} Stage {} ({})",
            self.standard_number.as_deref().unwrap_or_default(),
            self.edition.as_deref().unwrap_or_default(),
            self.stage_code.as_deref().unwrap_or_default(),
            self.stage_abbreviation.as_deref().unwrap_or_default(),
        )
    }
}
