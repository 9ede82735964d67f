//! ISO DRG graphic-file naming.
//!
//! A DRG filename encodes the document (standard number, part, edition,
//! stage, supplement), the graphic's place in it (figure, subfigure, table,
//! key, inline text graphic, special layout) and optionally its language:
//!
//! ```text
//! [SL]{standard}[-{part}]_ed{edition}...fig{number}[{subfigure}][_key{n}][_{lang}][_{original}].{ext}
//! ```
//!
//! [`IsoGraphicFilename`] is the raw description, deserialisable from any
//! key/value source. [`IsoGraphicFilename::validate`] checks every rule and
//! either returns a [`ValidatedFilename`] or a [`FilenameValidationError`]
//! listing all violations at once.

use crate::error::FilenameValidationError;
use crate::metadata::DocumentMetadata;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Defines a closed DRG code set with its wire spelling.
macro_rules! drg_code_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every member, in DRG order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            fn expected() -> String {
                Self::ALL
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

drg_code_set! {
    /// Project stage of the document.
    StageCode {
        Pwi => "pwi",
        Np => "np",
        Awi => "awi",
        Wd => "wd",
        Cd => "cd",
        Dis => "dis",
        Fdis => "fdis",
        Prf => "prf",
    }
}

drg_code_set! {
    /// Amendment or corrigendum.
    SupplementType {
        Amd => "amd",
        Cor => "cor",
    }
}

drg_code_set! {
    /// What the graphic illustrates.
    ContentType {
        Figure => "figure",
        Table => "table",
        Key => "key",
        Text => "text",
        SpecialLayout => "special_layout",
    }
}

drg_code_set! {
    /// Language of a language-specific graphic.
    LanguageCode {
        English => "e",
        French => "f",
        Russian => "r",
        Spanish => "s",
        Arabic => "a",
        German => "d",
    }
}

static RE_SUBFIGURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]$").unwrap());

/// Trailing subfigure letter of an autonum: `"C.2 a"`, `"1-b"`, `"3 c)"`.
static RE_AUTONUM_SUBFIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<figure>\S.*?)[\s\-]+(?P<subfigure>[a-z])\)?$").unwrap());

/// Remove every `.` from a figure or table number (`"A.2"` → `"A2"`).
pub fn normalize_figure_number(number: &str) -> String {
    number.replace('.', "")
}

/// Unvalidated description of one graphic file.
///
/// Enumerated fields are plain strings so that out-of-set values survive
/// until [`validate`](Self::validate) can report them. Empty strings count as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoGraphicFilename {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplement_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplement_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfigure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

/// Trimmed, non-empty view of an optional string field.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an optional enumerated field, recording a violation when the value
/// is outside its code set.
fn parse_code<T: FromStr>(
    value: &Option<String>,
    field: &str,
    expected: String,
    errors: &mut Vec<String>,
) -> Option<T> {
    let raw = present(value)?;
    match raw.parse() {
        Ok(code) => Some(code),
        Err(_) => {
            errors.push(format!("{field} must be one of: {expected}"));
            None
        }
    }
}

impl IsoGraphicFilename {
    /// Describe an extracted figure using the document's metadata.
    ///
    /// The autonum is split into figure number and subfigure letter
    /// (`"C.2 a"` → figure `C.2`, subfigure `a`). Numbers that do not parse
    /// as integers are left absent and surface later as validation errors.
    ///
    /// Extracted figures carry no part segment: the part number in
    /// `metadata` is descriptive only (`17301_dis_ed3figA1.png`).
    pub fn for_figure(
        metadata: &DocumentMetadata,
        autonum: &str,
        file_extension: &str,
        original_filename: Option<&str>,
    ) -> Self {
        let parse_int = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse().ok());
        let (figure_number, subfigure) = split_autonum(autonum);

        Self {
            standard_number: parse_int(&metadata.standard_number)
                .or_else(|| parse_int(&metadata.docnumber)),
            edition_number: parse_int(&metadata.edition),
            stage_code: metadata.drg_stage_code().map(|s| s.as_str().to_string()),
            content_type: Some(ContentType::Figure.as_str().to_string()),
            figure_number: Some(figure_number),
            subfigure,
            file_extension: Some(file_extension.to_string()),
            original_filename: original_filename.map(str::to_string),
            ..Self::default()
        }
    }

    /// Check every DRG rule, collecting all violations.
    pub fn validate(&self) -> Result<ValidatedFilename, FilenameValidationError> {
        let mut errors = Vec::new();

        if self.standard_number.is_none() {
            errors.push("standard_number is required".to_string());
        }
        if self.edition_number.is_none() {
            errors.push("edition_number is required".to_string());
        }
        if present(&self.content_type).is_none() {
            errors.push("content_type is required".to_string());
        }
        let extension = present(&self.file_extension);
        if extension.is_none() {
            errors.push("file_extension is required".to_string());
        }

        let stage_code: Option<StageCode> =
            parse_code(&self.stage_code, "stage_code", StageCode::expected(), &mut errors);
        let supplement_type: Option<SupplementType> = parse_code(
            &self.supplement_type,
            "supplement_type",
            SupplementType::expected(),
            &mut errors,
        );
        let content_type: Option<ContentType> = parse_code(
            &self.content_type,
            "content_type",
            ContentType::expected(),
            &mut errors,
        );
        let language_code: Option<LanguageCode> = parse_code(
            &self.language_code,
            "language_code",
            LanguageCode::expected(),
            &mut errors,
        );

        let has_supplement_type = present(&self.supplement_type).is_some();
        if has_supplement_type && self.supplement_number.is_none() {
            errors.push("supplement_number is required when supplement_type is specified".into());
        }
        if self.supplement_number.is_some() && !has_supplement_type {
            errors.push("supplement_type is required when supplement_number is specified".into());
        }

        let figure_number = present(&self.figure_number);
        let table_number = present(&self.table_number);
        let subfigure = present(&self.subfigure);

        match content_type {
            Some(ct @ (ContentType::Figure | ContentType::Table | ContentType::Key))
                if figure_number.is_none() =>
            {
                errors.push(format!("figure_number is required for {ct} content_type"));
            }
            Some(ContentType::Text) if self.text_number.is_none() => {
                errors.push("text_number is required for text content_type".into());
            }
            _ => {}
        }
        if content_type == Some(ContentType::Key) && self.key_number.is_none() {
            errors.push("key_number is required for key content_type".into());
        }
        if let Some(sub) = subfigure {
            if content_type != Some(ContentType::Figure) {
                errors.push("subfigure is only valid for figure content_type".into());
            }
            if !RE_SUBFIGURE.is_match(sub) {
                errors.push("subfigure must be a single lowercase letter".into());
            }
        }

        let content = content_type.and_then(|ct| match ct {
            ContentType::Figure => figure_number.map(|number| Content::Figure {
                number: number.to_string(),
                subfigure: subfigure.and_then(|s| s.chars().next()),
            }),
            ContentType::Table => table_number.or(figure_number).map(|number| Content::Table {
                number: number.to_string(),
            }),
            ContentType::Key => figure_number
                .zip(self.key_number)
                .map(|(figure, key)| Content::Key {
                    figure: figure.to_string(),
                    key,
                }),
            ContentType::Text => self.text_number.map(|number| Content::Text { number }),
            ContentType::SpecialLayout => Some(Content::SpecialLayout {
                number: table_number.or(figure_number).unwrap_or_default().to_string(),
            }),
        });

        match (self.standard_number, self.edition_number, content, extension) {
            (Some(standard_number), Some(edition_number), Some(content), Some(extension))
                if errors.is_empty() =>
            {
                Ok(ValidatedFilename {
                    standard_number,
                    part_number: self.part_number,
                    edition_number,
                    stage_code,
                    supplement: supplement_type.zip(self.supplement_number),
                    content,
                    language_code,
                    file_extension: extension.to_string(),
                    original_filename: present(&self.original_filename).map(str::to_string),
                })
            }
            _ => Err(FilenameValidationError { violations: errors }),
        }
    }

    /// Validate and render the canonical filename, extension included.
    pub fn generate_filename(&self) -> Result<String, FilenameValidationError> {
        Ok(self.validate()?.render())
    }
}

/// Split an autonum into figure number and an optional subfigure letter.
///
/// The figure number goes through [`autonum_token`] so the result is usable
/// in a filename.
fn split_autonum(autonum: &str) -> (String, Option<String>) {
    let autonum = autonum.trim();
    let (figure, subfigure) = match RE_AUTONUM_SUBFIGURE.captures(autonum) {
        Some(caps) => (
            caps["figure"].to_string(),
            Some(caps["subfigure"].to_string()),
        ),
        None => (autonum.to_string(), None),
    };
    (autonum_token(&figure), subfigure)
}

/// An autonum as a single filename component: whitespace is dropped and
/// path separators become `-` (`"2/3"` → `"2-3"`).
pub(crate) fn autonum_token(autonum: &str) -> String {
    autonum
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect()
}

/// The content-specific part of a validated description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Figure { number: String, subfigure: Option<char> },
    Table { number: String },
    Key { figure: String, key: u32 },
    Text { number: u32 },
    SpecialLayout { number: String },
}

/// A description that satisfies every DRG rule; rendering cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFilename {
    pub standard_number: u32,
    pub part_number: Option<u32>,
    pub edition_number: u32,
    pub stage_code: Option<StageCode>,
    pub supplement: Option<(SupplementType, u32)>,
    pub content: Content,
    pub language_code: Option<LanguageCode>,
    pub file_extension: String,
    pub original_filename: Option<String>,
}

impl ValidatedFilename {
    pub fn render(&self) -> String {
        let mut name = self.document_portion();
        name.push_str(&self.content_portion());
        if let Some(lang) = self.language_code {
            name.push('_');
            name.push_str(lang.as_str());
        }
        if let Some(stem) = self
            .original_filename
            .as_deref()
            .and_then(|f| Path::new(f).file_stem())
            .map(|s| s.to_string_lossy())
            .filter(|s| !s.is_empty())
        {
            name.push('_');
            name.push_str(&stem);
        }
        format!("{name}.{}", self.file_extension)
    }

    fn document_portion(&self) -> String {
        let sl = if matches!(self.content, Content::SpecialLayout { .. }) {
            "SL"
        } else {
            ""
        };
        let mut doc = format!("{sl}{}", self.standard_number);
        if let Some(part) = self.part_number {
            doc.push_str(&format!("-{part}"));
        }

        match (self.supplement, self.stage_code) {
            // {standard}-{part}_ed{edition}{supplement}{n}[_{stage}]
            (Some((kind, number)), stage) => {
                doc.push_str(&format!("_ed{}{kind}{number}", self.edition_number));
                if let Some(stage) = stage {
                    doc.push_str(&format!("_{stage}"));
                }
            }
            (None, Some(stage)) => doc.push_str(&format!("_{stage}_ed{}", self.edition_number)),
            (None, None) => doc.push_str(&format!("_ed{}", self.edition_number)),
        }
        doc
    }

    fn content_portion(&self) -> String {
        match &self.content {
            Content::Figure { number, subfigure } => {
                let mut s = format!("fig{}", normalize_figure_number(number));
                if let Some(letter) = subfigure {
                    s.push(*letter);
                }
                s
            }
            Content::Table { number } | Content::SpecialLayout { number } => {
                format!("figTab{}", normalize_figure_number(number))
            }
            Content::Key { figure, key } => {
                format!("fig{}_key{key}", normalize_figure_number(figure))
            }
            Content::Text { number } => format!("figText{number}"),
        }
    }
}
