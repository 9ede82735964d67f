//! Metadata resolution from the `bibdata` block.
//!
//! A typical block looks like:
//!
//! ```xml
//! <bibdata>
//!   <title type="main" language="en">Cereals and pulses</title>
//!   <docidentifier primary="true">ISO/DIS 17301-1:2023</docidentifier>
//!   <docnumber>17301</docnumber>
//!   <edition language="">3</edition>
//!   <status>
//!     <stage language="" abbreviation="DIS">40</stage>
//!     <stage language="en">Draft International Standard</stage>
//!     <substage language="">00</substage>
//!   </status>
//! </bibdata>
//! ```
//!
//! Language-neutral values carry `language=""`. Values without a `language`
//! attribute are accepted when no explicitly neutral one exists.

use super::{element_text, is_element};
use crate::metadata::DocumentMetadata;
use roxmltree::{Document, Node};
use tracing::{debug, info};

/// Build [`DocumentMetadata`] from the document, or `None` when the number,
/// edition, stage or stage abbreviation cannot be found.
pub fn resolve_metadata(doc: &Document<'_>) -> Option<DocumentMetadata> {
    let root = doc.root_element();
    let ns = root.tag_name().namespace();
    let flavor = root
        .attribute("flavor")
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or("iso");

    let Some(bibdata) = root.descendants().find(|n| is_element(n, "bibdata", ns)) else {
        info!("No bibdata found; figure names will use the prefix scheme");
        return None;
    };

    let docnumber = first_text(bibdata, "docnumber", ns);
    let edition = language_neutral(bibdata, "edition", ns).and_then(element_text);
    let status = bibdata.descendants().find(|n| is_element(n, "status", ns));
    let stage = status.and_then(|s| language_neutral(s, "stage", ns));
    let stage_value = stage.and_then(element_text);
    let abbreviation = stage
        .and_then(|s| s.attribute("abbreviation"))
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);
    let substage = status
        .and_then(|s| language_neutral(s, "substage", ns))
        .and_then(element_text);

    let (Some(number), Some(edition), Some(stage_value), Some(abbreviation)) =
        (docnumber, edition, stage_value, abbreviation)
    else {
        info!("Incomplete bibdata (number, edition or stage missing); figure names will use the prefix scheme");
        return None;
    };

    let stage_code = match &substage {
        Some(sub) => format!("{stage_value}.{sub}"),
        None => stage_value,
    };

    let metadata = DocumentMetadata {
        title: main_title(bibdata, ns),
        docnumber: Some(number.clone()),
        stage: status.and_then(|s| stage_name(s, ns)),
        substage,
        docidentifier: primary_identifier(bibdata, ns),
        standard_number: Some(number),
        part_number: part_number(bibdata, ns),
        edition: Some(edition),
        stage_code: Some(stage_code),
        stage_abbreviation: Some(abbreviation),
        ..DocumentMetadata::with_flavor(flavor)
    };
    debug!("Resolved metadata: {:?}", metadata);
    Some(metadata)
}

fn first_text(scope: Node<'_, '_>, name: &str, ns: Option<&str>) -> Option<String> {
    scope
        .descendants()
        .find(|n| is_element(n, name, ns))
        .and_then(element_text)
}

/// First `name` element with `language=""`, else the first without a
/// `language` attribute.
fn language_neutral<'a, 'i>(
    scope: Node<'a, 'i>,
    name: &str,
    ns: Option<&str>,
) -> Option<Node<'a, 'i>> {
    let all: Vec<_> = scope
        .descendants()
        .filter(|n| is_element(n, name, ns))
        .collect();
    all.iter()
        .find(|n| n.attribute("language") == Some(""))
        .or_else(|| all.iter().find(|n| n.attribute("language").is_none()))
        .copied()
}

fn main_title(bibdata: Node<'_, '_>, ns: Option<&str>) -> Option<String> {
    let language = first_text(bibdata, "language", ns);
    let titles: Vec<_> = bibdata
        .children()
        .filter(|n| is_element(n, "title", ns))
        .collect();
    let is_main = |n: &&Node| n.attribute("type") == Some("main");

    titles
        .iter()
        .filter(is_main)
        .find(|n| language.is_some() && n.attribute("language") == language.as_deref())
        .or_else(|| titles.iter().find(is_main))
        .or_else(|| titles.first())
        .and_then(|n| element_text(*n))
}

fn primary_identifier(bibdata: Node<'_, '_>, ns: Option<&str>) -> Option<String> {
    let identifiers: Vec<_> = bibdata
        .children()
        .filter(|n| is_element(n, "docidentifier", ns))
        .collect();
    identifiers
        .iter()
        .find(|n| n.attribute("primary") == Some("true"))
        .or_else(|| identifiers.first())
        .and_then(|n| element_text(*n))
}

fn part_number(bibdata: Node<'_, '_>, ns: Option<&str>) -> Option<String> {
    first_text(bibdata, "partnumber", ns).or_else(|| {
        bibdata
            .descendants()
            .filter(|n| is_element(n, "project-number", ns))
            .find_map(|n| n.attribute("part"))
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    })
}

fn stage_name(status: Node<'_, '_>, ns: Option<&str>) -> Option<String> {
    status
        .descendants()
        .filter(|n| is_element(n, "stage", ns))
        .find(|n| n.attribute("language").is_some_and(|l| !l.is_empty()))
        .and_then(element_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "https://www.metanorma.org/ns/standoc";

    fn resolve(xml: &str) -> Option<DocumentMetadata> {
        let doc = Document::parse(xml).unwrap();
        resolve_metadata(&doc)
    }

    fn document(flavor: Option<&str>, bibdata: &str) -> String {
        let flavor = flavor.map(|f| format!(" flavor=\"{f}\"")).unwrap_or_default();
        format!(r#"<metanorma xmlns="{NS}"{flavor}>{bibdata}<sections/></metanorma>"#)
    }

    const FULL_BIBDATA: &str = r#"<bibdata type="standard">
        <title language="fr" type="main">Céréales et légumineuses</title>
        <title language="en" type="main">Cereals and pulses</title>
        <title language="en" type="title-part">Rice</title>
        <docidentifier type="ISO-reference">ISO/DIS 17301-1:2023(E)</docidentifier>
        <docidentifier type="ISO" primary="true">ISO/DIS 17301-1:2023</docidentifier>
        <docnumber>17301</docnumber>
        <language>en</language>
        <edition language="">3</edition>
        <edition language="en">third edition</edition>
        <status>
          <stage language="" abbreviation="DIS">40</stage>
          <stage language="en">Draft International Standard</stage>
          <substage language="">00</substage>
        </status>
        <ext><structuredidentifier><project-number part="1">ISO 17301</project-number></structuredidentifier></ext>
      </bibdata>"#;

    #[test]
    fn resolves_full_bibdata() {
        let m = resolve(&document(None, FULL_BIBDATA)).unwrap();
        assert_eq!(m.flavor, "iso");
        assert_eq!(m.standard_number.as_deref(), Some("17301"));
        assert_eq!(m.edition.as_deref(), Some("3"));
        assert_eq!(m.stage_code.as_deref(), Some("40.00"));
        assert_eq!(m.stage_abbreviation.as_deref(), Some("DIS"));
        assert_eq!(m.stage.as_deref(), Some("Draft International Standard"));
        assert_eq!(m.substage.as_deref(), Some("00"));
        assert_eq!(m.part_number.as_deref(), Some("1"));
        assert_eq!(m.docidentifier.as_deref(), Some("ISO/DIS 17301-1:2023"));
        assert_eq!(m.title.as_deref(), Some("Cereals and pulses"));
        assert_eq!(m.auto_prefix(), "17301_dis_ed3");
    }

    #[test]
    fn flavor_attribute_is_honoured() {
        let m = resolve(&document(Some("iec"), FULL_BIBDATA)).unwrap();
        assert_eq!(m.auto_prefix(), "iec_17301_dis_ed3");
    }

    #[test]
    fn missing_bibdata_yields_none() {
        assert!(resolve(&document(None, "")).is_none());
    }

    #[test]
    fn missing_stage_abbreviation_yields_none() {
        let bib = r#"<bibdata><docnumber>1</docnumber><edition language="">1</edition>
            <status><stage language="">60</stage></status></bibdata>"#;
        assert!(resolve(&document(None, bib)).is_none());
    }

    #[test]
    fn substage_is_optional_and_unqualified_values_are_accepted() {
        let bib = r#"<bibdata><docnumber>8601</docnumber><edition>2</edition>
            <status><stage abbreviation="FDIS">50</stage></status></bibdata>"#;
        let m = resolve(&document(None, bib)).unwrap();
        assert_eq!(m.stage_code.as_deref(), Some("50"));
        assert_eq!(m.edition.as_deref(), Some("2"));
        assert_eq!(m.auto_prefix(), "8601_fdis_ed2");
    }

    #[test]
    fn elements_outside_the_document_namespace_are_ignored() {
        let xml = format!(
            r#"<metanorma xmlns="{NS}"><x:bibdata xmlns:x="urn:other"><x:docnumber>1</x:docnumber></x:bibdata></metanorma>"#
        );
        assert!(resolve(&xml).is_none());
    }
}
