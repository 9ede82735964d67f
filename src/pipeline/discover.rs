//! Figure discovery: find `figure` nodes and turn each into a [`Figure`] or a
//! [`SkipReason`].
//!
//! Classification of the image source, in order:
//!
//! 1. `src="data:..."` → base64 data URI, format from its MIME type
//! 2. `mimetype="image/svg+xml"` or a `.svg` filename → inline SVG markup
//! 3. any other `src` → external reference, not embeddable

use super::datauri::{parse_data_uri, DataUriError};
use super::is_element;
use crate::error::SkipReason;
use crate::figure::{Figure, FigureFormat};
use roxmltree::{Document, Node};
use std::path::Path;
use tracing::debug;

/// Result of processing one figure node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigureOutcome {
    Accepted(Figure),
    Skipped(SkipReason),
}

/// All `figure` elements in the root element's namespace, in document order.
pub fn find_figures<'a, 'i>(doc: &'a Document<'i>) -> Vec<Node<'a, 'i>> {
    let root = doc.root_element();
    let ns = root.tag_name().namespace();
    root.descendants()
        .filter(|n| is_element(n, "figure", ns))
        .collect()
}

/// Process the figure at 1-based position `index`.
///
/// `source` is the XML text the node was parsed from; inline SVG markup is
/// copied from it verbatim.
pub fn process_figure(figure: Node<'_, '_>, index: usize, source: &str) -> FigureOutcome {
    let Some(autonum) = figure
        .attribute("autonum")
        .map(str::trim)
        .filter(|a| !a.is_empty())
    else {
        return FigureOutcome::Skipped(SkipReason::MissingAutonum { index });
    };
    let autonum = autonum.to_string();

    let Some(image) = own_image(figure) else {
        return FigureOutcome::Skipped(SkipReason::MissingImage { index, autonum });
    };

    let src = non_empty(image.attribute("src"));
    let filename = non_empty(image.attribute("filename"));
    let mimetype = non_empty(image.attribute("mimetype"));

    if let Some(uri) = src.filter(|s| s.starts_with("data:")) {
        return data_uri_figure(uri, filename, index, autonum);
    }

    let is_svg = mimetype.is_some_and(|m| m.eq_ignore_ascii_case("image/svg+xml"))
        || filename.is_some_and(has_svg_extension)
        || src.is_some_and(has_svg_extension);
    if is_svg {
        return svg_figure(image, src, filename, source, index, autonum);
    }

    match src {
        Some(src) => FigureOutcome::Skipped(SkipReason::ExternalReference {
            index,
            autonum,
            file: basename(src),
        }),
        None => FigureOutcome::Skipped(SkipReason::NoSource { index, autonum }),
    }
}

fn data_uri_figure(
    uri: &str,
    filename: Option<&str>,
    index: usize,
    autonum: String,
) -> FigureOutcome {
    let data = match parse_data_uri(uri) {
        Ok(data) => data,
        Err(DataUriError::Malformed) => {
            return FigureOutcome::Skipped(SkipReason::MalformedDataUri { index, autonum })
        }
        Err(DataUriError::NotBase64) => {
            return FigureOutcome::Skipped(SkipReason::UnsupportedEncoding { index, autonum })
        }
    };

    let figure = Figure::new(
        autonum.as_str(),
        data.payload,
        data.format,
        filename.map(str::to_string),
    );
    let decoded = figure.decode().map(|bytes| bytes.len());
    let detail = match decoded {
        Ok(0) => "empty payload".to_string(),
        Ok(_) => {
            debug!("Figure {}: Data URI {}", autonum, data.format.name());
            return FigureOutcome::Accepted(figure);
        }
        Err(e) => e.to_string(),
    };
    FigureOutcome::Skipped(SkipReason::InvalidPayload {
        index,
        autonum,
        detail,
    })
}

fn svg_figure(
    image: Node<'_, '_>,
    src: Option<&str>,
    filename: Option<&str>,
    source: &str,
    index: usize,
    autonum: String,
) -> FigureOutcome {
    let markup = inner_markup(image, source).trim();
    if markup.is_empty() {
        return FigureOutcome::Skipped(match src {
            Some(src) => SkipReason::ExternalReference {
                index,
                autonum,
                file: basename(src),
            },
            None => SkipReason::EmptySvg { index, autonum },
        });
    }

    let original = src.or(filename).map(str::to_string);
    match &original {
        Some(name) => debug!("Figure {}: SVG ({})", autonum, basename(name)),
        None => debug!("Figure {}: SVG", autonum),
    }
    FigureOutcome::Accepted(Figure::new(autonum, markup, FigureFormat::Svg, original))
}

/// The first `image` whose closest enclosing `figure` is `figure` itself, so
/// images of nested subfigures stay with their own node.
fn own_image<'a, 'i>(figure: Node<'a, 'i>) -> Option<Node<'a, 'i>> {
    let ns = figure.tag_name().namespace();
    figure
        .descendants()
        .filter(|n| is_element(n, "image", ns))
        .find(|image| {
            image
                .ancestors()
                .find(|a| is_element(a, "figure", ns))
                .is_some_and(|owner| owner == figure)
        })
}

/// Source text between the element's start and end tags.
fn inner_markup<'s>(node: Node<'_, '_>, source: &'s str) -> &'s str {
    match (node.first_child(), node.last_child()) {
        (Some(first), Some(last)) => source
            .get(first.range().start..last.range().end)
            .unwrap_or_default(),
        _ => "",
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn has_svg_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "https://www.metanorma.org/ns/standoc";
    const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==";

    fn wrap(figures: &str) -> String {
        format!(r#"<metanorma xmlns="{NS}"><sections>{figures}</sections></metanorma>"#)
    }

    fn outcomes(xml: &str) -> Vec<FigureOutcome> {
        let doc = Document::parse(xml).unwrap();
        find_figures(&doc)
            .into_iter()
            .enumerate()
            .map(|(i, node)| process_figure(node, i + 1, xml))
            .collect()
    }

    fn single(figure: &str) -> FigureOutcome {
        outcomes(&wrap(figure)).remove(0)
    }

    #[test]
    fn data_uri_png_is_accepted() {
        let outcome = single(&format!(
            r#"<figure autonum="A.1"><image src="data:image/png;base64,{PIXEL_PNG}" filename="a1.png" mimetype="image/png"/></figure>"#
        ));
        match outcome {
            FigureOutcome::Accepted(f) => {
                assert_eq!(f.autonum(), "A.1");
                assert_eq!(f.format(), FigureFormat::DataUriPng);
                assert_eq!(f.original_filename(), Some("a1.png"));
                assert_eq!(f.file_size(), 70);
            }
            other => panic!("expected accepted, got {other:?}"),
        }
    }

    #[test]
    fn inline_svg_keeps_markup_verbatim() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><circle r="4"/></svg>"#;
        let outcome = single(&format!(
            r#"<figure autonum="2"><image src="figures/two.svg" mimetype="image/svg+xml">
                {svg}
            </image></figure>"#
        ));
        match outcome {
            FigureOutcome::Accepted(f) => {
                assert_eq!(f.format(), FigureFormat::Svg);
                assert_eq!(f.content(), svg);
                assert_eq!(f.original_filename(), Some("figures/two.svg"));
            }
            other => panic!("expected accepted, got {other:?}"),
        }
    }

    #[test]
    fn missing_autonum_and_image_are_skipped() {
        let all = outcomes(&wrap(
            r#"<figure><image src="data:image/png;base64,AAAA"/></figure>
               <figure autonum="  "/>
               <figure autonum="3"><name>No image</name></figure>"#,
        ));
        assert_eq!(
            all,
            vec![
                FigureOutcome::Skipped(SkipReason::MissingAutonum { index: 1 }),
                FigureOutcome::Skipped(SkipReason::MissingAutonum { index: 2 }),
                FigureOutcome::Skipped(SkipReason::MissingImage {
                    index: 3,
                    autonum: "3".into()
                }),
            ]
        );
    }

    #[test]
    fn unusable_data_uris_are_skipped() {
        assert!(matches!(
            single(r#"<figure autonum="1"><image src="data:image/png;base64"/></figure>"#),
            FigureOutcome::Skipped(SkipReason::MalformedDataUri { .. })
        ));
        assert_eq!(
            single(r#"<figure autonum="C.3"><image src="data:image/svg+xml,%3Csvg%2F%3E"/></figure>"#),
            FigureOutcome::Skipped(SkipReason::UnsupportedEncoding {
                index: 1,
                autonum: "C.3".into()
            })
        );
        assert!(matches!(
            single(r#"<figure autonum="1"><image src="data:image/png;base64,@@@@"/></figure>"#),
            FigureOutcome::Skipped(SkipReason::InvalidPayload { .. })
        ));
        assert!(matches!(
            single(r#"<figure autonum="1"><image src="data:image/png;base64,"/></figure>"#),
            FigureOutcome::Skipped(SkipReason::InvalidPayload { .. })
        ));
    }

    #[test]
    fn external_references_and_empty_svg_are_skipped() {
        assert_eq!(
            single(r#"<figure autonum="B.1"><image src="images/photo.jpg" mimetype="image/jpeg"/></figure>"#),
            FigureOutcome::Skipped(SkipReason::ExternalReference {
                index: 1,
                autonum: "B.1".into(),
                file: "photo.jpg".into()
            })
        );
        assert!(matches!(
            single(r#"<figure autonum="1"><image mimetype="image/svg+xml"> </image></figure>"#),
            FigureOutcome::Skipped(SkipReason::EmptySvg { .. })
        ));
        assert!(matches!(
            single(r#"<figure autonum="1"><image mimetype="image/png"/></figure>"#),
            FigureOutcome::Skipped(SkipReason::NoSource { .. })
        ));
    }

    #[test]
    fn nested_subfigures_own_their_images() {
        let all = outcomes(&wrap(&format!(
            r#"<figure autonum="1">
                 <figure autonum="1 a"><image src="data:image/png;base64,{PIXEL_PNG}"/></figure>
                 <figure autonum="1 b"><image src="data:image/gif;base64,{PIXEL_PNG}"/></figure>
               </figure>"#
        )));
        assert_eq!(all.len(), 3);
        assert!(matches!(all[0], FigureOutcome::Skipped(SkipReason::MissingImage { .. })));
        let accepted: Vec<_> = all
            .iter()
            .filter_map(|o| match o {
                FigureOutcome::Accepted(f) => Some((f.autonum(), f.format())),
                FigureOutcome::Skipped(_) => None,
            })
            .collect();
        assert_eq!(
            accepted,
            vec![("1 a", FigureFormat::DataUriPng), ("1 b", FigureFormat::DataUriGif)]
        );
    }

    #[test]
    fn figures_in_foreign_namespaces_are_ignored() {
        let xml = wrap(r#"<x:figure xmlns:x="urn:other" autonum="9"/>"#);
        let doc = Document::parse(&xml).unwrap();
        assert!(find_figures(&doc).is_empty());
    }
}
