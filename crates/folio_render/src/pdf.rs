use chrono::{DateTime, Utc};
use folio_core::{Error, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::layout::{Element, Page};
use crate::metrics::encode_win_ansi;
use crate::theme::{Font, Rgb, PAGE_HEIGHT, PAGE_WIDTH};

const PRODUCER: &str = "folio";

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

fn render_error(e: impl std::fmt::Display) -> Error {
    Error::RenderFailure(format!("pdf: {e}"))
}

fn real(value: f32) -> Object {
    // Two decimals keep content streams stable across platforms.
    Object::Real((value * 100.0).round() / 100.0)
}

fn color_operands(color: Rgb) -> Vec<Object> {
    color.components().into_iter().map(real).collect()
}

fn element_operations(element: &Element, ops: &mut Vec<Operation>) {
    match element {
        Element::Rect {
            x,
            y,
            width,
            height,
            color,
        } => {
            ops.push(Operation::new("rg", color_operands(*color)));
            ops.push(Operation::new(
                "re",
                vec![real(*x), real(*y), real(*width), real(*height)],
            ));
            ops.push(Operation::new("f", vec![]));
        }
        Element::Polygon { points, color } => {
            let Some((first, rest)) = points.split_first() else {
                return;
            };
            ops.push(Operation::new("rg", color_operands(*color)));
            ops.push(Operation::new("m", vec![real(first.0), real(first.1)]));
            for (x, y) in rest {
                ops.push(Operation::new("l", vec![real(*x), real(*y)]));
            }
            ops.push(Operation::new("h", vec![]));
            ops.push(Operation::new("f", vec![]));
        }
        Element::Line {
            from,
            to,
            width,
            color,
        } => {
            ops.push(Operation::new("RG", color_operands(*color)));
            ops.push(Operation::new("w", vec![real(*width)]));
            ops.push(Operation::new("m", vec![real(from.0), real(from.1)]));
            ops.push(Operation::new("l", vec![real(to.0), real(to.1)]));
            ops.push(Operation::new("S", vec![]));
        }
        Element::Text {
            x,
            y,
            font,
            size,
            color,
            text,
        } => {
            ops.push(Operation::new("rg", color_operands(*color)));
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![Object::Name(font.resource().as_bytes().to_vec()), real(*size)],
            ));
            ops.push(Operation::new("Td", vec![real(*x), real(*y)]));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ));
            ops.push(Operation::new("ET", vec![]));
        }
    }
}

fn font_resources(doc: &mut Document) -> Dictionary {
    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), id);
    }
    fonts
}

/// PDF date string, e.g. `D:20260314093000Z`.
fn pdf_date(at: &DateTime<Utc>) -> String {
    format!("D:{}Z", at.format("%Y%m%d%H%M%S"))
}

/// Serializes laid-out pages into a PDF using the standard Helvetica
/// faces, so no font files are embedded.
pub fn write_pdf(pages: &[Page], info: &DocumentInfo) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(Error::RenderFailure("no pages to write".to_string()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let fonts = font_resources(&mut doc);
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<ObjectId> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::new();
        for element in &page.elements {
            element_operations(element, &mut operations);
        }
        let content = Content { operations }.encode().map_err(render_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        kids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => Object::Integer(kids.len() as i64),
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let date = pdf_date(&info.created_at);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(&info.title)),
        "Author" => Object::string_literal(encode_win_ansi(&info.author)),
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(date.clone()),
        "ModDate" => Object::string_literal(date),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(render_error)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::Template;
    use chrono::TimeZone;
    use folio_core::SectionType;

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "Acme brochure".to_string(),
            author: "Acme".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    fn page(text: &str) -> Page {
        Page {
            template: Template::Interior,
            section: SectionType::About,
            elements: vec![
                Element::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                    color: Rgb(0x1C2E4A),
                },
                Element::Text {
                    x: 50.0,
                    y: 700.0,
                    font: Font::Bold,
                    size: 12.0,
                    color: Rgb(0x000000),
                    text: text.to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_pdf_date() {
        assert_eq!(pdf_date(&info().created_at), "D:20260314093000Z");
    }

    #[test]
    fn test_written_pdf_loads_back() {
        let bytes = write_pdf(&[page("One"), page("Two")], &info()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = write_pdf(&[page("Café")], &info()).unwrap();
        let b = write_pdf(&[page("Café")], &info()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_pages_is_a_render_failure() {
        assert!(matches!(
            write_pdf(&[], &info()),
            Err(Error::RenderFailure(_))
        ));
    }
}
