//! Turns brochure sections into positioned page elements.
//!
//! Every section opens a fresh page. Text is wrapped into blocks (one per
//! paragraph, bullet or contact row) and blocks are stacked top to bottom.
//! A block that does not fit the rest of the page moves whole to the next
//! page when it would fit there; only blocks taller than a full page are
//! split, between lines.

use folio_core::{Section, SectionType};

use crate::metrics::wrap;
use crate::templates::{Frame, Template, CTA_PADDING, CTA_RULE_HEIGHT};
use crate::theme::{Font, Rgb, TextStyle, Theme, MM};

const BULLET_INDENT: f32 = 14.0;
const CONTACT_KEY_WIDTH: f32 = 38.0 * MM;
const MAX_CONTACT_LABEL_CHARS: usize = 24;

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Polygon {
        points: Vec<(f32, f32)>,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgb,
    },
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        color: Rgb,
        text: String,
    },
}

impl Element {
    pub fn text(x: f32, y: f32, style: &TextStyle, text: String) -> Self {
        Element::Text {
            x,
            y,
            font: style.font,
            size: style.size,
            color: style.color,
            text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub template: Template,
    pub section: SectionType,
    pub elements: Vec<Element>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
struct Span {
    dx: f32,
    style: TextStyle,
    text: String,
}

#[derive(Debug, Clone)]
struct Line {
    spans: Vec<Span>,
    height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Trailer {
    None,
    AccentRule,
    RowRule,
}

impl Trailer {
    fn height(&self) -> f32 {
        match self {
            Trailer::None => 0.0,
            Trailer::AccentRule => 2.0,
            Trailer::RowRule => 0.3,
        }
    }
}

#[derive(Debug, Clone)]
struct Block {
    lines: Vec<Line>,
    trailer: Trailer,
    space_after: f32,
}

impl Block {
    fn height(&self) -> f32 {
        self.lines.iter().map(|l| l.height).sum::<f32>() + self.trailer.height()
    }
}

struct OpenPage {
    page: Page,
    frame: Frame,
    cursor: f32,
    panel_at: usize,
}

/// Lays out a whole brochure, one section after another.
pub struct Composer<'a> {
    theme: &'a Theme,
    company: &'a str,
    tagline: Option<&'a str>,
    pages: Vec<Page>,
    open: Option<OpenPage>,
}

impl<'a> Composer<'a> {
    pub fn new(theme: &'a Theme, company: &'a str, tagline: Option<&'a str>) -> Self {
        Self {
            theme,
            company,
            tagline,
            pages: Vec::new(),
            open: None,
        }
    }

    pub fn add_section(&mut self, section: &Section, template: Template) {
        let blocks = self.section_blocks(section, template);
        self.new_page(template, section.section_type);
        for block in blocks {
            self.place(block, template, section.section_type);
        }
    }

    pub fn finish(mut self) -> Vec<Page> {
        self.close_page();
        self.pages
    }

    fn new_page(&mut self, template: Template, section: SectionType) {
        self.close_page();
        let number = self.pages.len() + 1;
        let elements = template.decorate(self.theme, self.company, self.tagline, number);
        let frame = template.frame();
        self.open = Some(OpenPage {
            panel_at: elements.len(),
            page: Page {
                template,
                section,
                elements,
            },
            frame,
            cursor: frame.top,
        });
    }

    fn close_page(&mut self) {
        let Some(mut open) = self.open.take() else {
            return;
        };
        if open.page.template == Template::CallToAction {
            let top = open.frame.top + CTA_PADDING;
            let bottom = (open.cursor - CTA_PADDING).max(open.frame.bottom - CTA_PADDING);
            let x = open.frame.left - CTA_PADDING;
            let width = open.frame.width + 2.0 * CTA_PADDING;
            let panel = [
                Element::Rect {
                    x,
                    y: bottom,
                    width,
                    height: top - bottom,
                    color: self.theme.primary,
                },
                Element::Rect {
                    x,
                    y: top,
                    width,
                    height: CTA_RULE_HEIGHT,
                    color: self.theme.accent,
                },
            ];
            open.page.elements.splice(open.panel_at..open.panel_at, panel);
        }
        self.pages.push(open.page);
    }

    fn place(&mut self, block: Block, template: Template, section: SectionType) {
        let height = block.height();
        let remaining = self.open.as_ref().map_or(0.0, |o| o.cursor - o.frame.bottom);
        if height > remaining && height <= template.frame().height() {
            self.new_page(template, section);
        }

        for line in &block.lines {
            let fits = self
                .open
                .as_ref()
                .is_some_and(|o| o.cursor - line.height >= o.frame.bottom - 0.01);
            if !fits {
                self.new_page(template, section);
            }
            if let Some(open) = self.open.as_mut() {
                for span in &line.spans {
                    let baseline = open.cursor - span.style.size;
                    open.page.elements.push(Element::text(
                        open.frame.left + span.dx,
                        baseline,
                        &span.style,
                        span.text.clone(),
                    ));
                }
                open.cursor -= line.height;
            }
        }

        if let Some(open) = self.open.as_mut() {
            match block.trailer {
                Trailer::None => {}
                Trailer::AccentRule => {
                    let y = open.cursor - 2.0;
                    let split = open.frame.width * 0.55;
                    open.page.elements.push(Element::Rect {
                        x: open.frame.left,
                        y,
                        width: split,
                        height: 2.0,
                        color: self.theme.accent,
                    });
                    open.page.elements.push(Element::Rect {
                        x: open.frame.left + split,
                        y,
                        width: open.frame.width - split,
                        height: 2.0,
                        color: self.theme.accent_pale,
                    });
                }
                Trailer::RowRule => {
                    let y = open.cursor - 0.3;
                    open.page.elements.push(Element::Line {
                        from: (open.frame.left, y),
                        to: (open.frame.left + open.frame.width, y),
                        width: 0.3,
                        color: self.theme.rule,
                    });
                }
            }
            open.cursor -= block.trailer.height();
            open.cursor = (open.cursor - block.space_after).max(open.frame.bottom);
        }
    }

    fn section_blocks(&self, section: &Section, template: Template) -> Vec<Block> {
        let theme = self.theme;
        let width = template.frame().width;
        let mut blocks = Vec::new();

        match template {
            Template::Cover => {
                blocks.push(text_block(&self.company.to_uppercase(), theme.cover_company, width));
                let heading = section.heading.trim();
                if !heading.is_empty() && !heading.eq_ignore_ascii_case(self.company.trim()) {
                    blocks.push(text_block(heading, theme.cover_headline, width));
                }
                for paragraph in &section.paragraphs {
                    blocks.push(text_block(paragraph, theme.cover_body, width));
                }
                for bullet in section.bullets() {
                    blocks.push(bullet_block(bullet, theme.cover_body, width));
                }
                if let Some(tagline) = self.tagline.filter(|t| !t.trim().is_empty()) {
                    if let Some(last) = blocks.last_mut() {
                        last.space_after += 16.0;
                    }
                    blocks.push(text_block(tagline, theme.cover_tagline, width));
                }
            }
            Template::CallToAction => {
                if !section.heading.trim().is_empty() {
                    blocks.push(text_block(&section.heading, theme.cta_heading, width));
                }
                for paragraph in &section.paragraphs {
                    blocks.push(text_block(paragraph, theme.cta_body, width));
                }
                for bullet in section.bullets() {
                    blocks.push(bullet_block(bullet, theme.cta_body, width));
                }
            }
            Template::Interior | Template::Contact => {
                blocks.push(text_block(
                    &section.section_type.label().to_uppercase(),
                    theme.label,
                    width,
                ));
                if !section.heading.trim().is_empty() {
                    let mut heading = text_block(&section.heading, theme.heading, width);
                    heading.trailer = Trailer::AccentRule;
                    heading.space_after = 12.0;
                    blocks.push(heading);
                }
                let body = section
                    .paragraphs
                    .iter()
                    .map(|p| (p.as_str(), false))
                    .chain(section.bullets().iter().map(|b| (b.as_str(), true)));
                for (text, is_bullet) in body {
                    let block = match (template, split_label(text)) {
                        (Template::Contact, Some((key, value))) => contact_row(key, value, theme, width),
                        _ if is_bullet => bullet_block(text, theme.bullet, width),
                        _ => text_block(text, theme.body_text, width),
                    };
                    blocks.push(block);
                }
            }
        }

        blocks.retain(|b| !b.lines.is_empty());
        blocks
    }
}

fn lines_for(text: &str, style: TextStyle, width: f32, dx: f32) -> Vec<Line> {
    wrap(text, style.font, style.size, width)
        .into_iter()
        .map(|text| Line {
            spans: vec![Span { dx, style, text }],
            height: style.leading,
        })
        .collect()
}

fn text_block(text: &str, style: TextStyle, width: f32) -> Block {
    Block {
        lines: lines_for(text, style, width, 0.0),
        trailer: Trailer::None,
        space_after: style.space_after,
    }
}

fn bullet_block(text: &str, style: TextStyle, width: f32) -> Block {
    let mut lines = lines_for(text, style, width - BULLET_INDENT, BULLET_INDENT);
    if let Some(first) = lines.first_mut() {
        first.spans.insert(
            0,
            Span {
                dx: 4.0,
                style,
                text: "\u{2022}".to_string(),
            },
        );
    }
    Block {
        lines,
        trailer: Trailer::None,
        space_after: style.space_after,
    }
}

/// `"Email: hello@acme.test"` becomes a label/value row.
fn split_label(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once(':')?;
    let key = key.trim();
    let value = value.trim();
    let plausible = !key.is_empty()
        && !value.is_empty()
        && key.chars().count() <= MAX_CONTACT_LABEL_CHARS
        && !key.contains('.')
        && !value.starts_with("//");
    plausible.then_some((key, value))
}

fn contact_row(key: &str, value: &str, theme: &Theme, width: f32) -> Block {
    let keys = wrap(key, theme.contact_key.font, theme.contact_key.size, CONTACT_KEY_WIDTH - 6.0);
    let values = wrap(
        value,
        theme.contact_value.font,
        theme.contact_value.size,
        width - CONTACT_KEY_WIDTH,
    );
    let rows = keys.len().max(values.len());
    let lines = (0..rows)
        .map(|i| {
            let mut spans = Vec::new();
            if let Some(k) = keys.get(i) {
                spans.push(Span {
                    dx: 0.0,
                    style: theme.contact_key,
                    text: k.clone(),
                });
            }
            if let Some(v) = values.get(i) {
                spans.push(Span {
                    dx: CONTACT_KEY_WIDTH,
                    style: theme.contact_value,
                    text: v.clone(),
                });
            }
            Line {
                spans,
                height: theme.contact_key.leading.max(theme.contact_value.leading),
            }
        })
        .collect();
    Block {
        lines,
        trailer: Trailer::RowRule,
        space_after: 5.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(sections: &[(Section, Template)]) -> Vec<Page> {
        let theme = Theme::default();
        let mut composer = Composer::new(&theme, "Acme Robotics", Some("Robots that work"));
        for (section, template) in sections {
            composer.add_section(section, *template);
        }
        composer.finish()
    }

    fn all_text(pages: &[Page]) -> String {
        pages
            .iter()
            .flat_map(|p| p.texts())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_each_section_starts_a_page() {
        let pages = compose(&[
            (
                Section::new(SectionType::Cover, "Acme Robotics").with_paragraph("Automation for all."),
                Template::Cover,
            ),
            (
                Section::new(SectionType::About, "Who we are").with_paragraph("Two engineers."),
                Template::Interior,
            ),
            (
                Section::new(SectionType::CallToAction, "Talk to us").with_paragraph("Book a demo."),
                Template::CallToAction,
            ),
        ]);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].template, Template::Cover);
        assert_eq!(pages[2].section, SectionType::CallToAction);
        assert!(pages[1].texts().any(|t| t == "\u{2014} 2 \u{2014}"));
        assert!(pages[1].texts().any(|t| t == "COMPANY OVERVIEW"));
    }

    #[test]
    fn test_long_section_flows_onto_more_pages_without_loss() {
        let paragraph = "Acme builds reliable collaborative robots for small factories. ".repeat(12);
        let mut section = Section::new(SectionType::About, "Who we are");
        for _ in 0..20 {
            section = section.with_paragraph(paragraph.trim());
        }
        let pages = compose(&[(section, Template::Interior)]);
        assert!(pages.len() > 1);

        let words = all_text(&pages)
            .split_whitespace()
            .filter(|w| *w == "reliable")
            .count();
        assert_eq!(words, 12 * 20);
    }

    #[test]
    fn test_paragraph_that_fits_a_page_is_never_split() {
        let theme = Theme::default();
        let frame = Template::Interior.frame();
        let style = theme.body_text;
        let paragraph = "word ".repeat(300);
        let line_count = wrap(&paragraph, style.font, style.size, frame.width).len();
        assert!((line_count as f32) * style.leading < frame.height());

        let mut section = Section::new(SectionType::About, "Heading");
        for _ in 0..3 {
            section = section.with_paragraph(paragraph.trim());
        }
        let pages = compose(&[(section, Template::Interior)]);

        let per_page: Vec<usize> = pages
            .iter()
            .map(|p| p.texts().filter(|t| t.starts_with("word")).count())
            .collect();
        assert!(per_page.iter().all(|n| n % line_count == 0), "{per_page:?}");
        assert_eq!(per_page.iter().sum::<usize>(), 3 * line_count);
    }

    #[test]
    fn test_contact_rows() {
        let section = Section::new(SectionType::Contact, "Get in touch")
            .with_bullets(["Email: hello@acme.test", "Phone: +1 555 010 2000"])
            .with_paragraph("We answer within one business day.");
        let pages = compose(&[(section, Template::Contact)]);
        let texts: Vec<&str> = pages[0].texts().collect();
        assert!(texts.contains(&"Email"));
        assert!(texts.contains(&"hello@acme.test"));
        assert!(texts.contains(&"We answer within one business day."));
        assert!(pages[0]
            .elements
            .iter()
            .any(|e| matches!(e, Element::Line { width, .. } if *width == 0.3)));
    }

    #[test]
    fn test_call_to_action_panel_sits_under_text() {
        let section = Section::new(SectionType::CallToAction, "Talk to us").with_paragraph("Book a demo.");
        let pages = compose(&[(section, Template::CallToAction)]);
        let theme = Theme::default();
        let panel = pages[0]
            .elements
            .iter()
            .position(|e| matches!(e, Element::Rect { color, height, .. } if *color == theme.primary && *height > 50.0))
            .unwrap();
        let first_heading = pages[0]
            .elements
            .iter()
            .position(|e| matches!(e, Element::Text { text, .. } if text == "Talk to us"))
            .unwrap();
        assert!(panel < first_heading);
    }

    #[test]
    fn test_split_label() {
        assert_eq!(split_label("Email: a@b.test"), Some(("Email", "a@b.test")));
        assert_eq!(split_label("https://acme.test"), None);
        assert_eq!(split_label("No label here"), None);
        assert_eq!(split_label("A sentence. Then: more"), None);
    }
}
