//! Page templates: which one a section uses, where its text may go, and the
//! fixed artwork drawn on every page that uses it.

use folio_core::SectionType;

use crate::layout::Element;
use crate::metrics::text_width;
use crate::theme::{
    Rgb, Theme, COVER_BAR_HEIGHT, CONTENT_WIDTH, FOOTER_HEIGHT, HEADER_HEIGHT, MARGIN, MM,
    PAGE_HEIGHT, PAGE_WIDTH,
};

pub const CTA_PADDING: f32 = 22.0;
pub const CTA_RULE_HEIGHT: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Cover,
    Interior,
    CallToAction,
    Contact,
}

/// Position 0 is always the cover; closing sections get their own
/// templates and everything else is an interior page.
pub fn select_template(section_type: SectionType, position: usize) -> Template {
    if position == 0 {
        return Template::Cover;
    }
    match section_type {
        SectionType::CallToAction => Template::CallToAction,
        SectionType::Contact => Template::Contact,
        _ => Template::Interior,
    }
}

/// The rectangle text flows through, in PDF coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub width: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Frame {
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

impl Template {
    pub fn frame(&self) -> Frame {
        match self {
            Template::Cover => Frame {
                left: MARGIN,
                width: CONTENT_WIDTH,
                top: PAGE_HEIGHT * 0.55,
                bottom: COVER_BAR_HEIGHT + 20.0 * MM,
            },
            Template::CallToAction => Frame {
                left: MARGIN + CTA_PADDING,
                width: CONTENT_WIDTH - 2.0 * CTA_PADDING,
                top: PAGE_HEIGHT - HEADER_HEIGHT - 14.0 * MM - CTA_RULE_HEIGHT - CTA_PADDING,
                bottom: FOOTER_HEIGHT + 10.0 * MM + CTA_PADDING,
            },
            Template::Interior | Template::Contact => Frame {
                left: MARGIN,
                width: CONTENT_WIDTH,
                top: PAGE_HEIGHT - HEADER_HEIGHT - 14.0 * MM,
                bottom: FOOTER_HEIGHT + 10.0 * MM,
            },
        }
    }

    /// Artwork drawn beneath the page's text.
    pub fn decorate(
        &self,
        theme: &Theme,
        company: &str,
        tagline: Option<&str>,
        page_number: usize,
    ) -> Vec<Element> {
        match self {
            Template::Cover => cover_artwork(theme),
            _ => {
                let mut elements = header_bar(theme, company, tagline);
                elements.extend(footer(theme, company, page_number));
                elements
            }
        }
    }
}

fn cover_artwork(theme: &Theme) -> Vec<Element> {
    let (w, h) = (PAGE_WIDTH, PAGE_HEIGHT);
    vec![
        Element::Rect {
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
            color: theme.primary,
        },
        Element::Polygon {
            points: vec![(w * 0.58, h), (w, h), (w, h * 0.60)],
            color: theme.accent,
        },
        Element::Polygon {
            points: vec![(0.0, 0.0), (w * 0.40, 0.0), (0.0, h * 0.30)],
            color: theme.primary.blend(Rgb::WHITE, 0.06),
        },
        Element::Rect {
            x: 0.0,
            y: 0.0,
            width: w,
            height: COVER_BAR_HEIGHT,
            color: theme.accent,
        },
    ]
}

fn header_bar(theme: &Theme, company: &str, tagline: Option<&str>) -> Vec<Element> {
    let y = PAGE_HEIGHT - HEADER_HEIGHT;
    let mut elements = vec![
        Element::Rect {
            x: 0.0,
            y,
            width: PAGE_WIDTH,
            height: HEADER_HEIGHT,
            color: theme.primary,
        },
        Element::Rect {
            x: 0.0,
            y,
            width: 3.0,
            height: HEADER_HEIGHT,
            color: theme.accent,
        },
        Element::text(MARGIN, y + 3.0 * MM, &theme.header, company.to_uppercase()),
    ];

    if let Some(tagline) = tagline.filter(|t| !t.trim().is_empty()) {
        let style = theme.header_tagline;
        let text = fit_width(tagline.trim(), style.font, style.size, CONTENT_WIDTH / 2.0);
        let width = text_width(&text, style.font, style.size);
        elements.push(Element::text(
            PAGE_WIDTH - MARGIN - width,
            y + 3.0 * MM,
            &style,
            text,
        ));
    }
    elements
}

fn footer(theme: &Theme, company: &str, page_number: usize) -> Vec<Element> {
    let style = theme.footer;
    let number = format!("\u{2014} {page_number} \u{2014}");
    let number_width = text_width(&number, style.font, style.size);
    vec![
        Element::Line {
            from: (MARGIN, FOOTER_HEIGHT),
            to: (PAGE_WIDTH - MARGIN, FOOTER_HEIGHT),
            width: 0.4,
            color: theme.rule,
        },
        Element::text(MARGIN, FOOTER_HEIGHT - 9.0, &style, company.to_string()),
        Element::text(
            (PAGE_WIDTH - number_width) / 2.0,
            FOOTER_HEIGHT - 9.0,
            &style,
            number,
        ),
    ]
}

/// Shortens `text` with a trailing `...` until it fits `max_width`.
fn fit_width(text: &str, font: crate::theme::Font, size: f32, max_width: f32) -> String {
    if text_width(text, font, size) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
        if text_width(&candidate, font, size) <= max_width {
            return candidate;
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_zero_is_always_cover() {
        for section_type in SectionType::ALL {
            assert_eq!(select_template(section_type, 0), Template::Cover);
        }
    }

    #[test]
    fn test_closing_templates() {
        assert_eq!(
            select_template(SectionType::CallToAction, 4),
            Template::CallToAction
        );
        assert_eq!(select_template(SectionType::Contact, 5), Template::Contact);
        assert_eq!(select_template(SectionType::About, 1), Template::Interior);
        assert_eq!(select_template(SectionType::Offerings, 2), Template::Interior);
        assert_eq!(
            select_template(SectionType::ValueProposition, 3),
            Template::Interior
        );
    }

    #[test]
    fn test_frames_fit_the_page() {
        for template in [
            Template::Cover,
            Template::Interior,
            Template::CallToAction,
            Template::Contact,
        ] {
            let frame = template.frame();
            assert!(frame.height() > 200.0);
            assert!(frame.left + frame.width <= PAGE_WIDTH);
        }
    }

    #[test]
    fn test_fit_width_truncates() {
        let theme = Theme::default();
        let style = theme.header_tagline;
        let long = "word ".repeat(100);
        let fitted = fit_width(&long, style.font, style.size, 100.0);
        assert!(fitted.ends_with("..."));
        assert!(text_width(&fitted, style.font, style.size) <= 100.0);
        assert_eq!(fit_width("short", style.font, style.size, 100.0), "short");
    }
}
