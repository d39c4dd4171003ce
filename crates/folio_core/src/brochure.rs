//! Structural rules every brochure must satisfy before it is laid out.
//!
//! A valid brochure starts with exactly one `cover` section and ends with a
//! closing block: one or more of `callToAction` / `contact`, each at most
//! once. Everything between is `about`, `offerings` or `valueProposition`.
//! Non-cover sections need a heading and some body text.

use thiserror::Error;

use crate::types::{BrochureContent, Section, SectionType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("the brochure has no sections")]
    Empty,
    #[error("expected exactly one cover section, found {0}")]
    CoverCount(usize),
    #[error("the cover section must be first")]
    CoverNotFirst,
    #[error("the last section must be callToAction or contact, found {0}")]
    MissingClosing(SectionType),
    #[error("{0} section at position {1} appears before the closing block")]
    ClosingOutOfPlace(SectionType, usize),
    #[error("the closing block repeats {0}")]
    DuplicateClosing(SectionType),
    #[error("section {0} has an empty heading")]
    EmptyHeading(usize),
    #[error("section {0} ({1}) has no paragraphs or bullets")]
    EmptyBody(usize, SectionType),
}

impl BrochureContent {
    /// Checks the ordering and content invariants.
    pub fn validate(&self) -> Result<(), Violation> {
        let sections = &self.sections;
        let Some(last) = sections.last() else {
            return Err(Violation::Empty);
        };

        let covers = sections
            .iter()
            .filter(|s| s.section_type == SectionType::Cover)
            .count();
        if covers != 1 {
            return Err(Violation::CoverCount(covers));
        }
        if sections[0].section_type != SectionType::Cover {
            return Err(Violation::CoverNotFirst);
        }
        if !last.section_type.is_closing() {
            return Err(Violation::MissingClosing(last.section_type));
        }

        let closing_start = sections
            .iter()
            .rposition(|s| !s.section_type.is_closing())
            .map_or(0, |i| i + 1);
        if let Some((idx, s)) = sections[..closing_start]
            .iter()
            .enumerate()
            .find(|(_, s)| s.section_type.is_closing())
        {
            return Err(Violation::ClosingOutOfPlace(s.section_type, idx));
        }
        let closing = &sections[closing_start..];
        for (i, s) in closing.iter().enumerate() {
            if closing[..i].iter().any(|c| c.section_type == s.section_type) {
                return Err(Violation::DuplicateClosing(s.section_type));
            }
        }

        for (idx, s) in sections.iter().enumerate() {
            if s.heading.trim().is_empty() {
                return Err(Violation::EmptyHeading(idx));
            }
            if s.section_type != SectionType::Cover && !s.has_body() {
                return Err(Violation::EmptyBody(idx, s.section_type));
            }
        }

        Ok(())
    }

    /// Deterministic clean-up applied to backend output before validation:
    /// trims text, drops blank entries, then stably moves cover sections to
    /// the front and closing sections to the back.
    pub fn normalize(self) -> Self {
        let tagline = self
            .tagline
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let sections: Vec<Section> = self.sections.into_iter().map(tidy_section).collect();
        let (covers, rest): (Vec<_>, Vec<_>) = sections
            .into_iter()
            .partition(|s| s.section_type == SectionType::Cover);
        let (closing, middle): (Vec<_>, Vec<_>) =
            rest.into_iter().partition(|s| s.section_type.is_closing());

        let mut ordered = covers;
        ordered.extend(middle);
        ordered.extend(closing);

        Self {
            tagline,
            sections: ordered,
        }
    }
}

fn tidy_section(section: Section) -> Section {
    let tidy = |items: Vec<String>| -> Vec<String> {
        items
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    };
    let bullets = section.bullets.map(tidy).filter(|b| !b.is_empty());
    Section {
        section_type: section.section_type,
        heading: section.heading.trim().to_string(),
        paragraphs: tidy(section.paragraphs),
        bullets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(t: SectionType) -> Section {
        Section::new(t, format!("{t} heading")).with_paragraph("Body text for the section.")
    }

    fn brochure(types: &[SectionType]) -> BrochureContent {
        BrochureContent {
            tagline: None,
            sections: types.iter().copied().map(section).collect(),
        }
    }

    #[test]
    fn test_valid_brochure() {
        use SectionType::*;
        assert!(brochure(&[Cover, About, Offerings, CallToAction]).validate().is_ok());
        assert!(brochure(&[Cover, Contact]).validate().is_ok());
        assert!(brochure(&[Cover, About, CallToAction, Contact]).validate().is_ok());
    }

    #[test]
    fn test_structural_violations() {
        use SectionType::*;
        assert_eq!(brochure(&[]).validate(), Err(Violation::Empty));
        assert_eq!(
            brochure(&[About, Cover, Contact]).validate(),
            Err(Violation::CoverNotFirst)
        );
        assert_eq!(
            brochure(&[Cover, About, Cover, Contact]).validate(),
            Err(Violation::CoverCount(2))
        );
        assert_eq!(
            brochure(&[Cover, About]).validate(),
            Err(Violation::MissingClosing(About))
        );
        assert_eq!(
            brochure(&[Cover, Contact, About, CallToAction]).validate(),
            Err(Violation::ClosingOutOfPlace(Contact, 1))
        );
        assert_eq!(
            brochure(&[Cover, About, Contact, Contact]).validate(),
            Err(Violation::DuplicateClosing(Contact))
        );
    }

    #[test]
    fn test_content_violations() {
        use SectionType::*;
        let mut b = brochure(&[Cover, About, Contact]);
        b.sections[1].paragraphs.clear();
        assert_eq!(b.validate(), Err(Violation::EmptyBody(1, About)));

        let mut b = brochure(&[Cover, About, Contact]);
        b.sections[2].heading = "  ".into();
        assert_eq!(b.validate(), Err(Violation::EmptyHeading(2)));

        let mut b = brochure(&[Cover, Contact]);
        b.sections[0].paragraphs.clear();
        assert!(b.validate().is_ok(), "a cover may be heading-only");
    }

    #[test]
    fn test_normalize_reorders_out_of_order_sections() {
        use SectionType::*;
        let b = brochure(&[About, CallToAction, Offerings, Cover, ValueProposition]).normalize();
        assert_eq!(
            b.section_types(),
            vec![Cover, About, Offerings, ValueProposition, CallToAction]
        );
        assert!(b.validate().is_ok());
    }

    #[test]
    fn test_normalize_drops_blank_text() {
        let b = BrochureContent {
            tagline: Some("   ".into()),
            sections: vec![Section::new(SectionType::Cover, "  Acme  ")
                .with_paragraph("  ")
                .with_bullets(["", " fast "])],
        }
        .normalize();
        assert!(b.tagline.is_none());
        assert_eq!(b.sections[0].heading, "Acme");
        assert!(b.sections[0].paragraphs.is_empty());
        assert_eq!(b.sections[0].bullets(), ["fast".to_string()]);
    }

    #[test]
    fn test_normalize_cannot_fix_missing_cover() {
        use SectionType::*;
        let b = brochure(&[About, Contact]).normalize();
        assert_eq!(b.validate(), Err(Violation::CoverCount(0)));
    }
}
