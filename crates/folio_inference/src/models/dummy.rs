use std::fmt;

use folio_core::{BrochureContent, CompletionRequest, InferenceModel, Result, Section, SectionType};

use crate::prompt::{COMPANY_LINE, CONTENT_MARKER};

/// Offline backend that lays out a valid brochure from the prompt's own
/// website content. Useful for demos and for running without an API key.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

fn first_words(text: &str, count: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().take(count).collect();
    words.join(" ")
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let company = request
            .user
            .lines()
            .find_map(|line| line.strip_prefix(COMPANY_LINE))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Our Company");

        let content = request
            .user
            .split_once(CONTENT_MARKER)
            .map_or("", |(_, rest)| rest);

        let mut paragraphs = Vec::new();
        let mut bullets = Vec::new();
        for line in content.lines().map(str::trim) {
            let is_label = line.contains(": ") && !line.contains(". ");
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') || is_label {
                continue;
            }
            match line.strip_prefix("- ") {
                Some(item) => bullets.push(item.to_string()),
                None => paragraphs.push(line.to_string()),
            }
        }

        let intro = paragraphs
            .first()
            .map(|p| first_words(p, 20))
            .unwrap_or_else(|| format!("{company} at a glance."));

        let mut sections = vec![Section::new(SectionType::Cover, company).with_paragraph(intro)];

        let about = Section::new(SectionType::About, format!("About {company}"));
        let about = if paragraphs.len() > 1 {
            paragraphs.iter().skip(1).take(3).fold(about, |s, p| s.with_paragraph(p.clone()))
        } else {
            about.with_paragraph(format!(
                "{company} serves its customers with focus and care."
            ))
        };
        sections.push(about);

        if !bullets.is_empty() {
            sections.push(
                Section::new(SectionType::Offerings, "What We Offer")
                    .with_bullets(bullets.iter().take(8).cloned()),
            );
        }

        sections.push(
            Section::new(SectionType::CallToAction, "Let's Work Together")
                .with_paragraph(format!("Contact {company} to learn more.")),
        );

        let brochure = BrochureContent {
            tagline: Some(format!("Introducing {company}")),
            sections,
        };
        Ok(serde_json::to_string(&brochure)?)
    }
}
