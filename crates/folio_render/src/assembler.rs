use chrono::{DateTime, Utc};
use folio_core::{BrochureContent, BrochureDocument, Error, Result};
use tracing::{debug, info};

use crate::layout::{Composer, Page};
use crate::pdf::{write_pdf, DocumentInfo};
use crate::templates::select_template;
use crate::theme::Theme;

/// Lays brochure copy out on the fixed templates and writes the PDF.
///
/// Rendering is synchronous and CPU bound; async callers should run it on
/// a blocking thread.
#[derive(Debug, Clone, Default)]
pub struct BrochureAssembler {
    theme: Theme,
}

impl BrochureAssembler {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn assemble(&self, content: &BrochureContent, company_name: &str) -> Result<BrochureDocument> {
        self.assemble_at(content, company_name, Utc::now())
    }

    /// Same as [`assemble`](Self::assemble) with a fixed timestamp; the
    /// output bytes depend only on the arguments.
    pub fn assemble_at(
        &self,
        content: &BrochureContent,
        company_name: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<BrochureDocument> {
        let pages = self.layout(content, company_name)?;
        let info = DocumentInfo {
            title: format!("{} brochure", company_name.trim()),
            author: company_name.trim().to_string(),
            created_at: generated_at,
        };
        let bytes = write_pdf(&pages, &info)?;

        info!(
            "📄 Rendered {} page(s) for {} ({} bytes)",
            pages.len(),
            company_name,
            bytes.len()
        );
        Ok(BrochureDocument {
            bytes,
            page_count: pages.len(),
            generated_at,
            company_name: company_name.to_string(),
            sections: content.section_types(),
        })
    }

    /// Positions every element without serializing.
    pub fn layout(&self, content: &BrochureContent, company_name: &str) -> Result<Vec<Page>> {
        if content.sections.is_empty() {
            return Err(Error::RenderFailure("brochure has no sections".to_string()));
        }
        if let Some(section) = content
            .sections
            .iter()
            .find(|s| s.heading.trim().is_empty() && !s.has_body())
        {
            return Err(Error::RenderFailure(format!(
                "{} section has neither heading nor body",
                section.section_type
            )));
        }

        let mut composer = Composer::new(&self.theme, company_name.trim(), content.tagline.as_deref());
        for (position, section) in content.sections.iter().enumerate() {
            let template = select_template(section.section_type, position);
            debug!("Section {} ({}) uses {:?}", position, section.section_type, template);
            composer.add_section(section, template);
        }
        Ok(composer.finish())
    }
}
