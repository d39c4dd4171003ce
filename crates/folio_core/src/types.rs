use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound generation request, shaped like the JSON the web form posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrochureRequest {
    pub company_name: String,
    pub company_url: String,
}

impl BrochureRequest {
    pub fn new(company_name: impl Into<String>, company_url: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            company_url: company_url.into(),
        }
    }
}

/// One fetched page, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub html: String,
}

/// Page categories. Declaration order is relevance order: pages sort and
/// truncate by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCategory {
    Home,
    About,
    Product,
    Contact,
    Other,
}

impl PageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageCategory::Home => "home",
            PageCategory::About => "about",
            PageCategory::Product => "product",
            PageCategory::Contact => "contact",
            PageCategory::Other => "other",
        }
    }
}

impl fmt::Display for PageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Heading,
    Paragraph,
    ListItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: String,
}

impl TextBlock {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub category: PageCategory,
    pub blocks: Vec<TextBlock>,
    pub links: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// Contact facts harvested across all pages of a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub organization: Option<String>,
    pub description: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub addresses: Vec<String>,
    pub social: Vec<SocialLink>,
}

impl ContactDetails {
    pub fn is_empty(&self) -> bool {
        self.organization.is_none()
            && self.description.is_none()
            && self.emails.is_empty()
            && self.phones.is_empty()
            && self.addresses.is_empty()
            && self.social.is_empty()
    }

    /// Folds `other` into `self`, keeping first-seen order and existing scalars.
    pub fn merge(&mut self, other: ContactDetails) {
        if self.organization.is_none() {
            self.organization = other.organization;
        }
        if self.description.is_none() {
            self.description = other.description;
        }
        push_unique(&mut self.emails, other.emails);
        push_unique(&mut self.phones, other.phones);
        push_unique(&mut self.addresses, other.addresses);
        for link in other.social {
            if !self.social.iter().any(|s| s.platform == link.platform) {
                self.social.push(link);
            }
        }
    }
}

fn push_unique(into: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

/// Normalized extraction of a whole website.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteContent {
    pub root_url: String,
    pub pages: Vec<PageContent>,
    #[serde(default)]
    pub contact: ContactDetails,
}

impl SiteContent {
    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }

    pub fn has_content(&self) -> bool {
        self.pages.iter().any(|p| !p.blocks.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionType {
    Cover,
    About,
    Offerings,
    ValueProposition,
    CallToAction,
    Contact,
}

impl SectionType {
    pub const ALL: [SectionType; 6] = [
        SectionType::Cover,
        SectionType::About,
        SectionType::Offerings,
        SectionType::ValueProposition,
        SectionType::CallToAction,
        SectionType::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Cover => "cover",
            SectionType::About => "about",
            SectionType::Offerings => "offerings",
            SectionType::ValueProposition => "valueProposition",
            SectionType::CallToAction => "callToAction",
            SectionType::Contact => "contact",
        }
    }

    /// Whether this section may close the brochure.
    pub fn is_closing(&self) -> bool {
        matches!(self, SectionType::CallToAction | SectionType::Contact)
    }

    /// Small caps label printed above interior headings.
    pub fn label(&self) -> &'static str {
        match self {
            SectionType::Cover => "Overview",
            SectionType::About => "Company Overview",
            SectionType::Offerings => "Products & Solutions",
            SectionType::ValueProposition => "Why Choose Us",
            SectionType::CallToAction => "Next Steps",
            SectionType::Contact => "Get In Touch",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,
}

impl Section {
    pub fn new(section_type: SectionType, heading: impl Into<String>) -> Self {
        Self {
            section_type,
            heading: heading.into(),
            paragraphs: Vec::new(),
            bullets: None,
        }
    }

    pub fn with_paragraph(mut self, paragraph: impl Into<String>) -> Self {
        self.paragraphs.push(paragraph.into());
        self
    }

    pub fn with_bullets<I, S>(mut self, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bullets = Some(bullets.into_iter().map(Into::into).collect());
        self
    }

    pub fn bullets(&self) -> &[String] {
        self.bullets.as_deref().unwrap_or(&[])
    }

    pub fn has_body(&self) -> bool {
        !self.paragraphs.is_empty() || !self.bullets().is_empty()
    }
}

/// Structured brochure copy as returned by the enricher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrochureContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    pub sections: Vec<Section>,
}

impl BrochureContent {
    pub fn section_types(&self) -> Vec<SectionType> {
        self.sections.iter().map(|s| s.section_type).collect()
    }
}

/// The rendered artifact.
#[derive(Clone)]
pub struct BrochureDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub generated_at: DateTime<Utc>,
    pub company_name: String,
    pub sections: Vec<SectionType>,
}

impl fmt::Debug for BrochureDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrochureDocument")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("page_count", &self.page_count)
            .field("generated_at", &self.generated_at)
            .field("company_name", &self.company_name)
            .field("sections", &self.sections)
            .finish()
    }
}
