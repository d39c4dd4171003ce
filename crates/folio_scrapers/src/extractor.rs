use std::collections::{BTreeSet, HashSet};

use folio_core::config::ExtractConfig;
use folio_core::{
    BlockKind, ContactDetails, Error, PageContent, RawPage, Result, SiteContent, TextBlock,
};
use scraper::{ElementRef, Html, Node};
use tracing::{debug, info};
use url::Url;

use crate::classify::classify_page;
use crate::contact::extract_contact;
use crate::links::{canonical, resolve_link, same_site};
use crate::utils::{anchors, extract_text, normalize_whitespace};

/// Subtrees that never contribute text blocks.
const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "form", "nav", "header",
    "footer", "aside",
];

/// Subtrees whose text is never human-readable content.
const NON_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

fn block_kind(tag: &str) -> Option<BlockKind> {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(BlockKind::Heading),
        "p" | "blockquote" | "figcaption" => Some(BlockKind::Paragraph),
        "li" | "dd" => Some(BlockKind::ListItem),
        _ => None,
    }
}

fn is_stripped(element: &ElementRef) -> bool {
    let value = element.value();
    STRIPPED_TAGS.contains(&value.name())
        || value.attr("hidden").is_some()
        || value
            .attr("role")
            .is_some_and(|role| role.eq_ignore_ascii_case("navigation"))
        || value
            .attr("aria-hidden")
            .is_some_and(|hidden| hidden.eq_ignore_ascii_case("true"))
}

/// Turns raw pages into the normalized [`SiteContent`] record.
///
/// The output depends only on the set of input pages, not their order.
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor {
    config: ExtractConfig,
}

impl ContentExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Extracts every page, then sorts, deduplicates and drops empty pages.
    ///
    /// The first page is taken as the site root. Fails with
    /// [`Error::ExtractionEmpty`] when no text block survives.
    pub fn extract(&self, pages: &[RawPage]) -> Result<SiteContent> {
        let Some(root) = pages.first() else {
            return Err(Error::ExtractionEmpty);
        };
        let root_url = Url::parse(&root.url).ok();

        let mut extracted: Vec<(PageContent, ContactDetails)> = pages
            .iter()
            .map(|page| self.extract_page(page, root_url.as_ref()))
            .collect::<Result<_>>()?;

        extracted.sort_by(|(a, _), (b, _)| {
            a.category.cmp(&b.category).then_with(|| a.url.cmp(&b.url))
        });

        let mut seen: HashSet<String> = HashSet::new();
        let mut contact = ContactDetails::default();
        let mut kept = Vec::with_capacity(extracted.len());

        for (mut page, page_contact) in extracted {
            contact.merge(page_contact);
            let before = page.blocks.len();
            page.blocks.retain(|block| seen.insert(block.text.clone()));
            if page.blocks.len() < before {
                debug!(
                    "Dropped {} duplicate block(s) from {}",
                    before - page.blocks.len(),
                    page.url
                );
            }
            if page.blocks.is_empty() {
                debug!("Dropping {}: no text blocks left", page.url);
                continue;
            }
            kept.push(page);
        }

        let site = SiteContent {
            root_url: canonical_or_raw(&root.url),
            pages: kept,
            contact,
        };
        if !site.has_content() {
            return Err(Error::ExtractionEmpty);
        }

        info!(
            "📄 Extracted {} block(s) from {} page(s) of {}",
            site.block_count(),
            site.pages.len(),
            site.root_url
        );
        Ok(site)
    }

    fn extract_page(&self, page: &RawPage, root: Option<&Url>) -> Result<(PageContent, ContactDetails)> {
        let document = Html::parse_document(&page.html);
        let page_url = Url::parse(&page.url).ok();

        let title = extract_text(&document, "title")?
            .or(extract_text(&document, "h1")?)
            .unwrap_or_else(|| fallback_title(page_url.as_ref(), &page.url));
        let category = classify_page(&page.url, &title);

        let mut raw_blocks = Vec::new();
        collect_blocks(document.root_element(), &mut raw_blocks);
        let blocks: Vec<TextBlock> = raw_blocks
            .into_iter()
            .filter(|block| {
                let min = match block.kind {
                    BlockKind::Heading => self.config.min_heading_chars,
                    _ => self.config.min_block_chars,
                };
                block.text.chars().count() >= min
            })
            .collect();

        let mut links = BTreeSet::new();
        if let Some(base) = page_url.as_ref() {
            let site = root.unwrap_or(base);
            for (href, _) in anchors(&document)? {
                if let Some(link) = resolve_link(base, &href).filter(|l| same_site(site, l)) {
                    links.insert(canonical(&link));
                }
            }
        }

        let contact = extract_contact(&document, &page_text(&document))?;

        Ok((
            PageContent {
                url: canonical_or_raw(&page.url),
                title,
                category,
                blocks,
                links,
            },
            contact,
        ))
    }
}

fn canonical_or_raw(url: &str) -> String {
    Url::parse(url)
        .map(|u| canonical(&u))
        .unwrap_or_else(|_| url.to_string())
}

fn fallback_title(url: Option<&Url>, raw: &str) -> String {
    match url {
        Some(url) if url.path() != "/" => url.path().trim_matches('/').to_string(),
        Some(url) => url.host_str().unwrap_or(raw).to_string(),
        None => raw.to_string(),
    }
}

/// A block element wrapping other block elements is not a block itself; its
/// children are visited instead.
fn collect_blocks(element: ElementRef, out: &mut Vec<TextBlock>) {
    for child in element.children().filter_map(ElementRef::wrap) {
        if is_stripped(&child) {
            continue;
        }
        match block_kind(child.value().name()) {
            Some(kind) if !contains_block(&child) => {
                let mut text = String::new();
                push_block_text(child, &mut text);
                let text = normalize_whitespace(&text);
                if !text.is_empty() {
                    out.push(TextBlock::new(kind, text));
                }
            }
            _ => collect_blocks(child, out),
        }
    }
}

fn contains_block(element: &ElementRef) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|el| block_kind(el.value().name()).is_some())
}

fn push_block_text(element: ElementRef, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) if el.name() == "br" => buf.push(' '),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_stripped(&child_el) {
                        push_block_text(child_el, buf);
                    }
                }
            }
            _ => {}
        }
    }
}

/// All readable text of the page, chrome included, for contact harvesting.
fn page_text(document: &Html) -> String {
    let parts: Vec<&str> = document
        .root_element()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| NON_TEXT_TAGS.contains(&el.name()))
            })
        })
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();
    normalize_whitespace(&parts.join(" "))
}
