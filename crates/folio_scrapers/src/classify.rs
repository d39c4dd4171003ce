//! Keyword heuristics that tag pages and links with a [`PageCategory`].
//!
//! Everything here is a pure function of its input so the fetcher (ranking
//! links) and the extractor (tagging pages) agree on the same rules.

use folio_core::PageCategory;
use url::Url;

const ABOUT_TOKENS: &[&str] = &[
    "about", "company", "team", "leadership", "mission", "history", "story", "values", "culture",
    "people", "vision",
];
const ABOUT_PHRASES: &[&str] = &["who we are", "our story", "about us"];

const PRODUCT_TOKENS: &[&str] = &[
    "product", "service", "solution", "pricing", "price", "plan", "feature", "offering",
    "platform", "industry", "industries", "capabilities", "catalog", "shop",
];
const PRODUCT_PHRASES: &[&str] = &["what we do", "how it works"];

const CONTACT_TOKENS: &[&str] = &["contact", "location", "office", "enquiry", "inquiry", "reach"];
const CONTACT_PHRASES: &[&str] = &["get in touch", "talk to us", "book a demo"];

const HOME_PATHS: &[&str] = &["", "/", "/index", "/index.html", "/index.htm", "/home"];

/// Lowercases and splits on anything that is not alphanumeric.
fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn token_matches(token: &str, keys: &[&str]) -> bool {
    keys.iter().any(|key| {
        token == *key
            || token.strip_suffix('s') == Some(*key)
            || token.strip_suffix("es") == Some(*key)
    })
}

/// Matches free text (a path segment, a title, anchor text) against the
/// category keyword sets. About wins over product, product over contact.
pub fn match_text(text: &str) -> Option<PageCategory> {
    let words = tokens(text);
    if words.is_empty() {
        return None;
    }
    let joined = words.join(" ");
    let hit = |keys: &[&str], phrases: &[&str]| {
        phrases.iter().any(|p| joined.contains(p)) || words.iter().any(|w| token_matches(w, keys))
    };

    if hit(ABOUT_TOKENS, ABOUT_PHRASES) {
        Some(PageCategory::About)
    } else if hit(PRODUCT_TOKENS, PRODUCT_PHRASES) {
        Some(PageCategory::Product)
    } else if hit(CONTACT_TOKENS, CONTACT_PHRASES) {
        Some(PageCategory::Contact)
    } else {
        None
    }
}

pub fn is_home_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    HOME_PATHS.contains(&lower.trim_end_matches('/'))
}

fn classify_path(path: &str) -> Option<PageCategory> {
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    match_text(last).or_else(|| match_text(path))
}

/// Category of a fetched page from its URL path, then its title.
pub fn classify_page(url: &str, title: &str) -> PageCategory {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    if is_home_path(&path) {
        return PageCategory::Home;
    }
    classify_path(&path)
        .or_else(|| match_text(title))
        .unwrap_or(PageCategory::Other)
}

/// Category of a candidate link from its path, then its anchor text.
pub fn classify_link(url: &Url, anchor_text: &str) -> PageCategory {
    if is_home_path(url.path()) {
        return PageCategory::Home;
    }
    classify_path(url.path())
        .or_else(|| match_text(anchor_text))
        .unwrap_or(PageCategory::Other)
}

/// Fetch order for candidate links: about, product, contact, everything
/// else, and root aliases last.
pub fn link_rank(category: PageCategory) -> u8 {
    match category {
        PageCategory::About => 0,
        PageCategory::Product => 1,
        PageCategory::Contact => 2,
        PageCategory::Other => 3,
        PageCategory::Home => 4,
    }
}
