use folio_core::{ContactDetails, Result, SocialLink};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

use crate::jsonld::extract_organization;
use crate::utils::{anchors, extract_texts, normalize_whitespace};

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("valid email regex");
    static ref PHONE: Regex =
        Regex::new(r"\+?\(?\d[\d\s().-]{7,}\d").expect("valid phone regex");
    static ref SOCIAL: Vec<(&'static str, Regex)> = [
        ("LinkedIn", r"(?i)linkedin\.com/(company|in|showcase)/[\w-]+"),
        ("Facebook", r"(?i)facebook\.com/[\w.-]+"),
        ("X", r"(?i)(^|[/.])(twitter|x)\.com/[\w-]+"),
        ("Instagram", r"(?i)instagram\.com/[\w.-]+"),
        ("YouTube", r"(?i)youtube\.com/(channel/|c/|user/|@)[\w-]+"),
        ("GitHub", r"(?i)github\.com/[\w-]+"),
        ("TikTok", r"(?i)tiktok\.com/@[\w.-]+"),
    ]
    .into_iter()
    .map(|(platform, pattern)| (platform, Regex::new(pattern).expect("valid social regex")))
    .collect();
}

const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Contact facts found on one page: JSON-LD organization data first, then
/// `mailto:`/`tel:` links, `<address>` elements, social profile links and
/// finally emails and phone numbers mentioned in the visible text.
pub fn extract_contact(document: &Html, visible_text: &str) -> Result<ContactDetails> {
    let mut details = extract_organization(document);
    let mut found = ContactDetails::default();

    for (href, _) in anchors(document)? {
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("mailto:") {
            let address = href["mailto:".len()..].split('?').next().unwrap_or_default();
            if let Some(email) = clean_email(address) {
                found.emails.push(email);
            }
        } else if lower.starts_with("tel:") {
            if let Some(phone) = clean_phone(&href["tel:".len()..]) {
                found.phones.push(phone);
            }
        } else if let Some(platform) = social_platform(&href) {
            found.social.push(SocialLink {
                platform: platform.to_string(),
                url: href.clone(),
            });
        }
    }

    found.addresses = extract_texts(document, "address")?;

    for m in EMAIL.find_iter(visible_text) {
        if let Some(email) = clean_email(m.as_str()) {
            found.emails.push(email);
        }
    }
    for m in PHONE.find_iter(visible_text) {
        if let Some(phone) = clean_phone(m.as_str()) {
            found.phones.push(phone);
        }
    }

    details.merge(found);
    Ok(details)
}

fn social_platform(href: &str) -> Option<&'static str> {
    SOCIAL
        .iter()
        .find(|(_, pattern)| pattern.is_match(href))
        .map(|(platform, _)| *platform)
}

fn clean_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_ascii_lowercase();
    let valid = EMAIL.find(&email).is_some_and(|m| m.as_str() == email)
        && !IMAGE_SUFFIXES.iter().any(|s| email.ends_with(s));
    valid.then_some(email)
}

/// Keeps numbers with 9 to 15 digits, the range of real phone numbers.
fn clean_phone(raw: &str) -> Option<String> {
    let phone = normalize_whitespace(raw.trim().trim_end_matches(['.', '-']));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (9..=15).contains(&digits).then_some(phone)
}
