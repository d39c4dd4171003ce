//! Prompt construction and response parsing for brochure copy.

use folio_core::{BlockKind, BrochureContent, CompletionRequest, SiteContent};

pub const COMPANY_LINE: &str = "Company name: ";
pub const CONTENT_MARKER: &str = "Website content:";
const TRUNCATION_NOTE: &str = "[remaining website content omitted]";
const MAX_ECHOED_RESPONSE_CHARS: usize = 4000;

pub const SYSTEM_PROMPT: &str = r#"You are a senior corporate copywriter who turns scraped website text into a polished, print-ready sales brochure.

Write in a confident, professional tone. Stay factual: only state figures, addresses, names and claims that appear in the website content. Where information is missing, use safe general language instead of inventing specifics. Expand and restructure the material; do not just repeat it.

Respond with a single JSON object and nothing else, using this schema:

{
  "tagline": "one short line for the cover",
  "sections": [
    {
      "type": "cover" | "about" | "offerings" | "valueProposition" | "callToAction" | "contact",
      "heading": "section heading",
      "paragraphs": ["one or more paragraphs"],
      "bullets": ["optional bullet points"]
    }
  ]
}

Ordering rules:
- The first section is the only "cover" section.
- The brochure ends with "callToAction" and/or "contact"; each appears at most once and only at the end.
- Sections in between are "about", "offerings" or "valueProposition", in any order.
- Every section has a non-empty heading. Every section except the cover has at least one paragraph or bullet."#;

/// Serializes extracted content into at most `max_chars` characters.
///
/// Pages arrive in relevance order, so cutting lines from the tail drops
/// `other` pages before `about`, `product` or `contact` material.
pub fn build_context(site: &SiteContent, max_chars: usize) -> String {
    let mut lines: Vec<String> = vec![format!("Website: {}", site.root_url)];

    let contact = &site.contact;
    if let Some(org) = &contact.organization {
        lines.push(format!("Organization: {org}"));
    }
    if let Some(description) = &contact.description {
        lines.push(format!("Description: {description}"));
    }
    if !contact.emails.is_empty() {
        lines.push(format!("Emails: {}", contact.emails.join(", ")));
    }
    if !contact.phones.is_empty() {
        lines.push(format!("Phones: {}", contact.phones.join(", ")));
    }
    for address in &contact.addresses {
        lines.push(format!("Address: {address}"));
    }
    for link in &contact.social {
        lines.push(format!("{}: {}", link.platform, link.url));
    }

    for page in &site.pages {
        lines.push(String::new());
        lines.push(format!("## {}: {} ({})", page.category, page.title, page.url));
        for block in &page.blocks {
            lines.push(match block.kind {
                BlockKind::Heading => format!("# {}", block.text),
                BlockKind::ListItem => format!("- {}", block.text),
                BlockKind::Paragraph => block.text.clone(),
            });
        }
    }

    let mut context = String::new();
    let mut used = 0;
    let budget = max_chars.saturating_sub(TRUNCATION_NOTE.chars().count() + 1);
    for (i, line) in lines.iter().enumerate() {
        let cost = line.chars().count() + 1;
        if used + cost > budget {
            let rest: usize = lines[i..].iter().map(|l| l.chars().count() + 1).sum();
            if used + rest <= max_chars {
                // Everything left fits once the note is not needed.
                for line in &lines[i..] {
                    context.push_str(line);
                    context.push('\n');
                }
            } else if max_chars > used + TRUNCATION_NOTE.chars().count() {
                context.push_str(TRUNCATION_NOTE);
                context.push('\n');
            }
            return context;
        }
        context.push_str(line);
        context.push('\n');
        used += cost;
    }
    context
}

pub fn initial_request(company_name: &str, context: &str) -> CompletionRequest {
    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: format!(
            "Write the brochure for the company below.\n\n{COMPANY_LINE}{company_name}\n\n{CONTENT_MARKER}\n{context}"
        ),
        json_response: true,
    }
}

/// A stricter re-request naming what was wrong with `previous`.
pub fn corrective_request(
    company_name: &str,
    context: &str,
    previous: &str,
    problem: &str,
) -> CompletionRequest {
    let echoed: String = previous.chars().take(MAX_ECHOED_RESPONSE_CHARS).collect();
    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: format!(
            "Your previous answer was rejected: {problem}.\n\
             Return a corrected JSON object that follows the schema and every ordering rule exactly. \
             Output only the JSON object, with no commentary and no code fences.\n\n\
             Previous answer:\n{echoed}\n\n\
             {COMPANY_LINE}{company_name}\n\n{CONTENT_MARKER}\n{context}"
        ),
        json_response: true,
    }
}

/// Removes Markdown code fences and any prose around the JSON object.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parses, normalizes and validates a backend response. The error is a
/// description of the problem suitable for a corrective prompt.
pub fn parse_brochure(raw: &str) -> std::result::Result<BrochureContent, String> {
    let json = strip_code_fences(raw);
    let content: BrochureContent = serde_json::from_str(json)
        .map_err(|e| format!("the response is not a JSON object matching the schema ({e})"))?;
    let content = content.normalize();
    content.validate().map_err(|violation| violation.to_string())?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{ContactDetails, PageCategory, PageContent, SectionType, TextBlock};
    use std::collections::BTreeSet;

    fn page(category: PageCategory, url: &str, texts: &[&str]) -> PageContent {
        PageContent {
            url: url.to_string(),
            title: url.to_string(),
            category,
            blocks: texts
                .iter()
                .map(|t| TextBlock::new(BlockKind::Paragraph, *t))
                .collect(),
            links: BTreeSet::new(),
        }
    }

    fn site() -> SiteContent {
        SiteContent {
            root_url: "https://acme.test".to_string(),
            pages: vec![
                page(PageCategory::Home, "https://acme.test", &["Home paragraph"]),
                page(PageCategory::About, "https://acme.test/about", &["About paragraph"]),
                page(PageCategory::Other, "https://acme.test/blog", &["Blog paragraph one", "Blog paragraph two"]),
            ],
            contact: ContactDetails {
                emails: vec!["hi@acme.test".to_string()],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_context_fits_untruncated() {
        let context = build_context(&site(), 10_000);
        assert!(context.starts_with("Website: https://acme.test\nEmails: hi@acme.test\n"));
        assert!(context.contains("## about: https://acme.test/about"));
        assert!(context.contains("Blog paragraph two"));
        assert!(!context.contains(TRUNCATION_NOTE));
    }

    #[test]
    fn test_context_truncates_low_priority_pages_first() {
        let full = build_context(&site(), 10_000);
        let limit = full.find("Blog paragraph one").unwrap() + TRUNCATION_NOTE.len() + 1;
        let context = build_context(&site(), limit);
        assert!(context.chars().count() <= limit);
        assert!(context.contains("About paragraph"));
        assert!(!context.contains("Blog paragraph two"));
        assert!(context.contains(TRUNCATION_NOTE));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("Here you go: {\"a\": 1} enjoy"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_brochure_normalizes_order() {
        let raw = r#"```json
        {"tagline": "Robots that work",
         "sections": [
           {"type": "about", "heading": "About", "paragraphs": ["We build robots."]},
           {"type": "cover", "heading": "Acme", "paragraphs": []},
           {"type": "callToAction", "heading": "Talk to us", "paragraphs": ["Book a demo."]}
         ]}
        ```"#;
        let content = parse_brochure(raw).unwrap();
        assert_eq!(
            content.section_types(),
            vec![SectionType::Cover, SectionType::About, SectionType::CallToAction]
        );
    }

    #[test]
    fn test_parse_brochure_reports_problems() {
        let err = parse_brochure("not json at all").unwrap_err();
        assert!(err.contains("not a JSON object"));

        let raw = r#"{"sections": [
            {"type": "cover", "heading": "Acme"},
            {"type": "about", "heading": "About", "paragraphs": ["We build robots."]}
        ]}"#;
        let err = parse_brochure(raw).unwrap_err();
        assert!(err.contains("callToAction or contact"), "{err}");
    }

    #[test]
    fn test_requests_carry_company_and_context() {
        let request = initial_request("Acme", "Website: https://acme.test\n");
        assert!(request.json_response);
        assert!(request.user.contains("Company name: Acme"));
        assert!(request.user.contains("Website content:\nWebsite: https://acme.test"));

        let retry = corrective_request("Acme", "ctx", "{}", "the brochure has no sections");
        assert!(retry.user.starts_with("Your previous answer was rejected: the brochure has no sections."));
    }
}
