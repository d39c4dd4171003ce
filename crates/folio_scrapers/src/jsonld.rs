use folio_core::ContactDetails;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::utils::normalize_whitespace;

const ORGANIZATION_TYPES: &[&str] = &[
    "Organization",
    "Corporation",
    "LocalBusiness",
    "ProfessionalService",
    "Store",
    "OnlineStore",
    "NGO",
];

/// Extracts organization facts from JSON-LD metadata in the HTML document.
///
/// Looks at top-level objects, arrays of objects and `@graph` members whose
/// `@type` names an organization. The first organization found supplies the
/// name and description; emails, phones and addresses accumulate.
pub fn extract_organization(document: &Html) -> ContactDetails {
    let mut details = ContactDetails::default();

    if let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") {
        for script in document.select(&script_selector) {
            let Ok(json) = serde_json::from_str::<Value>(script.text().collect::<String>().trim())
            else {
                continue;
            };
            for node in organization_nodes(&json) {
                details.merge(organization_details(node));
            }
        }
    }

    details
}

fn organization_nodes(json: &Value) -> Vec<&Value> {
    match json {
        Value::Array(items) => items.iter().flat_map(organization_nodes).collect(),
        Value::Object(obj) => {
            let mut nodes = Vec::new();
            if is_organization(json) {
                nodes.push(json);
            }
            if let Some(graph) = obj.get("@graph") {
                nodes.extend(organization_nodes(graph));
            }
            if let Some(publisher) = obj.get("publisher").filter(|p| is_organization(p)) {
                nodes.push(publisher);
            }
            nodes
        }
        _ => Vec::new(),
    }
}

fn is_organization(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => ORGANIZATION_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| ORGANIZATION_TYPES.contains(&t)),
        _ => false,
    }
}

fn organization_details(node: &Value) -> ContactDetails {
    let text = |key: &str| {
        node.get(key)
            .and_then(Value::as_str)
            .map(normalize_whitespace)
            .filter(|s| !s.is_empty())
    };

    let mut details = ContactDetails {
        organization: text("name").or_else(|| text("legalName")),
        description: text("description").or_else(|| text("slogan")),
        ..Default::default()
    };

    if let Some(email) = text("email") {
        details.emails.push(email.trim_start_matches("mailto:").to_string());
    }
    if let Some(phone) = text("telephone") {
        details.phones.push(phone);
    }
    details.addresses.extend(addresses(node.get("address")));

    if let Some(points) = node.get("contactPoint") {
        let points: Vec<&Value> = match points {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for point in points {
            if let Some(phone) = point.get("telephone").and_then(Value::as_str) {
                details.phones.push(normalize_whitespace(phone));
            }
            if let Some(email) = point.get("email").and_then(Value::as_str) {
                details.emails.push(email.trim().trim_start_matches("mailto:").to_string());
            }
        }
    }

    details
}

fn addresses(value: Option<&Value>) -> Vec<String> {
    let found = match value {
        Some(Value::String(s)) => vec![normalize_whitespace(s)],
        Some(Value::Array(items)) => items.iter().flat_map(|v| addresses(Some(v))).collect(),
        Some(Value::Object(obj)) => {
            let parts: Vec<String> = [
                "streetAddress",
                "addressLocality",
                "addressRegion",
                "postalCode",
                "addressCountry",
            ]
            .iter()
            .filter_map(|key| obj.get(*key))
            .filter_map(|v| match v {
                Value::String(s) => Some(normalize_whitespace(s)),
                Value::Object(country) => country
                    .get("name")
                    .and_then(Value::as_str)
                    .map(normalize_whitespace),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect();
            if parts.is_empty() {
                Vec::new()
            } else {
                vec![parts.join(", ")]
            }
        }
        _ => Vec::new(),
    };
    found.into_iter().filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_organization_from_graph() {
        let html = r#"
            <script type="application/ld+json">
            {
              "@context": "https://schema.org",
              "@graph": [
                {"@type": "WebSite", "name": "Acme site"},
                {
                  "@type": ["Organization", "LocalBusiness"],
                  "name": "Acme Robotics",
                  "description": "Industrial   robots for small factories.",
                  "telephone": "+1 555 010 2000",
                  "address": {
                    "@type": "PostalAddress",
                    "streetAddress": "1 Main St",
                    "addressLocality": "Springfield",
                    "addressCountry": {"@type": "Country", "name": "US"}
                  },
                  "contactPoint": [{"@type": "ContactPoint", "email": "mailto:sales@acme.test"}]
                }
              ]
            }
            </script>
        "#;
        let details = extract_organization(&Html::parse_document(html));
        assert_eq!(details.organization.as_deref(), Some("Acme Robotics"));
        assert_eq!(
            details.description.as_deref(),
            Some("Industrial robots for small factories.")
        );
        assert_eq!(details.phones, vec!["+1 555 010 2000"]);
        assert_eq!(details.emails, vec!["sales@acme.test"]);
        assert_eq!(details.addresses, vec!["1 Main St, Springfield, US"]);
    }

    #[test]
    fn test_ignores_non_organizations_and_bad_json() {
        let html = r#"
            <script type="application/ld+json">{ not json</script>
            <script type="application/ld+json">{"@type": "Article", "name": "News"}</script>
        "#;
        assert!(extract_organization(&Html::parse_document(html)).is_empty());
    }

    #[test]
    fn test_publisher_organization() {
        let html = r#"
            <script type="application/ld+json">
            {"@type": "Article", "publisher": {"@type": "Organization", "name": "Acme"}}
            </script>
        "#;
        let details = extract_organization(&Html::parse_document(html));
        assert_eq!(details.organization.as_deref(), Some("Acme"));
    }
}
