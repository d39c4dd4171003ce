use folio_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Scraping(format!("Invalid selector {css}: {e}")))
}

/// Collapses every whitespace run to one space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn element_text(element: &ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

pub fn extract_text(document: &Html, css: &str) -> Result<Option<String>> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty()))
}

pub fn extract_texts(document: &Html, css: &str) -> Result<Vec<String>> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
        .collect())
}

/// `(href, anchor text)` for every anchor carrying an href.
pub fn anchors(document: &Html) -> Result<Vec<(String, String)>> {
    let selector = selector("a[href]")?;
    Ok(document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim().to_string();
            let label = el
                .value()
                .attr("title")
                .or_else(|| el.value().attr("aria-label"))
                .map(normalize_whitespace)
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| element_text(&el));
            Some((href, label))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_extract_text() {
        let html = r#"
            <div class="title">Test   Title</div>
            <div class="content">Test Content</div>
        "#;
        let document = Html::parse_document(html);

        assert_eq!(
            extract_text(&document, ".title").unwrap().as_deref(),
            Some("Test Title")
        );
        assert_eq!(extract_text(&document, ".missing").unwrap(), None);
        assert!(extract_text(&document, "::<>").is_err());
    }

    #[test]
    fn test_extract_texts() {
        let html = r#"
            <div class="item">Item 1</div>
            <div class="item">Item 2</div>
            <div class="item">  </div>
        "#;
        let document = Html::parse_document(html);

        let texts = extract_texts(&document, ".item").unwrap();
        assert_eq!(texts, vec!["Item 1", "Item 2"]);
    }

    #[test]
    fn test_anchors_prefer_title_attribute() {
        let document = Html::parse_document(
            r#"<a href="/a">About us</a><a href=" /b " title="Products"><img src="x.png"></a>"#,
        );
        let links = anchors(&document).unwrap();
        assert_eq!(
            links,
            vec![
                ("/a".to_string(), "About us".to_string()),
                ("/b".to_string(), "Products".to_string()),
            ]
        );
    }
}
