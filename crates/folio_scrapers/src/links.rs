use folio_core::{Error, Result};
use url::Url;

const ASSET_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "css", "js", "json", "xml", "zip",
    "gz", "mp3", "mp4", "mov", "avi", "woff", "woff2", "ttf", "eot", "doc", "docx", "xls", "xlsx",
    "ppt", "pptx", "rss",
];

/// Second-level labels that sit under a two-letter country code, as in
/// `example.co.uk`.
const SECOND_LEVEL_LABELS: &[&str] = &["co", "com", "org", "net", "ac", "gov", "edu"];

/// Parses user input into the URL the fetch starts from: https is assumed
/// when no scheme is given, fragments are dropped and a trailing slash on
/// the path is removed.
pub fn normalize_root_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "{trimmed}: unsupported scheme {}",
            url.scheme()
        )));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(Error::InvalidUrl(format!("{trimmed}: missing host"))),
    }

    url.set_fragment(None);
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    Ok(url)
}

/// String form used for identity and output: the `url` crate always keeps a
/// `/` for an empty path, which is dropped here.
pub fn canonical(url: &Url) -> String {
    let s = url.as_str();
    if url.query().is_none() {
        s.trim_end_matches('/').to_string()
    } else {
        s.to_string()
    }
}

/// Resolves an href found on `base` into a crawlable page URL. Query strings
/// and fragments are dropped; non-page schemes and static assets yield `None`.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if ["mailto:", "tel:", "javascript:", "data:", "sms:", "ftp:"]
        .iter()
        .any(|p| lower.starts_with(p))
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    url.set_query(None);

    if let Some(ext) = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
    {
        if ASSET_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
    }
    Some(url)
}

/// Approximate registrable domain of a host, without a public suffix list.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.parse::<std::net::IpAddr>().is_ok() || host.starts_with('[') {
        return host;
    }
    let labels: Vec<&str> = host.split('.').collect();
    let n = labels.len();
    if n <= 2 {
        return host;
    }
    let keep = if labels[n - 1].len() == 2 && SECOND_LEVEL_LABELS.contains(&labels[n - 2]) {
        3
    } else {
        2
    };
    labels[n - keep..].join(".")
}

pub fn same_site(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => registrable_domain(ha) == registrable_domain(hb),
        _ => false,
    }
}
