use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use folio_core::config::{FetchConfig, ROBOTS_TOKEN};
use folio_core::{CancellationToken, Error, PageCategory, RawPage, Result};
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::Html;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::classify::{classify_link, link_rank};
use crate::links::{canonical, normalize_root_url, resolve_link, same_site};
use crate::robots::RobotsPolicy;
use crate::utils::{anchors, selector};

/// An internal link found on the root page, ranked for fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub url: Url,
    pub category: PageCategory,
    pub anchor_text: String,
}

#[derive(Debug)]
enum PageError {
    Status(u16),
    Timeout(Duration),
    NotHtml(String),
    Transport(reqwest::Error),
    Cancelled,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::Status(code) => write!(f, "HTTP status {code}"),
            PageError::Timeout(t) => write!(f, "timed out after {t:?}"),
            PageError::NotHtml(ct) => write!(f, "not an HTML page ({ct})"),
            PageError::Transport(e) => write!(f, "request failed: {e}"),
            PageError::Cancelled => f.write_str("cancelled"),
        }
    }
}

struct FetchedPage {
    final_url: Url,
    html: String,
}

/// Retrieves the root page of a site plus a bounded set of same-site pages.
///
/// One fetcher is meant to be shared by every job in the process: its
/// semaphore caps in-flight page requests across all of them.
pub struct SiteFetcher {
    client: Client,
    config: FetchConfig,
    limiter: Arc<Semaphore>,
}

impl fmt::Debug for SiteFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteFetcher")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .field("available_permits", &self.limiter.available_permits())
            .finish()
    }
}

impl SiteFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// [`fetch`](Self::fetch) with the configured page limit and timeout.
    pub async fn fetch_site(&self, root_url: &str, cancel: &CancellationToken) -> Result<Vec<RawPage>> {
        self.fetch(
            root_url,
            self.config.max_pages,
            self.config.request_timeout,
            cancel,
        )
        .await
    }

    /// Fetches `root_url` and up to `max_pages - 1` linked pages.
    ///
    /// The root page always comes first in the output; the rest follow in
    /// candidate rank order regardless of which request finished first.
    /// Failing sub-pages are logged and skipped. A failing root is fatal.
    pub async fn fetch(
        &self,
        root_url: &str,
        max_pages: usize,
        per_request_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawPage>> {
        let root = normalize_root_url(root_url)?;
        let root_key = canonical(&root);

        let robots = if self.config.respect_robots {
            self.load_robots(&root, per_request_timeout, cancel).await?
        } else {
            RobotsPolicy::allow_all()
        };
        if !robots.is_allowed(root.path()) {
            return Err(Error::FetchRootFailed {
                url: root_key,
                reason: "disallowed by robots.txt".to_string(),
            });
        }

        let root_page = match self.get_page(&root, per_request_timeout, cancel).await {
            Ok(page) => page,
            Err(PageError::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                return Err(Error::FetchRootFailed {
                    url: root_key,
                    reason: e.to_string(),
                })
            }
        };
        info!("🌐 Fetched root page {} ({} bytes)", root_key, root_page.html.len());

        let mut pages = vec![RawPage {
            url: canonical(&root_page.final_url),
            html: root_page.html,
        }];
        if max_pages <= 1 {
            return Ok(pages);
        }

        let candidates = discover_links(&root_page.final_url, &pages[0].html, &robots)?;
        debug!("Found {} candidate links on {}", candidates.len(), root_key);

        let target = max_pages - 1;
        let mut seen: HashSet<String> = HashSet::from([pages[0].url.clone()]);
        let mut remaining = candidates.into_iter();
        let concurrency = self.config.concurrency.max(1);

        while pages.len() - 1 < target {
            let needed = target - (pages.len() - 1);
            let batch: Vec<LinkCandidate> = remaining.by_ref().take(needed).collect();
            if batch.is_empty() {
                break;
            }

            let results: Vec<_> = stream::iter(batch)
                .map(|candidate| async move {
                    let result = self.get_page(&candidate.url, per_request_timeout, cancel).await;
                    (candidate, result)
                })
                .buffered(concurrency)
                .collect()
                .await;

            for (candidate, result) in results {
                match result {
                    Ok(page) => {
                        let url = canonical(&page.final_url);
                        if seen.insert(url.clone()) {
                            debug!("Fetched {} page {}", candidate.category, url);
                            pages.push(RawPage {
                                url,
                                html: page.html,
                            });
                        } else {
                            debug!("Skipping {}: redirected to an already fetched page", candidate.url);
                        }
                    }
                    Err(PageError::Cancelled) => return Err(Error::Cancelled),
                    Err(e) => warn!("⚠️ Skipping {}: {}", candidate.url, e),
                }
            }
        }

        info!("🌐 Fetched {} page(s) for {}", pages.len(), root_key);
        Ok(pages)
    }

    async fn load_robots(
        &self,
        root: &Url,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<RobotsPolicy> {
        let Ok(robots_url) = root.join("/robots.txt") else {
            return Ok(RobotsPolicy::allow_all());
        };

        let request = async {
            let response = self.client.get(robots_url).send().await?;
            if !response.status().is_success() {
                return Ok::<_, reqwest::Error>(None);
            }
            Ok(Some(response.text().await?))
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(timeout, request) => Ok(match result {
                Ok(Ok(Some(body))) => RobotsPolicy::parse(&body, ROBOTS_TOKEN),
                Ok(Ok(None)) => RobotsPolicy::allow_all(),
                Ok(Err(e)) => {
                    debug!("robots.txt unavailable for {}: {}", root, e);
                    RobotsPolicy::allow_all()
                }
                Err(_) => {
                    debug!("robots.txt timed out for {}", root);
                    RobotsPolicy::allow_all()
                }
            }),
        }
    }

    async fn get_page(
        &self,
        url: &Url,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> std::result::Result<FetchedPage, PageError> {
        let _permit = tokio::select! {
            _ = cancel.cancelled() => return Err(PageError::Cancelled),
            permit = self.limiter.acquire() => permit.map_err(|_| PageError::Cancelled)?,
        };

        let max_bytes = self.config.max_page_bytes;
        let request = async {
            let mut response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(PageError::Transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(PageError::Status(status.as_u16()));
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_ascii_lowercase();
            if !content_type.is_empty()
                && !content_type.contains("text/html")
                && !content_type.contains("application/xhtml")
            {
                return Err(PageError::NotHtml(content_type));
            }

            let final_url = response.url().clone();
            let mut body: Vec<u8> = Vec::new();
            while let Some(chunk) = response.chunk().await.map_err(PageError::Transport)? {
                let room = max_bytes - body.len();
                if chunk.len() >= room {
                    body.extend_from_slice(&chunk[..room]);
                    body.truncate(char_boundary(&body));
                    debug!("Truncated {} at {} bytes", final_url, body.len());
                    break;
                }
                body.extend_from_slice(&chunk);
            }

            Ok(FetchedPage {
                final_url,
                html: String::from_utf8_lossy(&body).into_owned(),
            })
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(PageError::Cancelled),
            result = tokio::time::timeout(timeout, request) => {
                result.unwrap_or_else(|_| Err(PageError::Timeout(timeout)))
            }
        }
    }
}

/// Length of `bytes` without a trailing partial UTF-8 sequence.
fn char_boundary(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let continuation = bytes
        .iter()
        .rev()
        .take(3)
        .take_while(|b| (**b & 0xC0) == 0x80)
        .count();
    let Some(lead_at) = len.checked_sub(continuation + 1) else {
        return len;
    };
    let width = match bytes[lead_at] {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        b if b >= 0xC0 => 2,
        _ => return len,
    };
    if width > continuation + 1 {
        lead_at
    } else {
        len
    }
}

/// Ranks the same-site links of a page: about, product, contact, then the
/// rest, each group in document order.
pub fn discover_links(base: &Url, html: &str, robots: &RobotsPolicy) -> Result<Vec<LinkCandidate>> {
    let document = Html::parse_document(html);
    if has_nofollow(&document)? {
        debug!("{} asks robots not to follow its links", base);
        return Ok(Vec::new());
    }

    let mut seen: HashSet<String> = HashSet::from([canonical(base)]);
    let mut candidates = Vec::new();

    for (href, text) in anchors(&document)? {
        let Some(url) = resolve_link(base, &href) else {
            continue;
        };
        if !same_site(base, &url) || !seen.insert(canonical(&url)) {
            continue;
        }
        if !robots.is_allowed(url.path()) {
            debug!("robots.txt disallows {}", url);
            continue;
        }
        let category = classify_link(&url, &text);
        candidates.push(LinkCandidate {
            url,
            category,
            anchor_text: text,
        });
    }

    candidates.sort_by_key(|c| link_rank(c.category));
    Ok(candidates)
}

fn has_nofollow(document: &Html) -> Result<bool> {
    let meta = selector("meta[name][content]")?;
    Ok(document.select(&meta).any(|el| {
        let name = el.value().attr("name").unwrap_or_default();
        let content = el.value().attr("content").unwrap_or_default().to_ascii_lowercase();
        name.eq_ignore_ascii_case("robots") && (content.contains("nofollow") || content.contains("none"))
    }))
}
