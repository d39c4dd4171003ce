use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier sent with every outbound page request and matched against
/// robots.txt groups.
pub const ROBOTS_TOKEN: &str = "FolioBrochureBot";

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; FolioBrochureBot/0.1; +https://github.com/folio-brochures/folio)";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub enrich: EnrichConfig,
    pub job: JobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound on pages per job, root included.
    pub max_pages: usize,
    pub request_timeout: Duration,
    /// Sub-pages fetched at once within one job.
    pub concurrency: usize,
    /// In-flight page requests across every job sharing the fetcher.
    pub max_concurrent_requests: usize,
    pub user_agent: String,
    pub respect_robots: bool,
    pub max_page_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_pages: 8,
            request_timeout: Duration::from_secs(20),
            concurrency: 4,
            max_concurrent_requests: 16,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            respect_robots: true,
            max_page_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Paragraph and list blocks shorter than this are treated as noise.
    pub min_block_chars: usize,
    pub min_heading_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_block_chars: 20,
            min_heading_chars: 4,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Backend name understood by `folio_inference::create_model`.
    pub model: String,
    pub model_url: Option<String>,
    pub model_name: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    /// Attempts per request when the backend is unreachable.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    /// Extra requests after a response that breaks the brochure schema.
    pub corrective_retries: u32,
    pub max_context_chars: usize,
    pub max_concurrent_requests: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            model: "gemini".to_string(),
            model_url: None,
            model_name: None,
            api_key: None,
            request_timeout: Duration::from_secs(60),
            max_attempts: 2,
            backoff_base: Duration::from_millis(500),
            corrective_retries: 1,
            max_context_chars: 24_000,
            max_concurrent_requests: 4,
        }
    }
}

impl fmt::Debug for EnrichConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichConfig")
            .field("model", &self.model)
            .field("model_url", &self.model_url)
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base", &self.backoff_base)
            .field("corrective_retries", &self.corrective_retries)
            .field("max_context_chars", &self.max_context_chars)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .finish()
    }
}

/// Per-stage time budgets. Their sum is the hard limit for a whole job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub fetch_budget: Duration,
    pub extract_budget: Duration,
    pub enrich_budget: Duration,
    pub assemble_budget: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            fetch_budget: Duration::from_secs(90),
            extract_budget: Duration::from_secs(10),
            enrich_budget: Duration::from_secs(240),
            assemble_budget: Duration::from_secs(20),
        }
    }
}

impl JobConfig {
    pub fn total_budget(&self) -> Duration {
        self.fetch_budget + self.extract_budget + self.enrich_budget + self.assemble_budget
    }

    /// Scales every stage so the total equals `total`, keeping proportions.
    pub fn with_total_budget(total: Duration) -> Self {
        let base = Self::default();
        let ratio = total.as_secs_f64() / base.total_budget().as_secs_f64();
        let scale = |d: Duration| Duration::from_secs_f64(d.as_secs_f64() * ratio);
        Self {
            fetch_budget: scale(base.fetch_budget),
            extract_budget: scale(base.extract_budget),
            enrich_budget: scale(base.enrich_budget),
            assemble_budget: scale(base.assemble_budget),
        }
    }
}

impl FolioConfig {
    /// Defaults overlaid with `FOLIO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(model) = lookup("FOLIO_MODEL") {
            config.enrich.model = model;
        }
        if let Some(url) = lookup("FOLIO_MODEL_URL") {
            config.enrich.model_url = Some(url);
        }
        if let Some(name) = lookup("FOLIO_MODEL_NAME") {
            config.enrich.model_name = Some(name);
        }
        config.enrich.api_key = lookup("FOLIO_API_KEY").or_else(|| lookup("GOOGLE_API_KEY"));

        if let Some(pages) = lookup("FOLIO_MAX_PAGES") {
            config.fetch.max_pages = pages
                .parse()
                .map_err(|_| Error::Config(format!("FOLIO_MAX_PAGES is not a number: {pages}")))?;
        }
        if let Some(agent) = lookup("FOLIO_USER_AGENT") {
            config.fetch.user_agent = agent;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_pages == 0 {
            return Err(Error::Config("fetch.max_pages must be at least 1".into()));
        }
        if self.fetch.concurrency == 0 || self.fetch.max_concurrent_requests == 0 {
            return Err(Error::Config("fetch concurrency limits must be at least 1".into()));
        }
        if self.enrich.max_attempts == 0 {
            return Err(Error::Config("enrich.max_attempts must be at least 1".into()));
        }
        if self.enrich.max_concurrent_requests == 0 {
            return Err(Error::Config(
                "enrich.max_concurrent_requests must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
