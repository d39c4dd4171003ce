use std::sync::Arc;

use async_trait::async_trait;
use folio_core::config::EnrichConfig;
use folio_core::{
    BrochureContent, CancellationToken, CompletionRequest, Enricher, Error, InferenceModel, Result,
    SiteContent,
};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::models::create_model;
use crate::prompt;

/// Writes brochure copy with a language model, retrying unreachable
/// backends and correcting responses that break the brochure rules.
///
/// Clone it (or share it) across jobs: clones keep the same semaphore, so
/// `max_concurrent_requests` holds for the whole process.
#[derive(Debug, Clone)]
pub struct NarrativeEnricher {
    model: Arc<dyn InferenceModel>,
    config: EnrichConfig,
    limiter: Arc<Semaphore>,
}

impl NarrativeEnricher {
    pub fn new(model: Arc<dyn InferenceModel>, config: EnrichConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
        Self {
            model,
            config,
            limiter,
        }
    }

    pub fn from_config(config: &EnrichConfig) -> Result<Self> {
        Ok(Self::new(create_model(config)?, config.clone()))
    }

    pub fn model(&self) -> &Arc<dyn InferenceModel> {
        &self.model
    }

    /// Sends one request, retrying transient failures (the per-call timeout
    /// included) with exponential backoff. After the last attempt, or on an
    /// error another attempt cannot fix, the error is `EnrichmentUnavailable`.
    async fn call_with_retries(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let max_attempts = self.config.max_attempts.max(1);
        let per_call = self.config.request_timeout;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    permit = self.limiter.acquire() => permit.map_err(|_| Error::Cancelled)?,
                };
                tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    result = tokio::time::timeout(per_call, self.model.complete(request)) => result,
                }
            };

            let error = match outcome {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(Error::Cancelled)) => return Err(Error::Cancelled),
                Ok(Err(e)) => e,
                Err(_) => Error::Timeout(per_call),
            };

            if attempt >= max_attempts || !error.is_transient() {
                warn!(
                    "❌ {} unavailable after {} attempt(s): {}",
                    self.model.name(),
                    attempt,
                    error
                );
                return Err(Error::EnrichmentUnavailable {
                    attempts: attempt,
                    reason: error.to_string(),
                });
            }

            let delay = self.config.backoff_base.saturating_mul(2u32.saturating_pow(attempt - 1));
            warn!(
                "⚠️ {} attempt {}/{} failed: {}; retrying in {:?}",
                self.model.name(),
                attempt,
                max_attempts,
                error,
                delay
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[async_trait]
impl Enricher for NarrativeEnricher {
    async fn enrich(
        &self,
        site: &SiteContent,
        company_name: &str,
        cancel: &CancellationToken,
    ) -> Result<BrochureContent> {
        let context = prompt::build_context(site, self.config.max_context_chars);
        debug!("Prompt context for {}: {} chars", company_name, context.chars().count());

        let mut request = prompt::initial_request(company_name, &context);
        let mut corrections = 0;

        loop {
            let raw = self.call_with_retries(&request, cancel).await?;
            match prompt::parse_brochure(&raw) {
                Ok(content) => {
                    info!(
                        "✍️ {} wrote {} section(s) for {}",
                        self.model.name(),
                        content.sections.len(),
                        company_name
                    );
                    return Ok(content);
                }
                Err(problem) if corrections < self.config.corrective_retries => {
                    corrections += 1;
                    warn!(
                        "⚠️ Rejected brochure for {} ({}); corrective retry {}/{}",
                        company_name, problem, corrections, self.config.corrective_retries
                    );
                    request = prompt::corrective_request(company_name, &context, &raw, &problem);
                }
                Err(problem) => return Err(Error::EnrichmentInvalid(problem)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScriptedModel, ScriptedReply};
    use folio_core::{BlockKind, ContactDetails, PageCategory, PageContent, SectionType, TextBlock};
    use std::collections::BTreeSet;
    use std::time::Duration;

    const VALID: &str = r#"{"tagline": "Robots that work", "sections": [
        {"type": "cover", "heading": "Acme Robotics", "paragraphs": ["Automation for everyone."]},
        {"type": "about", "heading": "Who we are", "paragraphs": ["Two engineers, one mission."]},
        {"type": "contact", "heading": "Get in touch", "paragraphs": ["hello@acme.test"]}
    ]}"#;

    const NO_CLOSING: &str = r#"{"sections": [
        {"type": "cover", "heading": "Acme Robotics"},
        {"type": "about", "heading": "Who we are", "paragraphs": ["Two engineers, one mission."]}
    ]}"#;

    fn site() -> SiteContent {
        SiteContent {
            root_url: "https://acme.test".to_string(),
            pages: vec![PageContent {
                url: "https://acme.test".to_string(),
                title: "Acme".to_string(),
                category: PageCategory::Home,
                blocks: vec![TextBlock::new(
                    BlockKind::Paragraph,
                    "Acme builds collaborative robots.",
                )],
                links: BTreeSet::new(),
            }],
            contact: ContactDetails::default(),
        }
    }

    fn config() -> EnrichConfig {
        EnrichConfig {
            model: "scripted".to_string(),
            request_timeout: Duration::from_millis(200),
            backoff_base: Duration::from_millis(10),
            ..Default::default()
        }
    }

    fn enricher(model: &Arc<ScriptedModel>, config: EnrichConfig) -> NarrativeEnricher {
        NarrativeEnricher::new(model.clone(), config)
    }

    #[tokio::test]
    async fn test_valid_response_on_first_call() {
        let model = Arc::new(ScriptedModel::always(ScriptedReply::text(VALID)));
        let content = enricher(&model, config())
            .enrich(&site(), "Acme Robotics", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            content.section_types(),
            vec![SectionType::Cover, SectionType::About, SectionType::Contact]
        );
        assert_eq!(model.calls(), 1);
        let requests = model.requests().await;
        assert!(requests[0].user.contains("Acme builds collaborative robots."));
    }

    #[tokio::test]
    async fn test_fenced_response_is_accepted() {
        let fenced = format!("```json\n{VALID}\n```");
        let model = Arc::new(ScriptedModel::always(ScriptedReply::text(fenced)));
        assert!(enricher(&model, config())
            .enrich(&site(), "Acme", &CancellationToken::new())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_corrective_retry_fixes_invalid_order() {
        let model = Arc::new(ScriptedModel::new([
            ScriptedReply::text(NO_CLOSING),
            ScriptedReply::text(VALID),
        ]));
        let content = enricher(&model, config())
            .enrich(&site(), "Acme", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(content.sections.len(), 3);
        assert_eq!(model.calls(), 2);
        let requests = model.requests().await;
        assert!(requests[1].user.contains("callToAction or contact"));
    }

    #[tokio::test]
    async fn test_invalid_after_corrective_retries() {
        let model = Arc::new(ScriptedModel::always(ScriptedReply::text(NO_CLOSING)));
        let err = enricher(&model, config())
            .enrich(&site(), "Acme", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EnrichmentInvalid(_)), "{err}");
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_after_max_attempts() {
        let model = Arc::new(ScriptedModel::always(ScriptedReply::unavailable()));
        let err = enricher(&model, EnrichConfig { max_attempts: 3, ..config() })
            .enrich(&site(), "Acme", &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::EnrichmentUnavailable { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let model = Arc::new(ScriptedModel::new([
            ScriptedReply::unavailable(),
            ScriptedReply::text(VALID),
        ]));
        assert!(enricher(&model, config())
            .enrich(&site(), "Acme", &CancellationToken::new())
            .await
            .is_ok());
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_per_call_timeout_counts_as_attempt() {
        let model = Arc::new(ScriptedModel::always(ScriptedReply::Stall));
        let err = enricher(&model, config())
            .enrich(&site(), "Acme", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(folio_core::ErrorKind::EnrichmentUnavailable));
        assert_eq!(model.calls(), 2);
    }

    #[derive(Debug, Default)]
    struct MisconfiguredModel {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl InferenceModel for MisconfiguredModel {
        fn name(&self) -> &str {
            "Misconfigured"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(Error::Config("backend URL is not set".to_string()))
        }
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let model = Arc::new(MisconfiguredModel::default());
        let err = NarrativeEnricher::new(model.clone(), EnrichConfig { max_attempts: 3, ..config() })
            .enrich(&site(), "Acme", &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::EnrichmentUnavailable { attempts, .. } => assert_eq!(attempts, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(model.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_call() {
        let model = Arc::new(ScriptedModel::always(ScriptedReply::Stall));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = enricher(
            &model,
            EnrichConfig {
                request_timeout: Duration::from_secs(30),
                ..config()
            },
        )
        .enrich(&site(), "Acme", &cancel)
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
