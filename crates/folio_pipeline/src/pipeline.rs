use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use folio_core::{
    BrochureDocument, BrochureRequest, CancellationToken, Enricher, Error, FolioConfig, Result,
};
use folio_inference::NarrativeEnricher;
use folio_render::BrochureAssembler;
use folio_scrapers::{ContentExtractor, SiteFetcher};

use crate::job::{GenerationJob, JobFailure, JobState};
use crate::logging::JobLogger;

/// Runs fetch, extract, enrich and assemble for one request at a time per
/// call, any number of calls at once.
///
/// Clones share the fetcher and enricher, and with them the process-wide
/// caps on outbound page and backend requests.
#[derive(Clone)]
pub struct GenerationPipeline {
    fetcher: Arc<SiteFetcher>,
    extractor: ContentExtractor,
    enricher: Arc<dyn Enricher>,
    assembler: BrochureAssembler,
    config: FolioConfig,
}

impl fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationPipeline")
            .field("fetcher", &self.fetcher)
            .field("extractor", &self.extractor)
            .field("enricher", &"<dyn Enricher>")
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationPipeline {
    pub fn new(config: FolioConfig, fetcher: Arc<SiteFetcher>, enricher: Arc<dyn Enricher>) -> Self {
        Self {
            fetcher,
            extractor: ContentExtractor::new(config.extract.clone()),
            enricher,
            assembler: BrochureAssembler::default(),
            config,
        }
    }

    /// Builds every stage from configuration.
    pub fn from_config(config: FolioConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(SiteFetcher::new(config.fetch.clone())?);
        let enricher = Arc::new(NarrativeEnricher::from_config(&config.enrich)?);
        Ok(Self::new(config, fetcher, enricher))
    }

    pub fn with_assembler(mut self, assembler: BrochureAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    /// Produces the brochure or the reason there is none.
    pub async fn generate(
        &self,
        request: BrochureRequest,
    ) -> std::result::Result<BrochureDocument, JobFailure> {
        self.run(request).await.into_result()
    }

    /// Runs one job to a terminal state. The whole job shares one time
    /// budget, the sum of the stage budgets; when it runs out the job is
    /// cancelled and fails with `Timeout` at whichever stage it reached.
    pub async fn run(&self, request: BrochureRequest) -> GenerationJob {
        let mut job = GenerationJob::new(request);
        let log = JobLogger::new(job.id);
        let cancel = CancellationToken::new();
        let budget = self.config.job.total_budget();
        let started = Instant::now();

        log.info(&format!(
            "🚀 Generating brochure for {} ({})",
            job.company_name, job.company_url
        ));

        let outcome = match tokio::time::timeout(budget, self.drive(&mut job, &log, &cancel)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                log.warn(&format!("⏱️ Job budget of {budget:?} exhausted; cancelling"));
                Err(Error::Timeout(budget))
            }
        };
        cancel.cancel();

        match outcome {
            Ok(document) => {
                let pages = document.page_count;
                match job.transition(JobState::Completed(document)) {
                    Ok(()) => log.info(&format!(
                        "✅ Completed in {:.1?}: {} page(s)",
                        started.elapsed(),
                        pages
                    )),
                    Err(e) => job.fail(&e),
                }
            }
            Err(error) => {
                let stage = job.state().stage();
                job.fail(&error);
                let stage_log = stage.map_or(log.clone(), |s| log.with_stage(s));
                stage_log.error(&format!("❌ Failed after {:.1?}: {}", started.elapsed(), error));
            }
        }
        job
    }

    async fn drive(
        &self,
        job: &mut GenerationJob,
        log: &JobLogger,
        cancel: &CancellationToken,
    ) -> Result<BrochureDocument> {
        let log_fetch = enter(job, JobState::Fetching, log, cancel)?;
        let pages = self.fetcher.fetch_site(&job.company_url, cancel).await?;
        log_fetch.info(&format!("🌐 Fetched {} page(s)", pages.len()));

        let log_extract = enter(job, JobState::Extracting, log, cancel)?;
        let extractor = self.extractor.clone();
        let site = tokio::task::spawn_blocking(move || extractor.extract(&pages))
            .await
            .map_err(|e| Error::Scraping(format!("extraction task failed: {e}")))??;
        log_extract.info(&format!(
            "🔍 Extracted {} block(s) from {} page(s)",
            site.block_count(),
            site.pages.len()
        ));

        let log_enrich = enter(job, JobState::Enriching, log, cancel)?;
        let content = self.enricher.enrich(&site, &job.company_name, cancel).await?;
        content
            .validate()
            .map_err(|v| Error::EnrichmentInvalid(v.to_string()))?;
        log_enrich.info(&format!("✍️ Brochure outline: {:?}", content.section_types()));

        let log_assemble = enter(job, JobState::Assembling, log, cancel)?;
        let assembler = self.assembler.clone();
        let company = job.company_name.clone();
        let document = tokio::task::spawn_blocking(move || assembler.assemble(&content, &company))
            .await
            .map_err(|e| Error::RenderFailure(format!("render task failed: {e}")))??;
        log_assemble.info(&format!(
            "📄 Assembled {} page(s), {} bytes",
            document.page_count,
            document.bytes.len()
        ));

        Ok(document)
    }
}

/// Stage boundary: honour cancellation, then advance the state machine.
fn enter(
    job: &mut GenerationJob,
    next: JobState,
    log: &JobLogger,
    cancel: &CancellationToken,
) -> Result<JobLogger> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let stage_log = next.stage().map_or(log.clone(), |s| log.with_stage(s));
    job.transition(next)?;
    stage_log.debug(&format!("➡️ {}", job.state()));
    Ok(stage_log)
}
