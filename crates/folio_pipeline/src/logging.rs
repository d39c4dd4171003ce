use std::sync::Once;

use tracing::Level;
use uuid::Uuid;

use crate::job::Stage;

static INIT: Once = Once::new();

/// Installs the fmt subscriber once per process. Later calls, or calls
/// after another subscriber was set, are no-ops.
pub fn init_logging(level: Level) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .try_init();
    });
}

/// Prefixes every message with the job id and, once known, its stage.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job: String,
    prefix: String,
}

impl JobLogger {
    pub fn new(job_id: Uuid) -> Self {
        let mut job = job_id.simple().to_string();
        job.truncate(8);
        Self {
            prefix: format!("[job {job}]"),
            job,
        }
    }

    pub fn with_stage(&self, stage: Stage) -> Self {
        Self {
            job: self.job.clone(),
            prefix: format!("[job {}] [{}]", self.job, stage),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{} {}", self.prefix, message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{} {}", self.prefix, message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{} {}", self.prefix, message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{} {}", self.prefix, message);
    }
}
