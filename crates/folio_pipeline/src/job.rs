use std::fmt;

use chrono::{DateTime, Utc};
use folio_core::{BrochureDocument, BrochureRequest, Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four sequential steps of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Extract,
    Enrich,
    Assemble,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Enrich => "enrich",
            Stage::Assemble => "assemble",
        }
    }

    /// Kind reported for errors the stage sees that carry none of their own.
    pub fn default_kind(&self) -> ErrorKind {
        match self {
            Stage::Fetch => ErrorKind::FetchRootFailed,
            Stage::Extract => ErrorKind::ExtractionEmpty,
            Stage::Enrich => ErrorKind::EnrichmentUnavailable,
            Stage::Assemble => ErrorKind::RenderFailure,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job failed, in terms a caller can act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: ErrorKind, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
        }
    }

    /// Classifies `error` as seen by `stage`. The message is the kind's
    /// user-facing text plus the error's own description for kinds that
    /// do not leak transport internals.
    pub fn from_error(stage: Stage, error: &Error) -> Self {
        let kind = error.kind().unwrap_or_else(|| stage.default_kind());
        let message = match error {
            Error::FetchRootFailed { .. }
            | Error::InvalidUrl(_)
            | Error::EnrichmentInvalid(_)
            | Error::RenderFailure(_)
            | Error::Timeout(_) => format!("{}: {}", kind.user_message(), error),
            _ => kind.user_message().to_string(),
        };
        Self::new(kind, stage, message)
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} during {}: {}", self.kind, self.stage, self.message)
    }
}

impl std::error::Error for JobFailure {}

#[derive(Debug, Clone)]
pub enum JobState {
    Created,
    Fetching,
    Extracting,
    Enriching,
    Assembling,
    Completed(BrochureDocument),
    Failed(JobFailure),
}

impl JobState {
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Created => "Created",
            JobState::Fetching => "Fetching",
            JobState::Extracting => "Extracting",
            JobState::Enriching => "Enriching",
            JobState::Assembling => "Assembling",
            JobState::Completed(_) => "Completed",
            JobState::Failed(_) => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed(_) | JobState::Failed(_))
    }

    /// The stage a running state belongs to.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            JobState::Fetching => Some(Stage::Fetch),
            JobState::Extracting => Some(Stage::Extract),
            JobState::Enriching => Some(Stage::Enrich),
            JobState::Assembling => Some(Stage::Assemble),
            _ => None,
        }
    }

    fn ordinal(&self) -> u8 {
        match self {
            JobState::Created => 0,
            JobState::Fetching => 1,
            JobState::Extracting => 2,
            JobState::Enriching => 3,
            JobState::Assembling => 4,
            JobState::Completed(_) => 5,
            JobState::Failed(_) => 6,
        }
    }

    /// Forward by exactly one step, or to `Failed` from any non-terminal
    /// state.
    pub fn can_transition_to(&self, next: &JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            JobState::Failed(_) => true,
            _ => next.ordinal() == self.ordinal() + 1,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One end-to-end generation request and everything that happened to it.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: Uuid,
    pub company_name: String,
    pub company_url: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    state: JobState,
}

impl GenerationJob {
    pub fn new(request: BrochureRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_name: request.company_name,
            company_url: request.company_url,
            started_at: Utc::now(),
            completed_at: None,
            state: JobState::Created,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn failure_reason(&self) -> Option<&JobFailure> {
        match &self.state {
            JobState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&BrochureDocument> {
        match &self.state {
            JobState::Completed(document) => Some(document),
            _ => None,
        }
    }

    /// Moves the job to `next`, rejecting anything but the next stage or
    /// `Failed`.
    pub fn transition(&mut self, next: JobState) -> Result<()> {
        if !self.state.can_transition_to(&next) {
            return Err(Error::InvalidTransition {
                from: self.state.name().to_string(),
                to: next.name().to_string(),
            });
        }
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        self.state = next;
        Ok(())
    }

    /// Fails the job at its current stage. Does nothing once terminal.
    pub fn fail(&mut self, error: &Error) {
        if self.state.is_terminal() {
            return;
        }
        let stage = self.state.stage().unwrap_or(Stage::Fetch);
        let failure = JobFailure::from_error(stage, error);
        self.state = JobState::Failed(failure);
        self.completed_at = Some(Utc::now());
    }

    pub fn into_result(self) -> std::result::Result<BrochureDocument, JobFailure> {
        match self.state {
            JobState::Completed(document) => Ok(document),
            JobState::Failed(failure) => Err(failure),
            other => Err(JobFailure::new(
                ErrorKind::RenderFailure,
                other.stage().unwrap_or(Stage::Assemble),
                format!("job stopped in state {other}"),
            )),
        }
    }
}
