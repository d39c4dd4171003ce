use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The failure taxonomy a job can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    FetchRootFailed,
    ExtractionEmpty,
    EnrichmentUnavailable,
    EnrichmentInvalid,
    RenderFailure,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FetchRootFailed => "FetchRootFailed",
            ErrorKind::ExtractionEmpty => "ExtractionEmpty",
            ErrorKind::EnrichmentUnavailable => "EnrichmentUnavailable",
            ErrorKind::EnrichmentInvalid => "EnrichmentInvalid",
            ErrorKind::RenderFailure => "RenderFailure",
            ErrorKind::Timeout => "Timeout",
        }
    }

    /// Short text safe to show to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::FetchRootFailed => "The website could not be reached",
            ErrorKind::ExtractionEmpty => "Insufficient website content",
            ErrorKind::EnrichmentUnavailable => "The writing service is currently unavailable",
            ErrorKind::EnrichmentInvalid => "The writing service returned unusable content",
            ErrorKind::RenderFailure => "The brochure could not be rendered",
            ErrorKind::Timeout => "Brochure generation took too long",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Backend returned status {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Failed to fetch root page {url}: {reason}")]
    FetchRootFailed { url: String, reason: String },

    #[error("Insufficient website content")]
    ExtractionEmpty,

    #[error("Language model unavailable after {attempts} attempt(s): {reason}")]
    EnrichmentUnavailable { attempts: u32, reason: String },

    #[error("Language model returned invalid brochure content: {0}")]
    EnrichmentInvalid(String),

    #[error("Render error: {0}")]
    RenderFailure(String),

    #[error("Job exceeded its time budget of {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Maps the error onto the job failure taxonomy. Errors that only make
    /// sense in the context of a stage (transport, IO) return `None` and are
    /// classified by the stage that saw them.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::InvalidUrl(_) | Error::FetchRootFailed { .. } => Some(ErrorKind::FetchRootFailed),
            Error::ExtractionEmpty => Some(ErrorKind::ExtractionEmpty),
            Error::EnrichmentUnavailable { .. } => Some(ErrorKind::EnrichmentUnavailable),
            Error::EnrichmentInvalid(_) => Some(ErrorKind::EnrichmentInvalid),
            Error::RenderFailure(_) => Some(ErrorKind::RenderFailure),
            Error::Timeout(_) | Error::Cancelled => Some(ErrorKind::Timeout),
            Error::Io(_)
            | Error::Serialization(_)
            | Error::Http(_)
            | Error::Scraping(_)
            | Error::Backend { .. }
            | Error::InvalidTransition { .. }
            | Error::Config(_)
            | Error::External(_) => None,
        }
    }

    /// True for backend failures worth another attempt: transport errors,
    /// error statuses (auth included) and per-call timeouts.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Backend { .. } | Error::Io(_) | Error::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::InvalidUrl("nope".into()).kind(),
            Some(ErrorKind::FetchRootFailed)
        );
        assert_eq!(Error::Cancelled.kind(), Some(ErrorKind::Timeout));
        assert_eq!(
            Error::Backend { status: 502, message: "bad gateway".into() }.kind(),
            None
        );
    }

    #[test]
    fn test_transient() {
        assert!(Error::Backend { status: 401, message: "unauthorized".into() }.is_transient());
        assert!(Error::Timeout(std::time::Duration::from_secs(1)).is_transient());
        assert!(!Error::EnrichmentInvalid("bad".into()).is_transient());
        assert!(!Error::Config("no key".into()).is_transient());
    }

    #[test]
    fn test_kind_serializes_by_name() {
        let json = serde_json::to_string(&ErrorKind::ExtractionEmpty).unwrap();
        assert_eq!(json, "\"ExtractionEmpty\"");
    }
}
