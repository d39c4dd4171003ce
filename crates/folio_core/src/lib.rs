pub mod brochure;
pub mod config;
pub mod error;
pub mod models;
pub mod types;

pub use brochure::Violation;
pub use config::{EnrichConfig, ExtractConfig, FetchConfig, FolioConfig, JobConfig};
pub use error::{Error, ErrorKind, Result};
pub use models::{CompletionRequest, Enricher, InferenceModel};
pub use types::{
    BlockKind, BrochureContent, BrochureDocument, BrochureRequest, ContactDetails, PageCategory,
    PageContent, RawPage, Section, SectionType, SiteContent, SocialLink, TextBlock,
};

pub use tokio_util::sync::CancellationToken;
