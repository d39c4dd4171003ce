pub mod classify;
pub mod contact;
pub mod extractor;
pub mod fetcher;
pub mod jsonld;
pub mod links;
pub mod robots;
pub mod utils;

pub use extractor::ContentExtractor;
pub use fetcher::{LinkCandidate, SiteFetcher};
pub use robots::RobotsPolicy;

pub mod prelude {
    pub use super::{ContentExtractor, SiteFetcher};
    pub use folio_core::{Error, PageContent, RawPage, Result, SiteContent};
}
