pub mod job;
pub mod logging;
pub mod pipeline;

pub use job::{GenerationJob, JobFailure, JobState, Stage};
pub use logging::{init_logging, JobLogger};
pub use pipeline::GenerationPipeline;

pub mod prelude {
    pub use super::{GenerationJob, GenerationPipeline, JobFailure, JobState, Stage};
    pub use folio_core::{BrochureDocument, BrochureRequest, ErrorKind, FolioConfig};
}
