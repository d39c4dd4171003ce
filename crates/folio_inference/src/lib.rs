pub mod enricher;
pub mod models;
pub mod prompt;

pub use enricher::NarrativeEnricher;
pub use models::create_model;

pub mod prelude {
    pub use super::models::{create_model, ChatModel, DummyModel};
    #[cfg(any(test, feature = "testing"))]
    pub use super::models::{ScriptedModel, ScriptedReply};
    pub use super::NarrativeEnricher;
    pub use folio_core::{BrochureContent, Enricher, Error, InferenceModel, Result};
}
