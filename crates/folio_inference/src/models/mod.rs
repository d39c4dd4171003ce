use std::sync::Arc;

use folio_core::config::EnrichConfig;
use folio_core::{InferenceModel, Result};
use tracing::info;

pub mod chat;
pub mod dummy;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use chat::ChatModel;
pub use dummy::DummyModel;
#[cfg(any(test, feature = "testing"))]
pub use scripted::{ScriptedModel, ScriptedReply};

/// Builds the backend named by `config.model`: `dummy` for the offline
/// model, otherwise one of the chat presets.
pub fn create_model(config: &EnrichConfig) -> Result<Arc<dyn InferenceModel>> {
    let model: Arc<dyn InferenceModel> = match config.model.to_ascii_lowercase().as_str() {
        "dummy" => Arc::new(DummyModel::new()),
        _ => Arc::new(ChatModel::from_config(config)?),
    };
    info!("🤖 Using {} backend", model.name());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model() {
        let config = EnrichConfig {
            model: "Dummy".to_string(),
            ..Default::default()
        };
        assert_eq!(create_model(&config).unwrap().name(), "Dummy");

        let config = EnrichConfig {
            model: "deepseek".to_string(),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert_eq!(create_model(&config).unwrap().name(), "DeepSeek");

        let config = EnrichConfig {
            model: "llama-on-a-toaster".to_string(),
            ..Default::default()
        };
        assert!(create_model(&config).is_err());
    }
}
