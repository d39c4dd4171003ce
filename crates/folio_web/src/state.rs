use folio_pipeline::GenerationPipeline;

#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: GenerationPipeline,
}

impl AppState {
    pub fn new(pipeline: GenerationPipeline) -> Self {
        Self { pipeline }
    }
}
