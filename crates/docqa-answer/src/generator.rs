use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docqa_core::config::OllamaSettings;
use docqa_core::traits::Generator;
use docqa_core::{Error, Result};
use docqa_embed::OllamaTransport;

pub const GENERATE_PATH: &str = "api/generate";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Non-streaming generation through Ollama's `/api/generate`.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    transport: OllamaTransport,
    model: String,
}

impl OllamaGenerator {
    pub fn new(transport: OllamaTransport, model: impl Into<String>) -> Self {
        Self { transport, model: model.into() }
    }

    pub fn from_settings(settings: &OllamaSettings) -> Result<Self> {
        Ok(Self::new(OllamaTransport::from_settings(settings)?, settings.llm_model.clone()))
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest { model: &self.model, prompt, stream: false };
        let response: GenerateResponse = self
            .transport
            .post_json(GENERATE_PATH, &request)
            .await
            .map_err(|e| Error::generation(e.message))?;
        Ok(response.response)
    }
}
