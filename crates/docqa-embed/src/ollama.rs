use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docqa_core::config::OllamaSettings;
use docqa_core::traits::Embedder;
use docqa_core::{Error, Result};

use crate::transport::OllamaTransport;

pub const EMBEDDINGS_PATH: &str = "api/embeddings";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedding adapter for Ollama's `/api/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    transport: OllamaTransport,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(transport: OllamaTransport, model: impl Into<String>) -> Self {
        Self { transport, model: model.into() }
    }

    pub fn from_settings(settings: &OllamaSettings) -> Result<Self> {
        Ok(Self::new(OllamaTransport::from_settings(settings)?, settings.embed_model.clone()))
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest { model: &self.model, prompt: text };
        let response: EmbeddingResponse = self
            .transport
            .post_json(EMBEDDINGS_PATH, &request)
            .await
            .map_err(|e| Error::embedding(e.message))?;
        if response.embedding.is_empty() {
            return Err(Error::embedding(format!("model '{}' returned an empty embedding", self.model)));
        }
        Ok(response.embedding)
    }
}
