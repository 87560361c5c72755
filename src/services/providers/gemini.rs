/// Gemini API provider
///
/// Provides both embeddings and text generation.
///
/// API Flow:
/// 1. Embedding: /v1beta/models/{model}:embedContent → fixed-length vector
/// 2. Generation: /v1beta/models/{model}:generateContent → JSON text (explanations)
use crate::{
    error::{AppError, AppResult},
    models::{
        GeminiContent, GeminiEmbedRequest, GeminiEmbedResponse, GeminiGenerateRequest,
        GeminiGenerateResponse, GeminiGenerationConfig, GeminiPart,
    },
    services::providers::{Embedder, TextGenerator},
};
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";
const EXPLANATION_TEMPERATURE: f32 = 0.4;

#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    embedding_model: String,
    generation_model: String,
    dimensions: usize,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        api_url: String,
        embedding_model: String,
        generation_model: String,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            embedding_model,
            generation_model,
            dimensions,
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.api_url, model, method)
    }

    /// Checks the returned vector against the configured dimension
    fn validate_embedding(&self, values: Vec<f32>) -> AppResult<Vec<f32>> {
        if values.is_empty() {
            return Err(AppError::EmbeddingUnavailable(
                "Gemini returned no embedding values".to_string(),
            ));
        }

        if values.len() != self.dimensions {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Expected embedding of length {}, got {}",
                self.dimensions,
                values.len()
            )));
        }

        Ok(values)
    }
}

/// Maps a non-success upstream status to the error taxonomy
fn status_error(status: StatusCode, body: &str, fallback: fn(String) -> AppError) -> AppError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        AppError::RateLimited(format!("Gemini API throttled the request: {}", body))
    } else {
        fallback(format!("Gemini API returned status {}: {}", status, body))
    }
}

#[async_trait::async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Cannot embed empty text".to_string(),
            ));
        }

        let request = GeminiEmbedRequest {
            model: format!("models/{}", self.embedding_model),
            content: GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(text.to_string()),
                }],
            },
            output_dimensionality: self.dimensions,
        };

        let response = self
            .http_client
            .post(self.model_url(&self.embedding_model, "embedContent"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Embedding request failed");
                AppError::EmbeddingUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Embedding API request failed");
            return Err(status_error(status, &body, AppError::EmbeddingUnavailable));
        }

        let parsed: GeminiEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::EmbeddingUnavailable(format!("Invalid embedding response: {}", e)))?;

        let values = parsed.embedding.map(|e| e.values).unwrap_or_default();
        let embedding = self.validate_embedding(values)?;

        tracing::debug!(
            dimensions = embedding.len(),
            chars = text.len(),
            provider = "gemini",
            "Embedding generated"
        );

        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let request = GeminiGenerateRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: EXPLANATION_TEMPERATURE,
            },
        };

        let response = self
            .http_client
            .post(self.model_url(&self.generation_model, "generateContent"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, AppError::ExternalApi));
        }

        let parsed: GeminiGenerateResponse = response.json().await?;

        parsed
            .text()
            .ok_or_else(|| AppError::ExternalApi("Gemini returned no text".to_string()))
    }
}
