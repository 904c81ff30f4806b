//! Vertex AI embedding provider implementation
//!
//! Uses Google Cloud's Vertex AI text embedding API via the publisher
//! models `:predict` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, EmbeddingTaskType};
use crate::auth::GoogleAuth;
use crate::error::{PipelineError, PipelineResult};

/// Vertex AI embeddings provider
pub struct VertexEmbeddingProvider {
    client: Client,
    auth: GoogleAuth,
    project_id: String,
    location: String,
}

impl VertexEmbeddingProvider {
    pub fn new(auth: GoogleAuth, project_id: String, location: String) -> Self {
        Self {
            client: Client::new(),
            auth,
            project_id,
            location,
        }
    }

    /// Get the Vertex AI endpoint URL for the given model
    fn endpoint_url(&self, model: &str) -> String {
        format!(
            "https://{}-aiplatform.googleapis.com/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.location, self.project_id, self.location, model
        )
    }
}

// Vertex AI request/response types

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<TextInstance>,
    parameters: EmbeddingParameters,
}

#[derive(Debug, Serialize)]
struct TextInstance {
    content: String,
    task_type: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingParameters {
    #[serde(rename = "outputDimensionality")]
    output_dimensionality: u32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<EmbeddingPrediction>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingPrediction {
    embeddings: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for VertexEmbeddingProvider {
    async fn embed_batch(
        &self,
        model: &str,
        task_type: EmbeddingTaskType,
        dimension: u32,
        texts: &[String],
    ) -> PipelineResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let access_token = self.auth.token().await?;
        let endpoint = self.endpoint_url(model);

        let instances: Vec<TextInstance> = texts
            .iter()
            .map(|text| TextInstance {
                content: text.clone(),
                task_type: task_type.as_str().to_string(),
            })
            .collect();

        let request = PredictRequest {
            instances,
            parameters: EmbeddingParameters {
                output_dimensionality: dimension,
            },
        };

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Embedding(format!(
                "Vertex AI API error {}: {}",
                status, body
            )));
        }

        let predict_response: PredictResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Embedding(format!("Failed to parse response: {}", e)))?;

        if predict_response.predictions.len() != texts.len() {
            return Err(PipelineError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                predict_response.predictions.len()
            )));
        }

        Ok(predict_response
            .predictions
            .into_iter()
            .map(|p| p.embeddings.values)
            .collect())
    }
}
