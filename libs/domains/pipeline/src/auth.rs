//! Access tokens for Google Cloud REST calls.
//!
//! Supports authentication via:
//! - GOOGLE_ACCESS_TOKEN environment variable (local development)
//! - GCE/GKE metadata server (Workload Identity)

use reqwest::Client;
use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Token source shared by every Google Cloud client in the pipeline.
#[derive(Debug, Clone)]
pub struct GoogleAuth {
    client: Client,
    access_token: Option<String>,
}

impl GoogleAuth {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            access_token: std::env::var("GOOGLE_ACCESS_TOKEN").ok(),
        }
    }

    pub fn with_access_token(token: String) -> Self {
        Self {
            client: Client::new(),
            access_token: Some(token),
        }
    }

    /// Get an access token, falling back to the metadata server when no
    /// static token is configured.
    pub async fn token(&self) -> PipelineResult<String> {
        if let Some(ref token) = self.access_token {
            return Ok(token.clone());
        }
        self.metadata_token().await
    }

    async fn metadata_token(&self) -> PipelineResult<String> {
        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                PipelineError::Config(format!(
                    "Failed to get access token from metadata server: {}. \
                     Set GOOGLE_ACCESS_TOKEN environment variable for local development.",
                    e
                ))
            })?;

        if !response.status().is_success() {
            return Err(PipelineError::Config(
                "Failed to get access token from metadata server. \
                 Set GOOGLE_ACCESS_TOKEN environment variable for local development."
                    .to_string(),
            ));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Config(format!("Failed to parse token response: {}", e)))?;

        Ok(token_response.access_token)
    }
}

impl Default for GoogleAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_wins() {
        let auth = GoogleAuth::with_access_token("t0ken".to_string());
        assert_eq!(auth.token().await.unwrap(), "t0ken");
    }

    #[test]
    fn reads_token_from_env() {
        temp_env::with_var("GOOGLE_ACCESS_TOKEN", Some("env-token"), || {
            let auth = GoogleAuth::new();
            assert_eq!(auth.access_token.as_deref(), Some("env-token"));
        });
    }
}
