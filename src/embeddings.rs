use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;

/// Dimension of vectors produced by the embedding model.
pub const EMBEDDING_DIM: usize = 768;

/// Hosted feature-extraction endpoint for the default sentence-embedding model.
const DEFAULT_EMBEDDINGS_URL: &str = "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-mpnet-base-v2/pipeline/feature-extraction";

/// Configuration for the embeddings API
#[derive(Clone)]
pub struct EmbeddingsConfig {
    pub api_token: String,
    pub url: String,
}

impl EmbeddingsConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_token = env::var("HF_API_TOKEN")?;
        let url =
            env::var("HF_EMBEDDINGS_URL").unwrap_or_else(|_| DEFAULT_EMBEDDINGS_URL.to_string());

        Ok(EmbeddingsConfig { api_token, url })
    }
}

/// Representation of a vector embedding
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Embedding {
    pub values: Vec<f32>,
}

/// Client for the hosted embedding model
#[derive(Clone)]
pub struct EmbeddingsClient {
    config: EmbeddingsConfig,
    client: reqwest::Client,
}

impl EmbeddingsClient {
    /// Create a new embeddings client
    pub fn new(config: EmbeddingsConfig) -> Self {
        let client = reqwest::Client::new();
        EmbeddingsClient { config, client }
    }

    /// Generate embeddings for a batch of texts in one request
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        #[derive(Serialize)]
        struct EmbeddingRequest<'a> {
            inputs: &'a [String],
        }

        let request = EmbeddingRequest { inputs: texts };

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Embeddings request failed: {} {}",
                status,
                error_text
            ));
        }

        let vectors: Vec<Vec<f32>> = response.json().await?;
        debug!("Embedded batch of {} texts", vectors.len());

        if vectors.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            ));
        }

        vectors
            .into_iter()
            .map(|values| {
                if values.len() != EMBEDDING_DIM {
                    return Err(anyhow::anyhow!(
                        "Embedding dimension mismatch: expected {}, got {}",
                        EMBEDDING_DIM,
                        values.len()
                    ));
                }
                Ok(Embedding { values })
            })
            .collect()
    }

    /// Generate an embedding for a single text
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        let inputs = vec![text.to_string()];
        let mut embeddings = self.embed_batch(&inputs).await?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(server: &MockServer) -> EmbeddingsClient {
        EmbeddingsClient::new(EmbeddingsConfig {
            api_token: "test-token".to_string(),
            url: server.url("/embed"),
        })
    }

    #[tokio::test]
    async fn embed_batch_parses_vectors() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embed")
                    .header("authorization", "Bearer test-token")
                    .json_body_obj(&json!({"inputs": ["first chunk", "second chunk"]}));
                then.status(200)
                    .json_body(json!([vec![0.25_f32; EMBEDDING_DIM], vec![0.5_f32; EMBEDDING_DIM]]));
            })
            .await;

        let client = test_client(&server);
        let texts = vec!["first chunk".to_string(), "second chunk".to_string()];
        let embeddings = client.embed_batch(&texts).await.unwrap();

        mock.assert_async().await;
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].values.len(), EMBEDDING_DIM);
        assert_eq!(embeddings[1].values[0], 0.5);
    }

    #[tokio::test]
    async fn embed_rejects_wrong_dimension() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200).json_body(json!([[0.1, 0.2, 0.3]]));
            })
            .await;

        let client = test_client(&server);
        let error = client.embed("some text").await.unwrap_err();
        assert!(error.to_string().contains("dimension mismatch"));
    }

    #[tokio::test]
    async fn embed_surfaces_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(429).body("rate limit exceeded");
            })
            .await;

        let client = test_client(&server);
        let error = client.embed("some text").await.unwrap_err();
        let message = error.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("rate limit exceeded"));
    }
}
