use crate::chunking::TextChunk;
use crate::embeddings::{Embedding, EMBEDDING_DIM};
use anyhow::{Context, Result};
use log::{debug, info};
use qdrant_client::qdrant::UpsertPointsBuilder;
use qdrant_client::qdrant::{CreateCollectionBuilder, Distance, PointStruct, Value, VectorParams};
use qdrant_client::Qdrant;
use serde_json::json;
use std::collections::HashMap;
use std::env;

/// Configuration for the vector store backend
pub struct StoreConfig {
    pub url: String,
    pub api_key: Option<String>,
}

impl StoreConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let url = env::var("QDRANT_URL")?;
        let api_key = env::var("QDRANT_API_KEY").ok();

        Ok(StoreConfig { url, api_key })
    }
}

/// A chunk returned from a similarity query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The stored chunk text
    pub text: String,
    /// Source identifier of the document the chunk came from
    pub source: String,
    /// Position of the chunk within its document
    pub ordinal: usize,
    /// Similarity score assigned by the store
    pub score: f32,
}

/// Append-only vector store over a Qdrant collection per store name
pub struct VectorStore {
    client: Qdrant,
}

impl VectorStore {
    /// Create a new vector store client
    pub async fn new(config: StoreConfig) -> Result<Self> {
        let config_builder = Qdrant::from_url(&config.url);
        let config_builder = if let Some(api_key) = config.api_key {
            config_builder.api_key(api_key)
        } else {
            config_builder
        };

        let client = config_builder.build()?;

        Ok(VectorStore { client })
    }

    /// Check if the collection behind a store exists
    pub async fn collection_exists(&self, store_name: &str) -> Result<bool> {
        let collection_name = get_collection_name(store_name);

        match self.client.collection_info(&collection_name).await {
            Ok(_) => Ok(true),
            Err(qdrant_client::QdrantError::ResponseError { status })
                if status.code() == tonic::Code::NotFound =>
            {
                Ok(false)
            }
            Err(e) => Err(anyhow::anyhow!(
                "Failed to check collection existence: {}",
                e
            )),
        }
    }

    /// Create the collection for a store if it does not exist yet
    pub async fn create_if_missing(&self, store_name: &str) -> Result<()> {
        if self.collection_exists(store_name).await? {
            return Ok(());
        }

        let collection_name = get_collection_name(store_name);

        let create_collection = CreateCollectionBuilder::new(collection_name.clone())
            .vectors_config(VectorParams {
                size: EMBEDDING_DIM as u64,
                distance: Distance::Cosine.into(),
                ..Default::default()
            });

        self.client
            .create_collection(create_collection)
            .await
            .with_context(|| format!("Failed to create collection {}", collection_name))?;

        info!("Created collection {}", collection_name);
        Ok(())
    }

    /// Number of points currently stored in a collection
    async fn point_count(&self, collection_name: &str) -> Result<u64> {
        let info = self
            .client
            .collection_info(collection_name)
            .await
            .with_context(|| format!("Failed to read collection info for {}", collection_name))?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    /// Append chunks and their embeddings to a store. Point ids continue
    /// from the current collection size, so earlier chunks are never
    /// overwritten.
    pub async fn add(
        &self,
        chunks: Vec<TextChunk>,
        embeddings: Vec<Embedding>,
        store_name: &str,
    ) -> Result<()> {
        anyhow::ensure!(
            chunks.len() == embeddings.len(),
            "Chunk/embedding count mismatch: {} chunks, {} embeddings",
            chunks.len(),
            embeddings.len()
        );

        let collection_name = get_collection_name(store_name);
        let base_id = self.point_count(&collection_name).await?;

        // Convert chunks and embeddings to points
        let points: Vec<PointStruct> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(idx, (chunk, embedding))| {
                let payload: HashMap<String, Value> = serde_json::from_value(json!({
                    "text": chunk.text,
                    "source": chunk.source,
                    "ordinal": chunk.ordinal,
                }))
                .expect("chunk payload is a valid JSON object");

                PointStruct::new(base_id + idx as u64, embedding.values, payload)
            })
            .collect();

        let count = points.len();
        let upsert_request = UpsertPointsBuilder::new(collection_name.clone(), points).build();

        self.client
            .upsert_points(upsert_request)
            .await
            .with_context(|| {
                format!("Failed to upsert points in collection {}", collection_name)
            })?;

        info!("Appended {} chunks to {}", count, collection_name);
        Ok(())
    }

    /// Search a store for the chunks nearest to a query embedding. A store
    /// that has never been ingested into yields no results.
    pub async fn query(
        &self,
        query_embedding: Embedding,
        store_name: &str,
        limit: u64,
    ) -> Result<Vec<ScoredChunk>> {
        use qdrant_client::qdrant::{with_payload_selector, SearchPoints, WithPayloadSelector};

        if !self.collection_exists(store_name).await? {
            debug!("Store {} has no collection yet, returning no results", store_name);
            return Ok(Vec::new());
        }

        let collection_name = get_collection_name(store_name);

        let search_request = SearchPoints {
            collection_name: collection_name.clone(),
            vector: query_embedding.values,
            limit,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(with_payload_selector::SelectorOptions::Enable(true)),
            }),
            ..Default::default()
        };

        let search_response = self
            .client
            .search_points(search_request)
            .await
            .with_context(|| format!("Failed to search collection {}", collection_name))?;

        let chunks = search_response
            .result
            .into_iter()
            .filter_map(|scored_point| {
                let score = scored_point.score;
                let payload = scored_point.payload;
                let text = payload.get("text")?.as_str()?.to_string();
                let source = payload.get("source")?.as_str()?.to_string();
                let ordinal = payload
                    .get("ordinal")
                    .and_then(|v| v.as_integer())
                    .map(|v| v as usize)
                    .unwrap_or(0);

                Some(ScoredChunk {
                    text,
                    source,
                    ordinal,
                    score,
                })
            })
            .collect();

        Ok(chunks)
    }
}

/// Generate a collection name from a store name
fn get_collection_name(store_name: &str) -> String {
    // Replace non-alphanumeric characters with underscores and convert to lowercase
    let name = store_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase();

    format!("scheme_{}", name)
}
