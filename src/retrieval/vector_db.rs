//! Vector store integration for Qdrant
//!
//! `QdrantVectorStore` is the production backend. `InMemoryVectorStore`
//! provides a brute-force cosine store for tests and keyless local runs.

use async_trait::async_trait;
use qdrant_client::config::QdrantConfig as ClientConfig;
use qdrant_client::qdrant::{
    CreateCollection, DeletePoints, Distance, Filter, PointStruct, PointsSelector, SearchPoints,
    UpsertPoints, Value as QdrantValue, VectorParams, VectorsConfig, WithPayloadSelector,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::{
    ChunkId, ChunkMetadata, CollectionStats, DocumentChunk, EmbeddedChunk, EmbeddingError,
    ScoredChunk, StoreError,
};

/// Map Qdrant client errors onto [`StoreError`] by response status
fn map_qdrant_error(error: qdrant_client::QdrantError) -> StoreError {
    match error {
        qdrant_client::QdrantError::ResponseError { status, .. } => {
            let status_code = status.code() as u16;
            match status_code {
                404 => StoreError::Storage {
                    reason: "Qdrant collection or point does not exist".to_string(),
                },
                401 | 403 => StoreError::AccessDenied {
                    reason: "Qdrant rejected the configured credentials".to_string(),
                },
                400 => StoreError::InvalidOperation {
                    reason: "Qdrant rejected the request as malformed".to_string(),
                },
                500..=599 => StoreError::Storage {
                    reason: format!("Qdrant server error: {}", status),
                },
                _ => StoreError::Storage {
                    reason: format!("Qdrant API error: {}", status),
                },
            }
        }
        qdrant_client::QdrantError::ConversionError { .. } => StoreError::InvalidOperation {
            reason: "Qdrant payload conversion failed".to_string(),
        },
        _ => StoreError::Storage {
            reason: format!("Qdrant client error: {}", error),
        },
    }
}

/// Configuration for the Qdrant vector store
#[derive(Debug, Clone)]
pub struct QdrantStoreConfig {
    /// Qdrant server URL
    pub url: String,
    /// Optional API key sent with each request
    pub api_key: Option<String>,
    /// Collection the chunk points live in
    pub collection_name: String,
    /// Vector dimension
    pub vector_dimension: usize,
    /// Similarity metric the collection is created with
    pub distance_metric: QdrantDistance,
    /// Maximum number of points per upsert batch
    pub batch_size: usize,
    /// Client timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for QdrantStoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection_name: "placement_policies".to_string(),
            vector_dimension: 384,
            distance_metric: QdrantDistance::Cosine,
            batch_size: 100,
            timeout_seconds: 30,
        }
    }
}

impl From<&crate::config::StorageConfig> for QdrantStoreConfig {
    fn from(config: &crate::config::StorageConfig) -> Self {
        Self {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            collection_name: config.collection_name.clone(),
            vector_dimension: config.vector_dimension,
            distance_metric: QdrantDistance::Cosine,
            batch_size: config.batch_size,
            timeout_seconds: config.timeout_seconds,
        }
    }
}

/// Distance metric choices for collection creation
#[derive(Debug, Clone)]
pub enum QdrantDistance {
    Cosine,
    Euclidean,
    Dot,
}

impl From<QdrantDistance> for Distance {
    fn from(distance: QdrantDistance) -> Self {
        match distance {
            QdrantDistance::Cosine => Distance::Cosine,
            QdrantDistance::Euclidean => Distance::Euclid,
            QdrantDistance::Dot => Distance::Dot,
        }
    }
}

/// Vector store operations trait
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the store connection and create the collection if missing
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Store embedded chunks, returning the number of points written
    async fn upsert_chunks(&self, chunks: &[EmbeddedChunk]) -> Result<usize, StoreError>;

    /// Search for the chunks most similar to a query embedding.
    ///
    /// Results are ordered by score descending; when a threshold is given,
    /// only chunks scoring at or above it are returned.
    async fn search(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredChunk>, StoreError>;

    /// Remove every point from the collection, keeping the collection itself
    async fn clear(&self) -> Result<(), StoreError>;

    /// Get collection statistics
    async fn stats(&self) -> Result<CollectionStats, StoreError>;

    /// Check that the store is reachable
    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Qdrant-backed vector store
pub struct QdrantVectorStore {
    client: Arc<RwLock<Option<Arc<Qdrant>>>>,
    config: QdrantStoreConfig,
}

impl QdrantVectorStore {
    pub fn new(config: QdrantStoreConfig) -> Self {
        Self {
            client: Arc::new(RwLock::new(None)),
            config,
        }
    }

    /// Get or create the Qdrant client
    async fn get_client(&self) -> Result<Arc<Qdrant>, StoreError> {
        let client_guard = self.client.read().await;
        if let Some(client) = client_guard.as_ref() {
            Ok(Arc::clone(client))
        } else {
            drop(client_guard);

            let mut client_config = ClientConfig::from_url(&self.config.url);

            if let Some(api_key) = &self.config.api_key {
                client_config.api_key = Some(api_key.clone());
            }

            let client = Qdrant::new(client_config).map_err(map_qdrant_error)?;

            let client_arc = Arc::new(client);
            let mut client_guard = self.client.write().await;
            *client_guard = Some(Arc::clone(&client_arc));

            Ok(client_arc)
        }
    }

    /// Convert a chunk to its Qdrant payload
    fn chunk_to_payload(&self, chunk: &DocumentChunk) -> HashMap<String, QdrantValue> {
        let mut payload = HashMap::new();

        payload.insert("text".to_string(), QdrantValue::from(chunk.text.clone()));
        payload.insert(
            "chunk_id".to_string(),
            QdrantValue::from(chunk.id.to_string()),
        );
        payload.insert(
            "chunk_index".to_string(),
            QdrantValue::from(chunk.chunk_index as i64),
        );
        payload.insert(
            "source".to_string(),
            QdrantValue::from(chunk.metadata.source.clone()),
        );
        payload.insert(
            "page".to_string(),
            QdrantValue::from(chunk.metadata.page as i64),
        );

        payload
    }

    /// Convert a Qdrant scored point back to a ScoredChunk
    fn point_to_scored_chunk(&self, point: &qdrant_client::qdrant::ScoredPoint) -> ScoredChunk {
        let payload = &point.payload;

        let chunk_id = payload
            .get("chunk_id")
            .and_then(extract_string_value)
            .unwrap_or_else(|| match point.id.as_ref().and_then(|id| id.point_id_options.as_ref()) {
                Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)) => uuid.clone(),
                Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)) => num.to_string(),
                None => String::new(),
            });

        let text = payload
            .get("text")
            .and_then(extract_string_value)
            .unwrap_or_default();

        let source = payload
            .get("source")
            .and_then(extract_string_value)
            .unwrap_or_default();

        let page = payload
            .get("page")
            .and_then(extract_i64_value)
            .unwrap_or(0) as u32;

        ScoredChunk {
            chunk_id,
            text,
            score: point.score,
            metadata: ChunkMetadata { source, page },
        }
    }
}

/// String payload field, if the value holds one
fn extract_string_value(value: &QdrantValue) -> Option<String> {
    match value {
        QdrantValue {
            kind: Some(qdrant_client::qdrant::value::Kind::StringValue(s)),
        } => Some(s.clone()),
        _ => None,
    }
}

/// Integer payload field, accepting the doubles Qdrant sometimes returns
fn extract_i64_value(value: &QdrantValue) -> Option<i64> {
    match value {
        QdrantValue {
            kind: Some(qdrant_client::qdrant::value::Kind::IntegerValue(i)),
        } => Some(*i),
        QdrantValue {
            kind: Some(qdrant_client::qdrant::value::Kind::DoubleValue(d)),
        } => Some(*d as i64),
        _ => None,
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        let client = self.get_client().await?;

        let collections = client.list_collections().await.map_err(map_qdrant_error)?;

        let collection_exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.config.collection_name);

        if !collection_exists {
            let vectors_config = VectorsConfig {
                config: Some(qdrant_client::qdrant::vectors_config::Config::Params(
                    VectorParams {
                        size: self.config.vector_dimension as u64,
                        distance: Distance::from(self.config.distance_metric.clone()) as i32,
                        hnsw_config: None,
                        quantization_config: None,
                        on_disk: None,
                        datatype: None,
                        multivector_config: None,
                    },
                )),
            };

            let create_collection = CreateCollection {
                collection_name: self.config.collection_name.clone(),
                vectors_config: Some(vectors_config),
                hnsw_config: None,
                wal_config: None,
                optimizers_config: None,
                shard_number: None,
                on_disk_payload: None,
                timeout: Some(self.config.timeout_seconds),
                replication_factor: None,
                write_consistency_factor: None,
                init_from_collection: None,
                quantization_config: None,
                sharding_method: None,
                sparse_vectors_config: None,
                strict_mode_config: None,
            };

            client
                .create_collection(create_collection)
                .await
                .map_err(map_qdrant_error)?;

            tracing::info!(
                collection = %self.config.collection_name,
                dimension = self.config.vector_dimension,
                "Created Qdrant collection"
            );
        }

        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[EmbeddedChunk]) -> Result<usize, StoreError> {
        let client = self.get_client().await?;

        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|item| {
                PointStruct::new(
                    item.chunk.id.to_string(),
                    item.embedding.clone(),
                    self.chunk_to_payload(&item.chunk),
                )
            })
            .collect();

        let batch_size = self.config.batch_size;
        for chunk in points.chunks(batch_size) {
            let upsert_points = UpsertPoints {
                collection_name: self.config.collection_name.clone(),
                wait: Some(true),
                points: chunk.to_vec(),
                ordering: None,
                shard_key_selector: None,
            };

            client
                .upsert_points(upsert_points)
                .await
                .map_err(map_qdrant_error)?;
        }

        Ok(points.len())
    }

    async fn search(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let client = self.get_client().await?;

        let search_points = SearchPoints {
            collection_name: self.config.collection_name.clone(),
            vector: query_embedding,
            vector_name: None,
            filter: None,
            limit: limit as u64,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(
                    qdrant_client::qdrant::with_payload_selector::SelectorOptions::Enable(true),
                ),
            }),
            params: None,
            score_threshold,
            offset: None,
            with_vectors: None,
            read_consistency: None,
            shard_key_selector: None,
            sparse_indices: None,
            timeout: None,
        };

        let search_result = client
            .search_points(search_points)
            .await
            .map_err(map_qdrant_error)?;

        Ok(search_result
            .result
            .iter()
            .map(|point| self.point_to_scored_chunk(point))
            .collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let client = self.get_client().await?;

        // An empty filter matches every point
        let delete_points = DeletePoints {
            collection_name: self.config.collection_name.clone(),
            wait: Some(true),
            points: Some(PointsSelector {
                points_selector_one_of: Some(
                    qdrant_client::qdrant::points_selector::PointsSelectorOneOf::Filter(Filter {
                        should: vec![],
                        min_should: None,
                        must: vec![],
                        must_not: vec![],
                    }),
                ),
            }),
            ordering: None,
            shard_key_selector: None,
        };

        client
            .delete_points(delete_points)
            .await
            .map_err(map_qdrant_error)?;

        Ok(())
    }

    async fn stats(&self) -> Result<CollectionStats, StoreError> {
        let client = self.get_client().await?;

        let collection_info = client
            .collection_info(&self.config.collection_name)
            .await
            .map_err(map_qdrant_error)?;

        Ok(CollectionStats {
            collection_name: self.config.collection_name.clone(),
            points_count: collection_info
                .result
                .and_then(|r| r.points_count)
                .unwrap_or(0),
            dimension: self.config.vector_dimension,
        })
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let client = self.get_client().await?;
        match client.health_check().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(error = %e, "Qdrant health check failed");
                Ok(false)
            }
        }
    }
}

/// In-memory vector store with brute-force cosine search.
///
/// Suitable for tests and small local corpora; production deployments use
/// `QdrantVectorStore`.
pub struct InMemoryVectorStore {
    dimension: usize,
    points: RwLock<HashMap<ChunkId, (DocumentChunk, Vec<f32>)>>,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[EmbeddedChunk]) -> Result<usize, StoreError> {
        let mut points = self.points.write().await;
        for item in chunks {
            points.insert(item.chunk.id, (item.chunk.clone(), item.embedding.clone()));
        }
        Ok(chunks.len())
    }

    async fn search(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let points = self.points.read().await;

        let mut results: Vec<ScoredChunk> = points
            .values()
            .map(|(chunk, embedding)| ScoredChunk {
                chunk_id: chunk.id.to_string(),
                text: chunk.text.clone(),
                score: cosine_similarity(&query_embedding, embedding),
                metadata: chunk.metadata.clone(),
            })
            .filter(|result| score_threshold.map_or(true, |t| result.score >= t))
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.points.write().await.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CollectionStats, StoreError> {
        Ok(CollectionStats {
            collection_name: "in-memory".to_string(),
            points_count: self.points.read().await.len() as u64,
            dimension: self.dimension,
        })
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Turns text into dense vectors
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a single text
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts in one call
    async fn generate_batch_embeddings(
        &self,
        texts: Vec<&str>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Output vector dimension
    fn embedding_dimension(&self) -> usize;

    /// Longest input the provider accepts, in characters
    fn max_text_length(&self) -> usize;
}

/// Deterministic embedding stub for tests and keyless development setups
pub struct MockEmbeddingService {
    dimension: usize,
}

impl MockEmbeddingService {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        // Deterministic mock embedding derived from the text bytes
        let mut embedding = vec![0.0; self.dimension];
        let text_bytes = text.as_bytes();

        if text_bytes.is_empty() {
            return Ok(embedding);
        }

        for (i, val) in embedding.iter_mut().enumerate() {
            let byte_index = i % text_bytes.len();
            let byte_val = text_bytes.get(byte_index).unwrap_or(&0);
            *val = (*byte_val as f32 / 255.0) * 2.0 - 1.0; // map the byte into [-1, 1]
        }

        // Normalize the vector
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }

        Ok(embedding)
    }

    async fn generate_batch_embeddings(
        &self,
        texts: Vec<&str>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::new();
        for text in texts {
            embeddings.push(self.generate_embedding(text).await?);
        }
        Ok(embeddings)
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn max_text_length(&self) -> usize {
        8192 // matches the hosted providers' input cap
    }
}
