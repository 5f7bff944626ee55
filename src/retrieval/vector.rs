use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::chunking::chunk_by_sentence;
use super::embedder::Embedder;
use super::error::{RetrievalError, RetrievalResult};
use super::ContextRetriever;
use crate::constants::DEFAULT_CHUNK_CHARS;
use crate::domain::{Category, ContextFragment, FragmentMetadata};
use crate::vectordb::{VectorDbClient, VectorPoint, WriteConsistency, generate_point_id};

/// Embeds and searches fragments stored in one vector collection.
pub struct VectorRetriever<V> {
    embedder: Arc<dyn Embedder>,
    client: Arc<V>,
    collection: String,
    chunk_chars: usize,
}

impl<V: VectorDbClient> VectorRetriever<V> {
    pub fn new(embedder: Arc<dyn Embedder>, client: Arc<V>, collection: impl Into<String>) -> Self {
        Self {
            embedder,
            client,
            collection: collection.into(),
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Creates the collection sized to the embedder if it is missing.
    pub async fn ensure_collection(&self) -> RetrievalResult<()> {
        self.client
            .ensure_collection(&self.collection, self.embedder.dimension() as u64)
            .await?;
        Ok(())
    }

    /// Chunks, embeds and indexes `text` under `category`. Returns the chunk count.
    ///
    /// Every chunk carries `metadata` plus its `chunk_index` and a
    /// `chunk_length` annotation.
    pub async fn ingest(
        &self,
        text: &str,
        category: Category,
        metadata: FragmentMetadata,
    ) -> RetrievalResult<usize> {
        let chunks = chunk_by_sentence(text, self.chunk_chars);
        if chunks.is_empty() {
            return Err(RetrievalError::EmptyDocument);
        }

        let vectors = self.embedder.embed_batch(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(RetrievalError::EmbeddingCountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        let points: Vec<VectorPoint> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (chunk, vector))| {
                let chunk_metadata = metadata
                    .clone()
                    .with_chunk_index(i as u32)
                    .with_annotation("chunk_length", chunk.chars().count().to_string());
                VectorPoint::new(generate_point_id(), vector, category, chunk)
                    .with_metadata(chunk_metadata)
            })
            .collect();

        let count = points.len();
        self.client
            .upsert_points(&self.collection, points, WriteConsistency::Strong)
            .await?;

        info!(
            collection = %self.collection,
            %category,
            chunks = count,
            source = metadata.source.as_deref().unwrap_or("-"),
            "ingested document"
        );
        Ok(count)
    }
}

#[async_trait]
impl<V> ContextRetriever for VectorRetriever<V>
where
    V: VectorDbClient + 'static,
{
    async fn search_similar(
        &self,
        query: &str,
        category: Category,
        top_k: usize,
    ) -> RetrievalResult<Vec<ContextFragment>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;
        let hits = self
            .client
            .search(&self.collection, vector, top_k as u64, Some(category))
            .await?;

        debug!(%category, top_k, hits = hits.len(), "similarity search");

        Ok(hits
            .into_iter()
            .filter(|hit| hit.category == category)
            .take(top_k)
            .map(|hit| hit.into_fragment())
            .collect())
    }
}
