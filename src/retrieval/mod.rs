//! Similarity retrieval over the category-tagged context corpus.
//!
//! ```text
//! ingest:  text -> sentence chunks -> embed_batch -> upsert (category + metadata payload)
//! search:  query -> embed -> filtered top-K -> ContextFragment
//! ```
//!
//! [`VectorRetriever`] does both against any
//! [`VectorDbClient`](crate::vectordb::VectorDbClient); the pipeline
//! only sees the [`ContextRetriever`] trait.

pub mod chunking;
pub mod embedder;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod vector;


use async_trait::async_trait;

pub use chunking::chunk_by_sentence;
pub use embedder::{Embedder, HashEmbedder, HttpEmbedder};
pub use error::{RetrievalError, RetrievalResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::{RecordedQuery, StaticRetriever};
pub use vector::VectorRetriever;

use crate::domain::{Category, ContextFragment};

/// Top-K similarity search restricted to one category.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Returns at most `top_k` fragments, all tagged `category`, best first.
    async fn search_similar(
        &self,
        query: &str,
        category: Category,
        top_k: usize,
    ) -> RetrievalResult<Vec<ContextFragment>>;
}
