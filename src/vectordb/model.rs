use std::collections::HashMap;

use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{ScoredPoint, Value};

use crate::domain::{Category, ContextFragment, FragmentMetadata};

pub(crate) const PAYLOAD_CATEGORY: &str = "category";
pub(crate) const PAYLOAD_CONTENT: &str = "content";
pub(crate) const PAYLOAD_SOURCE: &str = "source";
pub(crate) const PAYLOAD_VERSION: &str = "version";
pub(crate) const PAYLOAD_CHUNK_INDEX: &str = "chunk_index";
pub(crate) const PAYLOAD_ANNOTATION_PREFIX: &str = "ann.";

/// A fragment of corpus text and its embedding, ready to upsert.
#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub category: Category,
    pub content: String,
    pub metadata: FragmentMetadata,
}

impl VectorPoint {
    pub fn new(id: u64, vector: Vec<f32>, category: Category, content: impl Into<String>) -> Self {
        Self {
            id,
            vector,
            category,
            content: content.into(),
            metadata: FragmentMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: FragmentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Flattens category, content and metadata into a Qdrant payload.
    pub fn payload(&self) -> HashMap<String, Value> {
        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert(PAYLOAD_CATEGORY.to_string(), self.category.as_str().to_string().into());
        payload.insert(PAYLOAD_CONTENT.to_string(), self.content.clone().into());
        if let Some(source) = &self.metadata.source {
            payload.insert(PAYLOAD_SOURCE.to_string(), source.clone().into());
        }
        if let Some(version) = &self.metadata.version {
            payload.insert(PAYLOAD_VERSION.to_string(), version.clone().into());
        }
        if let Some(index) = self.metadata.chunk_index {
            payload.insert(PAYLOAD_CHUNK_INDEX.to_string(), i64::from(index).into());
        }
        for (key, value) in &self.metadata.annotations {
            payload.insert(
                format!("{PAYLOAD_ANNOTATION_PREFIX}{key}"),
                value.clone().into(),
            );
        }
        payload
    }
}

/// One hit from a similarity search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: u64,
    pub score: f32,
    pub category: Category,
    pub content: String,
    pub metadata: FragmentMetadata,
}

impl SearchResult {
    /// Returns `None` for points without a numeric id or a known category.
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Num(n)) => n,
            _ => return None,
        };

        let payload = point.payload;
        let text = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());

        let category = text(PAYLOAD_CATEGORY)?.parse::<Category>().ok()?;
        let content = text(PAYLOAD_CONTENT).unwrap_or_default();

        let mut metadata = FragmentMetadata {
            source: text(PAYLOAD_SOURCE),
            version: text(PAYLOAD_VERSION),
            chunk_index: payload
                .get(PAYLOAD_CHUNK_INDEX)
                .and_then(|v| v.as_integer())
                .and_then(|i| u32::try_from(i).ok()),
            ..FragmentMetadata::default()
        };
        for (key, value) in &payload {
            if let Some(name) = key.strip_prefix(PAYLOAD_ANNOTATION_PREFIX)
                && let Some(value) = value.as_str()
            {
                metadata.annotations.insert(name.to_string(), value.to_string());
            }
        }

        Some(SearchResult {
            id,
            score: point.score,
            category,
            content,
            metadata,
        })
    }

    pub fn into_fragment(self) -> ContextFragment {
        ContextFragment::new(self.content, self.category)
            .with_score(self.score)
            .with_metadata(self.metadata)
    }
}

/// Random point id (Qdrant accepts unsigned integers).
pub fn generate_point_id() -> u64 {
    uuid::Uuid::new_v4().as_u64_pair().0
}
