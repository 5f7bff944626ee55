use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use super::error::{ExtractError, ExtractResult};
use super::TextExtractor;
use crate::domain::{Document, DocumentId};

/// Extractor that serves canned text per document id.
#[derive(Debug, Default, Clone)]
pub struct StaticExtractor {
    texts: HashMap<DocumentId, String>,
    failing: HashSet<DocumentId>,
    delay: Option<Duration>,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, id: DocumentId, text: impl Into<String>) -> Self {
        self.texts.insert(id, text.into());
        self
    }

    /// Extraction of `id` fails as if the file were unreadable.
    pub fn with_failure(mut self, id: DocumentId) -> Self {
        self.failing.insert(id);
        self
    }

    /// Every extraction sleeps first (for timeout and shutdown tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract_text(&self, document: &Document) -> ExtractResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&document.id) {
            return Err(ExtractError::Io {
                path: document.file_path.clone(),
                message: "unreadable".to_string(),
            });
        }
        self.texts
            .get(&document.id)
            .cloned()
            .ok_or(ExtractError::Empty {
                document_id: document.id,
            })
    }
}
