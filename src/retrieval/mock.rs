use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{RetrievalError, RetrievalResult};
use super::ContextRetriever;
use crate::domain::{Category, ContextFragment};
use crate::vectordb::VectorDbError;

/// A search the pipeline issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    pub query: String,
    pub category: Category,
    pub top_k: usize,
}

/// Retriever serving canned fragments per category and recording every query.
#[derive(Debug, Default)]
pub struct StaticRetriever {
    fragments: HashMap<Category, Vec<ContextFragment>>,
    failing: HashSet<Category>,
    transient_failures: AtomicUsize,
    delay: Option<Duration>,
    queries: Mutex<Vec<RecordedQuery>>,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `count` numbered fragments for every category.
    pub fn populated(count: usize) -> Self {
        Category::ALL.into_iter().fold(Self::new(), |retriever, category| {
            let fragments = (0..count)
                .map(|i| ContextFragment::new(format!("{category} fragment {i}"), category))
                .collect();
            retriever.with_fragments(category, fragments)
        })
    }

    pub fn with_fragments(mut self, category: Category, fragments: Vec<ContextFragment>) -> Self {
        self.fragments.insert(category, fragments);
        self
    }

    /// Every search in `category` fails with a non-transient error.
    pub fn with_failure(mut self, category: Category) -> Self {
        self.failing.insert(category);
        self
    }

    /// The next `times` searches fail with a transient backend error.
    pub fn with_transient_failures(self, times: usize) -> Self {
        self.transient_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ContextRetriever for StaticRetriever {
    async fn search_similar(
        &self,
        query: &str,
        category: Category,
        top_k: usize,
    ) -> RetrievalResult<Vec<ContextFragment>> {
        self.queries.lock().push(RecordedQuery {
            query: query.to_string(),
            category,
            top_k,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let transient = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if transient {
            return Err(RetrievalError::VectorDb(VectorDbError::SearchFailed {
                collection: "static".to_string(),
                message: "temporarily unavailable".to_string(),
            }));
        }

        if self.failing.contains(&category) {
            return Err(RetrievalError::VectorDb(VectorDbError::CollectionNotFound {
                collection: category.to_string(),
            }));
        }

        Ok(self
            .fragments
            .get(&category)
            .map(|f| f.iter().take(top_k).cloned().collect())
            .unwrap_or_default())
    }
}
