//! Record stores for jobs, results and documents.
//!
//! The traits are the persistence boundary of the pipeline. In-memory
//! implementations back the binary and the tests; a database-backed store
//! only has to honor the contracts documented on each trait.

pub mod error;
pub mod memory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod traits;

#[cfg(test)]
mod tests;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryDocumentStore, MemoryJobStore, MemoryResultStore};
#[cfg(any(test, feature = "mock"))]
pub use mock::{FlakyJobStore, FlakyResultStore};
pub use traits::{DocumentStore, JobStore, ResultStore};

use std::sync::Arc;

/// The three record stores, shared by the pipeline and the submission service.
#[derive(Clone)]
pub struct Stores {
    pub jobs: Arc<dyn JobStore>,
    pub results: Arc<dyn ResultStore>,
    pub documents: Arc<dyn DocumentStore>,
}

impl Stores {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        results: Arc<dyn ResultStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            jobs,
            results,
            documents,
        }
    }

    /// Fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryJobStore::new()),
            Arc::new(MemoryResultStore::new()),
            Arc::new(MemoryDocumentStore::new()),
        )
    }
}
