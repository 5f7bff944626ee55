//! Appraisal library crate (used by the server and integration tests).
//!
//! Asynchronous evaluation of a subject document (a CV) against a reference
//! document (a project report), grounded in context retrieved from a vector
//! store and scored by an LLM.
//!
//! # Layout
//!
//! - [`queue`]: bounded buffer and fixed worker pool.
//! - [`pipeline`]: the per-job state machine the workers run.
//! - [`service`]: job creation, submission and status lookup.
//! - [`gateway`]: the HTTP surface over the service.
//! - Collaborators behind traits: [`store`], [`extract`], [`retrieval`],
//!   [`scoring`]. [`vectordb`] is the Qdrant backend for retrieval.
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod domain;
pub mod extract;
pub mod gateway;
pub mod pipeline;
pub mod queue;
pub mod retrieval;
pub mod scoring;
pub mod service;
pub mod store;
pub mod vectordb;

pub use config::{Config, ConfigError};
pub use domain::{
    Category, ContextFragment, Document, DocumentId, DocumentRole, EvaluationJob,
    EvaluationResult, FragmentMetadata, JobId, JobStatus,
};
pub use extract::{ExtractError, FileTextExtractor, TextExtractor};
pub use pipeline::{EvaluationPipeline, PipelineConfig, PipelineError};
pub use queue::{JobProcessor, JobQueue, QueueConfig, QueueError};
pub use retrieval::{ContextRetriever, Embedder, RetrievalError, VectorRetriever};
pub use scoring::{ReferenceEvaluation, Scorer, ScoringError, SubjectEvaluation};
pub use service::{EvaluationService, JobStatusView, SubmissionError};
pub use store::{DocumentStore, JobStore, ResultStore, StoreError, Stores};
