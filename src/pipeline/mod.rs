//! The evaluation pipeline.
//!
//! ```text
//! load job ─> Processing ─> extract (subject, reference)
//!                        ─> retrieve (requirement, subject_rubric, brief, reference_rubric)
//!                        ─> score subject ─> score reference ─> synthesize
//!                        ─> persist result ─> Completed
//!             any error after Processing ─> Failed(message)
//! ```
//!
//! Every step runs under the job deadline. Store writes are retried; transient
//! retriever and scorer failures are retried when
//! [`PipelineConfig::collaborator_attempts`] allows it.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod retry;
pub mod text;


pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::EvaluationPipeline;
pub use text::truncate_chars;
