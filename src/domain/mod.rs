//! Core records: jobs, results, documents and retrieved context.
//!
//! A job moves `Queued -> Processing -> {Completed | Failed}`. The transition
//! methods on [`EvaluationJob`] are the only way to change status, so a job
//! value can never hold a status whose timestamps or error message disagree.

pub mod document;
pub mod error;
pub mod fragment;
pub mod ids;
pub mod job;
pub mod result;


pub use document::{Document, DocumentRole};
pub use error::{DomainError, DomainResult};
pub use fragment::{Category, ContextFragment, FragmentMetadata};
pub use ids::{DocumentId, JobId};
pub use job::{EvaluationJob, JobStatus};
pub use result::EvaluationResult;
