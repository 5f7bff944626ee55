use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{DomainError, DomainResult};
use super::ids::{DocumentId, JobId};

/// Lifecycle status of an evaluation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to evaluate a subject document and a reference document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationJob {
    id: JobId,
    title: String,
    subject_id: DocumentId,
    reference_id: DocumentId,
    status: JobStatus,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl EvaluationJob {
    /// Creates a new `Queued` job with a fresh id.
    pub fn new(title: impl Into<String>, subject_id: DocumentId, reference_id: DocumentId) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            title: title.into(),
            subject_id,
            reference_id,
            status: JobStatus::Queued,
            error_message: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subject_id(&self) -> DocumentId {
        self.subject_id
    }

    pub fn reference_id(&self) -> DocumentId {
        self.reference_id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Failure message; present only on `Failed` jobs.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// `Queued -> Processing`. Sets `started_at`.
    pub fn mark_processing(&mut self) -> DomainResult<()> {
        self.ensure_from(JobStatus::Queued, JobStatus::Processing)?;
        let now = Utc::now();
        self.status = JobStatus::Processing;
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `Processing -> Completed`. Sets `completed_at`.
    pub fn mark_completed(&mut self) -> DomainResult<()> {
        self.ensure_from(JobStatus::Processing, JobStatus::Completed)?;
        let now = Utc::now();
        self.status = JobStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `Processing -> Failed`. Sets `completed_at` and the error message.
    ///
    /// A blank message is replaced so failed jobs always explain themselves.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> DomainResult<()> {
        self.ensure_from(JobStatus::Processing, JobStatus::Failed)?;
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "evaluation failed".to_string();
        }
        let now = Utc::now();
        self.status = JobStatus::Failed;
        self.error_message = Some(message);
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Checks that timestamps and error message agree with the status.
    pub fn check_consistency(&self) -> DomainResult<()> {
        let started = !matches!(self.status, JobStatus::Queued);
        let finished = self.status.is_terminal();
        let failed = self.status == JobStatus::Failed;

        let reason = if self.started_at.is_some() != started {
            Some("started_at does not match status")
        } else if self.completed_at.is_some() != finished {
            Some("completed_at does not match status")
        } else if self.error_message.is_some() != failed {
            Some("error_message does not match status")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(DomainError::InconsistentRecord {
                job_id: self.id,
                reason,
            }),
            None => Ok(()),
        }
    }

    fn ensure_from(&self, from: JobStatus, to: JobStatus) -> DomainResult<()> {
        if self.status == from {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                job_id: self.id,
                from: self.status,
                to,
            })
        }
    }
}
