use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ids::DocumentId;

/// Which side of an evaluation a document is uploaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    /// The candidate's own document (e.g. a CV).
    Subject,
    /// Work the candidate produced (e.g. a project report).
    Reference,
}

impl DocumentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subject" => Ok(Self::Subject),
            "reference" => Ok(Self::Reference),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// A stored upload the pipeline can extract text from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub role: DocumentRole,
    pub filename: String,
    pub file_path: PathBuf,
    pub size_bytes: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        role: DocumentRole,
        filename: impl Into<String>,
        file_path: impl Into<PathBuf>,
        size_bytes: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            role,
            filename: filename.into(),
            file_path: file_path.into(),
            size_bytes,
            mime_type: mime_type.into(),
            created_at: Utc::now(),
        }
    }
}
