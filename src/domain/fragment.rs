use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Corpus a context fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Job requirements the subject document is matched against.
    Requirement,
    /// Rubric for scoring the subject document.
    SubjectRubric,
    /// Project brief the reference document answers.
    Brief,
    /// Rubric for scoring the reference document.
    ReferenceRubric,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Requirement,
        Category::SubjectRubric,
        Category::Brief,
        Category::ReferenceRubric,
    ];

    /// Payload tag stored alongside each vector.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requirement => "requirement",
            Self::SubjectRubric => "subject_rubric",
            Self::Brief => "brief",
            Self::ReferenceRubric => "reference_rubric",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownCategory(s.to_string()))
    }
}

/// Provenance attached to an indexed fragment.
///
/// The well-known keys are typed fields; anything else goes in `annotations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl FragmentMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_chunk_index(mut self, index: u32) -> Self {
        self.chunk_index = Some(index);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// A snippet of indexed text returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFragment {
    pub content: String,
    pub category: Category,
    /// Similarity score reported by the index (higher is closer).
    pub score: f32,
    pub metadata: FragmentMetadata,
}

impl ContextFragment {
    pub fn new(content: impl Into<String>, category: Category) -> Self {
        Self {
            content: content.into(),
            category,
            score: 0.0,
            metadata: FragmentMetadata::default(),
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn with_metadata(mut self, metadata: FragmentMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
