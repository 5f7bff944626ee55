use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// The model provider could not be reached or rejected the request.
    #[error("provider error: {message}")]
    Provider { message: String },

    /// The model answered, but not in the expected shape.
    #[error("malformed model output: {message}")]
    MalformedOutput { message: String },

    /// A score was parsed but lies outside its allowed range.
    #[error("{field} {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The synthesized summary was empty.
    #[error("summary is empty")]
    EmptySummary,
}

impl ScoringError {
    /// Only provider failures are worth retrying; bad output stays bad.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// `true` for output that was produced but is unusable.
    pub fn is_invalid_output(&self) -> bool {
        matches!(self, Self::MalformedOutput { .. } | Self::OutOfRange { .. })
    }
}

pub type ScoringResult<T> = Result<T, ScoringError>;
