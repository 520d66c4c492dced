use thiserror::Error;

#[derive(Error, Debug)]
pub enum CivicPulseError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid coordinate: ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Duplicate check failed: {0}")]
    DuplicateCheckFailed(String),

    #[error("Resolution rejected: confidence {confidence:.2} below threshold")]
    LowConfidenceRejection { confidence: f64, reasoning: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl CivicPulseError {
    /// Build an InvalidTransition from any pair of displayable statuses.
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
