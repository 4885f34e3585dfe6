use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Invalid input for customer '{customer_id}': field '{field}' {reason}")]
    InvalidInput {
        customer_id: String,
        field:       &'static str,
        reason:      String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scoring run '{run_id}' not found")]
    RunNotFound { run_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScoreError {
    pub fn invalid(customer_id: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            customer_id: customer_id.to_string(),
            field,
            reason: reason.into(),
        }
    }

    /// The offending field, for `InvalidInput` errors only.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidInput { field, .. } => Some(*field),
            _ => None,
        }
    }
}

pub type ScoreResult<T> = Result<T, ScoreError>;
