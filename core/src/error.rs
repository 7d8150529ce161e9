use thiserror::Error;

#[derive(Error, Debug)]
pub enum LendError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidInput { field: &'static str, value: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LendError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidInput { field, value: value.into() }
    }

    /// True for the distinct "requested thing does not exist" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type LendResult<T> = Result<T, LendError>;
