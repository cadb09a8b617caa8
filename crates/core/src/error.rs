use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failures raised by the shared primitives in this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing (nil) or unparsable identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Stale version under optimistic concurrency.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_report_as_conflicts() {
        assert!(DomainError::conflict("stale").is_conflict());
        assert!(!DomainError::invalid_id("ProductId is required").is_conflict());
        assert_eq!(
            DomainError::invalid_id("ProductId is required").to_string(),
            "invalid identifier: ProductId is required"
        );
    }
}
