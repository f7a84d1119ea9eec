use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeasibilityError {
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("invalid cost model: {0}")]
    InvalidCostModel(String),
}

impl FeasibilityError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}
