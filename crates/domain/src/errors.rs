use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TodoId: {0}")]
    InvalidTodoId(String),

    #[error("Invalid order field: {0}")]
    InvalidOrderField(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
