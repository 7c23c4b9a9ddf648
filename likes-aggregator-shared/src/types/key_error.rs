use thiserror::Error;

/// Errors raised when a key component extracted from a vote path is malformed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Item key must not be empty")]
    EmptyItemKey,
    #[error("Item key is {0} characters long, the maximum is 200")]
    ItemKeyTooLong(usize),
    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
}
