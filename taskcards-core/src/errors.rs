use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid collection name: must not be empty")]
    InvalidName,
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("no active collection")]
    NoActiveCollection,
    #[error("storage error: {0}")]
    Storage(&'static str),
}
