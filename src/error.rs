use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("[Configuration Error] {0}")]
    Configuration(String),

    #[error("[Key Error] key not found")]
    KeyNotFound,

    #[error("[Unsupported Operation] {0}")]
    Unsupported(&'static str),
}
