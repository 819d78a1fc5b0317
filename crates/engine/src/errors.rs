use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("stage '{0}' has no events to process")]
    EmptyStage(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
