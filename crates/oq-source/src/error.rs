use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("duplicate source id: {0}")]
    DuplicateSourceId(String),

    #[error("unknown source kind filter: {0}")]
    UnknownKind(String),
}

pub type SourceResult<T> = Result<T, SourceError>;
