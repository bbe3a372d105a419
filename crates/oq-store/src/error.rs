use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("write conflict on {key}: existing shape/dtype is incompatible with the new value")]
    WriteConflict { key: String },

    #[error("serialization error for key {key}: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("attribute not found: {0}")]
    AttrNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
