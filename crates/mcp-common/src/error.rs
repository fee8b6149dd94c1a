/// Error types shared across guide server crates.
///
/// These cover the infrastructure pieces (cache payloads, vector store, embeddings)
/// every guide server sits on. Redis failures never surface here; the cache logs them
/// and degrades to a miss. Server crates define their own error enum and wrap
/// `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("cache payload error: {0}")]
    CachePayload(#[from] serde_json::Error),

    #[error("vector db error: {0}")]
    VectorDb(String),

    #[error("embedding error: {0}")]
    Embedding(String),
}
