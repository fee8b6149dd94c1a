/// Sentence embeddings via fastembed.
///
/// fastembed's `TextEmbedding` runs ONNX inference synchronously, so every call is moved
/// onto the blocking pool with `tokio::task::spawn_blocking`. The model handle lives behind
/// an `Arc` and is only touched from those blocking tasks.
///
/// nomic-embed-text-v1.5 distinguishes passages from queries by a task prefix; callers
/// pass plain text and the prefix is added here.
use std::sync::Arc;

use crate::error::CommonError;

/// Width of every vector produced by [`Embedder`].
pub const DIMENSIONS: usize = 768;

const PASSAGE_PREFIX: &str = "search_document: ";
const QUERY_PREFIX: &str = "search_query: ";
const DEFAULT_BATCH_SIZE: usize = 4;

pub struct Embedder {
    model: Arc<fastembed::TextEmbedding>,
    batch_size: usize,
}

impl Embedder {
    /// Load nomic-embed-text-v1.5, downloading it on first use.
    pub async fn new() -> Result<Self, CommonError> {
        Self::with_batch_size(DEFAULT_BATCH_SIZE).await
    }

    /// Load the model with an explicit inference batch size. Smaller batches bound
    /// peak memory while indexing long documents.
    pub async fn with_batch_size(batch_size: usize) -> Result<Self, CommonError> {
        let model = tokio::task::spawn_blocking(|| {
            let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::NomicEmbedTextV15)
                .with_show_download_progress(true);
            fastembed::TextEmbedding::try_new(options)
        })
        .await
        .map_err(|e| CommonError::Embedding(format!("embedding task panicked: {e}")))?
        .map_err(|e| CommonError::Embedding(format!("model initialization failed: {e}")))?;

        Ok(Self {
            model: Arc::new(model),
            batch_size: batch_size.max(1),
        })
    }

    /// Embed passages for indexing, one vector per input in input order.
    pub async fn embed_passages(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        let inputs = with_prefix(PASSAGE_PREFIX, texts);
        let expected = inputs.len();
        let vectors = self.run(inputs, Some(self.batch_size)).await?;
        if vectors.len() != expected {
            return Err(CommonError::Embedding(format!(
                "embedding count mismatch: expected {expected}, got {}",
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, CommonError> {
        let inputs = vec![format!("{QUERY_PREFIX}{query}")];
        self.run(inputs, None)
            .await?
            .pop()
            .ok_or_else(|| CommonError::Embedding("empty embedding result".to_string()))
    }

    async fn run(
        &self,
        inputs: Vec<String>,
        batch_size: Option<usize>,
    ) -> Result<Vec<Vec<f32>>, CommonError> {
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || model.embed(inputs, batch_size))
            .await
            .map_err(|e| CommonError::Embedding(format!("embedding task panicked: {e}")))?
            .map_err(|e| CommonError::Embedding(format!("inference failed: {e}")))
    }
}

fn with_prefix(prefix: &str, texts: &[String]) -> Vec<String> {
    texts.iter().map(|t| format!("{prefix}{t}")).collect()
}
