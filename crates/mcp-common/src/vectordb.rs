/// LanceDB vector store.
///
/// Every table written through [`VectorDb`] has the same schema:
/// - key: Utf8 (not null), the stable identifier of the indexed item
/// - title: Utf8 (not null)
/// - text: Utf8 (not null), the text that was embedded
/// - embedding: FixedSizeList<Float32, 768> (not null)
///
/// Arrow is kept inside this module; callers deal in [`VectorRecord`] and [`VectorHit`].
use std::sync::Arc;

use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::{info, warn};

use crate::embedding::DIMENSIONS;
use crate::error::CommonError;

/// One row to index.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub key: String,
    pub title: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// One nearest-neighbour match. Smaller `distance` is closer.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub key: String,
    pub title: String,
    pub text: String,
    pub distance: f32,
}

pub struct VectorDb {
    db: lancedb::Connection,
}

impl VectorDb {
    pub async fn connect(path: &str) -> Result<Self, CommonError> {
        let db = lancedb::connect(path)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("connection failed: {e}")))?;
        Ok(Self { db })
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool, CommonError> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("listing tables failed: {e}")))?;
        Ok(names.iter().any(|n| n == table_name))
    }

    /// Drop `table_name` if present and write `records` as its new contents.
    pub async fn replace_table(
        &self,
        table_name: &str,
        records: &[VectorRecord],
    ) -> Result<(), CommonError> {
        let batch = build_record_batch(records)?;
        let schema = batch.schema();

        if self.table_exists(table_name).await? {
            self.db
                .drop_table(table_name)
                .await
                .map_err(|e| CommonError::VectorDb(format!("drop table failed: {e}")))?;
        }

        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);
        self.db
            .create_table(table_name, Box::new(reader))
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("create table failed: {e}")))?;

        info!(table = table_name, rows = records.len(), "vector table written");
        Ok(())
    }

    /// Up to `limit` rows nearest to `query`, closest first.
    pub async fn search(
        &self,
        table_name: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorHit>, CommonError> {
        let table = self
            .db
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("open table failed: {e}")))?;

        let stream = table
            .vector_search(query)
            .map_err(|e| CommonError::VectorDb(format!("vector search setup failed: {e}")))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("vector search failed: {e}")))?;

        let batches: Vec<RecordBatch> = futures::TryStreamExt::try_collect(stream)
            .await
            .map_err(|e| CommonError::VectorDb(format!("collecting search results failed: {e}")))?;

        Ok(batches.iter().flat_map(decode_hits).collect())
    }
}

fn record_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("embedding", embedding_type(), false),
    ]))
}

fn embedding_type() -> DataType {
    DataType::FixedSizeList(
        Arc::new(Field::new("item", DataType::Float32, true)),
        DIMENSIONS as i32,
    )
}

fn build_record_batch(records: &[VectorRecord]) -> Result<RecordBatch, CommonError> {
    if let Some(bad) = records.iter().find(|r| r.embedding.len() != DIMENSIONS) {
        return Err(CommonError::VectorDb(format!(
            "embedding for '{}' has {} dimensions, expected {DIMENSIONS}",
            bad.key,
            bad.embedding.len()
        )));
    }

    let keys: ArrayRef = Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.key.as_str())));
    let titles: ArrayRef = Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.title.as_str())));
    let texts: ArrayRef = Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.text.as_str())));

    let flat: Vec<f32> = records.iter().flat_map(|r| r.embedding.iter().copied()).collect();
    let embeddings: ArrayRef = Arc::new(
        FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            DIMENSIONS as i32,
            Arc::new(Float32Array::from(flat)),
            None,
        )
        .map_err(|e| CommonError::VectorDb(format!("failed to build embedding array: {e}")))?,
    );

    RecordBatch::try_new(record_schema(), vec![keys, titles, texts, embeddings])
        .map_err(|e| CommonError::VectorDb(format!("failed to build record batch: {e}")))
}

fn decode_hits(batch: &RecordBatch) -> Vec<VectorHit> {
    let (Some(keys), Some(titles), Some(texts)) = (
        string_column(batch, "key"),
        string_column(batch, "title"),
        string_column(batch, "text"),
    ) else {
        warn!("search result batch missing expected columns");
        return Vec::new();
    };
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    (0..batch.num_rows())
        .map(|row| VectorHit {
            key: keys.value(row).to_string(),
            title: titles.value(row).to_string(),
            text: texts.value(row).to_string(),
            distance: distances.map(|d| d.value(row)).unwrap_or(0.0),
        })
        .collect()
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
    batch
        .column_by_name(name)?
        .as_any()
        .downcast_ref::<StringArray>()
}
