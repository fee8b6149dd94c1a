use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::GuideCache;
use crate::error::AppError;
use mcp_common::embedding::Embedder;
use mcp_common::vectordb::{VectorDb, VectorHit};

const VECTOR_TABLE_NAME: &str = "style_guide_entries";
const MAX_SUMMARY_LEN: usize = 300;

/// A ranked search match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryHit {
    pub anchor: String,
    pub title: String,
    /// Higher is better, in [0, 1].
    pub score: f32,
    pub summary: String,
}

pub struct SearchEngine {
    embedder: Arc<Embedder>,
    vectordb: Arc<VectorDb>,
    cache: Arc<GuideCache>,
}

impl SearchEngine {
    pub fn new(embedder: Arc<Embedder>, vectordb: Arc<VectorDb>, cache: Arc<GuideCache>) -> Self {
        Self {
            embedder,
            vectordb,
            cache,
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<EntryHit>, AppError> {
        if let Some(cached) = self.cache.get_search_results(query, limit).await {
            info!(query, "search cache hit");
            return Ok(cached);
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        let hits: Vec<EntryHit> = self
            .vectordb
            .search(VECTOR_TABLE_NAME, &query_embedding, limit)
            .await?
            .into_iter()
            .map(to_entry_hit)
            .collect();

        self.cache.set_search_results(query, limit, &hits).await;
        Ok(hits)
    }

    pub fn table_name() -> &'static str {
        VECTOR_TABLE_NAME
    }
}

fn to_entry_hit(hit: VectorHit) -> EntryHit {
    EntryHit {
        score: (1.0_f32 - hit.distance).max(0.0),
        summary: summarize(&hit.text),
        anchor: hit.key,
        title: hit.title,
    }
}

fn summarize(text: &str) -> String {
    if text.chars().count() > MAX_SUMMARY_LEN {
        format!("{}...", text.chars().take(MAX_SUMMARY_LEN).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_maps_to_clamped_score() {
        let hit = to_entry_hit(VectorHit {
            key: "validation".to_string(),
            title: "Validation".to_string(),
            text: "Move validation to Request classes.".to_string(),
            distance: 0.25,
        });
        assert_eq!(hit.anchor, "validation");
        assert_eq!(hit.score, 0.75);

        let far = to_entry_hit(VectorHit {
            key: "eager-loading".to_string(),
            title: "Eager loading".to_string(),
            text: String::new(),
            distance: 1.7,
        });
        assert_eq!(far.score, 0.0);
    }

    #[test]
    fn long_summaries_are_truncated() {
        let text = "é".repeat(MAX_SUMMARY_LEN + 10);
        let summary = summarize(&text);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), MAX_SUMMARY_LEN + 3);
        assert_eq!(summarize("short"), "short");
    }
}
