/// Re-index service for the style guide.
///
/// The guide's revision is the SHA-256 of its file contents. When that differs from the
/// revision recorded in the cache, or the vector table is missing, the guide is parsed,
/// embedded and written to LanceDB again. Runs at startup and on demand via the
/// `update_guide` MCP tool.
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::cache::GuideCache;
use crate::config::Config;
use crate::error::AppError;
use crate::index::TopicIndex;
use crate::model::ParsedGuide;
use crate::parser;
use crate::search::SearchEngine;
use crate::validate;
use mcp_common::embedding::Embedder;
use mcp_common::vectordb::{VectorDb, VectorRecord};

pub struct UpdateResult {
    /// Whether a re-index actually ran.
    pub updated: bool,
    pub revision: String,
    /// Entries after the update; 0 when nothing was re-indexed.
    pub entry_count: usize,
}

/// A parsed guide together with its index and revision.
pub struct LoadedGuide {
    pub guide: ParsedGuide,
    pub index: TopicIndex,
    pub revision: String,
}

pub struct UpdateService {
    config: Config,
    embedder: Arc<Embedder>,
    vectordb: Arc<VectorDb>,
    cache: Arc<GuideCache>,
}

impl UpdateService {
    pub fn new(
        config: Config,
        embedder: Arc<Embedder>,
        vectordb: Arc<VectorDb>,
        cache: Arc<GuideCache>,
    ) -> Self {
        Self {
            config,
            embedder,
            vectordb,
            cache,
        }
    }

    /// Parse the guide from disk without touching the vector store.
    pub fn load(&self) -> Result<LoadedGuide, AppError> {
        let content = self.read_guide()?;
        let revision = content_revision(&content);
        let guide = parser::parse_guide(&content, &self.config.format);
        let index = TopicIndex::from_entries(guide.entries.iter().cloned());
        Ok(LoadedGuide {
            guide,
            index,
            revision,
        })
    }

    pub fn current_revision(&self) -> Result<String, AppError> {
        Ok(content_revision(&self.read_guide()?))
    }

    pub async fn needs_update(&self) -> Result<bool, AppError> {
        let current = self.current_revision()?;
        match self.cache.get_revision().await {
            Some(cached) if cached == current => {
                let table_present = self.vectordb.table_exists(SearchEngine::table_name()).await?;
                if !table_present {
                    info!("vector table missing, re-index needed");
                }
                Ok(!table_present)
            }
            _ => Ok(true),
        }
    }

    /// Parse, validate, embed and store the guide, then repopulate the cache.
    pub async fn full_reindex(&self) -> Result<LoadedGuide, AppError> {
        let loaded = self.load()?;
        info!(revision = %loaded.revision, "starting full re-index");

        let report = validate::validate(&loaded.guide);
        if !report.is_clean() {
            warn!(
                findings = report.findings.len(),
                "guide has structural problems, run `style-guide check` for details"
            );
        }

        let entries = loaded.index.entries();
        let texts: Vec<String> = entries.iter().map(parser::compose_embedding_text).collect();
        info!("generating embeddings for {} entries", entries.len());
        let embeddings = self.embedder.embed_passages(&texts).await?;

        let records: Vec<VectorRecord> = entries
            .iter()
            .zip(texts)
            .zip(embeddings)
            .map(|((entry, text), embedding)| VectorRecord {
                key: entry.anchor.clone(),
                title: entry.title.clone(),
                text,
                embedding,
            })
            .collect();
        self.vectordb
            .replace_table(SearchEngine::table_name(), &records)
            .await?;

        self.cache.invalidate_all().await;
        for entry in entries {
            self.cache.set_entry(entry).await;
        }
        self.cache.set_toc(&loaded.index.render_index()).await;
        self.cache.set_revision(&loaded.revision).await;

        info!(
            revision = %loaded.revision,
            entries = entries.len(),
            "re-index complete"
        );
        Ok(loaded)
    }

    /// Re-index if the guide changed since the last run.
    pub async fn update(&self) -> Result<(UpdateResult, Option<LoadedGuide>), AppError> {
        if !self.needs_update().await? {
            let revision = self.current_revision()?;
            info!(revision = %revision, "guide up to date, skipping re-index");
            return Ok((
                UpdateResult {
                    updated: false,
                    revision,
                    entry_count: 0,
                },
                None,
            ));
        }

        let loaded = self.full_reindex().await?;
        Ok((
            UpdateResult {
                updated: true,
                revision: loaded.revision.clone(),
                entry_count: loaded.index.len(),
            },
            Some(loaded),
        ))
    }

    fn read_guide(&self) -> Result<String, AppError> {
        std::fs::read_to_string(&self.config.guide_path).map_err(|e| {
            AppError::Config(format!(
                "failed to read {}: {e}",
                self.config.guide_path.display()
            ))
        })
    }
}

/// Hex SHA-256 of the guide text.
pub fn content_revision(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}
