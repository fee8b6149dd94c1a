/// Topic index: guide entries in insertion order, addressable by anchor.
///
/// Entries live in a `Vec` that is only ever appended to; a side map from anchor to
/// position gives O(1) lookup. Insertion order is the only ordering the index knows.
use std::collections::HashMap;

use tracing::warn;

use crate::anchor::slugify;
use crate::model::{GuideEntry, TocRow};
use crate::parser;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("anchor '{anchor}' already used by entry '{existing}'")]
    DuplicateAnchor { anchor: String, existing: String },

    #[error("no entry with anchor '{0}'")]
    NotFound(String),
}

#[derive(Debug, Clone, Default)]
pub struct TopicIndex {
    entries: Vec<GuideEntry>,
    positions: HashMap<String, usize>,
}

impl TopicIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed entries, skipping any whose anchor is already taken.
    pub fn from_entries(entries: impl IntoIterator<Item = GuideEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            let line = entry.line;
            if let Err(e) = index.insert(entry) {
                warn!(error = %e, line, "skipping guide entry");
            }
        }
        index
    }

    /// Build from parsed entries, failing on the first anchor collision.
    pub fn try_from_entries(
        entries: impl IntoIterator<Item = GuideEntry>,
    ) -> Result<Self, IndexError> {
        let mut index = Self::new();
        for entry in entries {
            index.insert(entry)?;
        }
        Ok(index)
    }

    /// Append an entry built from a title and Markdown body. The anchor is the slug of
    /// the title.
    ///
    /// Line numbers refer to the document formed by joining every entry's
    /// `raw_markdown` with one blank line, so an added entry starts right after the
    /// previous one.
    pub fn add_entry(&mut self, title: &str, body: &str) -> Result<&GuideEntry, IndexError> {
        let line = self
            .entries
            .last()
            .map_or(1, |e| e.line + e.raw_markdown.lines().count() + 1);
        self.insert(parser::parse_entry_body(title, body, line))
    }

    pub fn insert(&mut self, entry: GuideEntry) -> Result<&GuideEntry, IndexError> {
        if let Some(&pos) = self.positions.get(&entry.anchor) {
            return Err(IndexError::DuplicateAnchor {
                anchor: entry.anchor,
                existing: self.entries[pos].title.clone(),
            });
        }
        let pos = self.entries.len();
        self.positions.insert(entry.anchor.clone(), pos);
        self.entries.push(entry);
        Ok(&self.entries[pos])
    }

    pub fn lookup(&self, anchor: &str) -> Result<&GuideEntry, IndexError> {
        self.positions
            .get(anchor)
            .map(|&pos| &self.entries[pos])
            .ok_or_else(|| IndexError::NotFound(anchor.to_string()))
    }

    /// Lookup that also accepts `#anchor` or a title.
    pub fn resolve(&self, query: &str) -> Result<&GuideEntry, IndexError> {
        let query = query.trim();
        let bare = query.strip_prefix('#').unwrap_or(query);
        self.lookup(bare)
            .or_else(|_| self.lookup(&slugify(bare)))
            .map_err(|_| IndexError::NotFound(bare.to_string()))
    }

    pub fn render_index(&self) -> Vec<TocRow> {
        self.entries
            .iter()
            .map(|e| TocRow {
                title: e.title.clone(),
                anchor: e.anchor.clone(),
            })
            .collect()
    }

    /// The table of contents as a Markdown list of in-page links.
    pub fn render_toc_markdown(&self) -> String {
        render_toc_markdown(&self.render_index())
    }

    pub fn entries(&self) -> &[GuideEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn render_toc_markdown(rows: &[TocRow]) -> String {
    rows.iter()
        .map(|r| format!("- [{}](#{})\n", r.title, r.anchor))
        .collect()
}
