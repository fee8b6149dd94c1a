use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchGuideParams {
    /// The search query describing what you're looking for.
    pub query: String,
    /// Maximum number of results to return (default: 10, max: 50).
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetEntryParams {
    /// Entry anchor such as "fat-models-skinny-controllers", or the entry title.
    pub anchor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntrySearchResult {
    pub anchor: String,
    pub title: String,
    pub score: f32,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchGuideResponse {
    pub results: Vec<EntrySearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExampleSnippet {
    /// "discouraged" or "preferred".
    pub kind: String,
    /// Marker text as written in the guide, e.g. "Bad" or "Good".
    pub label: String,
    pub language: Option<String>,
    /// `None` when the marker has no code block.
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonRowInfo {
    pub concept: String,
    pub recommended: String,
    pub discouraged: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntryDetailResponse {
    pub anchor: String,
    pub title: String,
    pub body: String,
    pub raw_markdown: String,
    pub examples: Vec<ExampleSnippet>,
    pub comparisons: Vec<ComparisonRowInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TocRowInfo {
    pub title: String,
    pub anchor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableOfContentsResponse {
    pub entries: Vec<TocRowInfo>,
    /// The same rows rendered as a Markdown list of links.
    pub markdown: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LintFinding {
    /// Finding class, e.g. "broken_link" or "malformed_example".
    pub kind: String,
    /// 1-based line in the guide source.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidateGuideResponse {
    pub clean: bool,
    pub findings: Vec<LintFinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateGuideResponse {
    pub updated: bool,
    /// Content digest of the guide that is now loaded.
    pub revision: String,
    pub entry_count: usize,
}
