/// MCP server over a Markdown style guide.
///
/// Tools:
/// - `search_guide`: semantic search over entries
/// - `get_entry`: one entry by anchor (or title)
/// - `table_of_contents`: entry titles and anchors in document order
/// - `validate_guide`: structural findings for the loaded guide
/// - `update_guide`: re-index when the guide file changed
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::GuideCache;
use crate::config::Config;
use crate::index::{render_toc_markdown, TopicIndex};
use crate::model::{GuideEntry, ParsedGuide, TocRow};
use crate::search::SearchEngine;
use crate::update::{LoadedGuide, UpdateService};
use crate::validate::{self, LintReport};
use mcp_common::embedding::Embedder;
use mcp_common::mcp_api::{
    ComparisonRowInfo, EntryDetailResponse, EntrySearchResult, ExampleSnippet, GetEntryParams,
    LintFinding, SearchGuideParams, SearchGuideResponse, TableOfContentsResponse, TocRowInfo,
    UpdateGuideResponse, ValidateGuideResponse,
};
use mcp_common::vectordb::VectorDb;

/// The guide currently being served. Readers share it; `update_guide` swaps it whole.
pub struct AppState {
    pub guide: ParsedGuide,
    pub index: TopicIndex,
    pub revision: String,
}

impl From<LoadedGuide> for AppState {
    fn from(loaded: LoadedGuide) -> Self {
        Self {
            guide: loaded.guide,
            index: loaded.index,
            revision: loaded.revision,
        }
    }
}

#[derive(Clone)]
pub struct StyleGuideServer {
    state: Arc<RwLock<AppState>>,
    search_engine: Arc<SearchEngine>,
    update_service: Arc<UpdateService>,
    cache: Arc<GuideCache>,
    tool_router: ToolRouter<StyleGuideServer>,
}

impl StyleGuideServer {
    pub fn new(
        loaded: LoadedGuide,
        embedder: Arc<Embedder>,
        vectordb: Arc<VectorDb>,
        cache: Arc<GuideCache>,
        config: Config,
    ) -> Self {
        let search_engine = Arc::new(SearchEngine::new(
            Arc::clone(&embedder),
            Arc::clone(&vectordb),
            Arc::clone(&cache),
        ));

        let update_service = Arc::new(UpdateService::new(
            config,
            Arc::clone(&embedder),
            Arc::clone(&vectordb),
            Arc::clone(&cache),
        ));

        Self {
            state: Arc::new(RwLock::new(AppState::from(loaded))),
            search_engine,
            update_service,
            cache,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl StyleGuideServer {
    #[tool(description = "Search the style guide by semantic similarity. Returns ranked entries matching the query.")]
    async fn search_guide(
        &self,
        Parameters(params): Parameters<SearchGuideParams>,
    ) -> Result<Json<SearchGuideResponse>, String> {
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }

        let limit = params.limit.unwrap_or(10).clamp(1, 50) as usize;

        let hits = self
            .search_engine
            .search(&query, limit)
            .await
            .map_err(|e| format!("search failed: {e}"))?;

        let results = hits
            .into_iter()
            .map(|h| EntrySearchResult {
                anchor: h.anchor,
                title: h.title,
                score: h.score,
                summary: h.summary,
            })
            .collect();

        Ok(Json(SearchGuideResponse { results }))
    }

    #[tool(description = "Get the full content of one style guide entry by anchor (e.g. 'fat-models-skinny-controllers') or by title.")]
    async fn get_entry(
        &self,
        Parameters(params): Parameters<GetEntryParams>,
    ) -> Result<Json<EntryDetailResponse>, String> {
        let anchor = params.anchor.trim().to_string();
        if anchor.is_empty() {
            return Err("anchor must not be empty".to_string());
        }

        if let Some(cached) = self.cache.get_entry(&anchor).await {
            return Ok(Json(to_api_entry(&cached)));
        }

        let state = self.state.read().await;
        let entry = state.index.resolve(&anchor).map_err(|e| e.to_string())?;
        Ok(Json(to_api_entry(entry)))
    }

    #[tool(description = "List every style guide entry in document order with its anchor, plus the same list rendered as Markdown links.")]
    async fn table_of_contents(&self) -> Result<Json<TableOfContentsResponse>, String> {
        let rows = match self.cache.get_toc().await {
            Some(rows) => rows,
            None => self.state.read().await.index.render_index(),
        };
        Ok(Json(to_api_toc(rows)))
    }

    #[tool(description = "Check the loaded style guide for broken links, duplicate anchors, malformed good/bad example pairs and table-of-contents drift.")]
    async fn validate_guide(&self) -> Result<Json<ValidateGuideResponse>, String> {
        let state = self.state.read().await;
        let report = validate::validate(&state.guide);
        info!(
            revision = %state.revision,
            findings = report.findings.len(),
            "guide validated"
        );
        Ok(Json(to_api_report(&report)))
    }

    #[tool(description = "Re-read the style guide file and re-index it if its content changed.")]
    async fn update_guide(&self) -> Result<Json<UpdateGuideResponse>, String> {
        info!("update_guide tool invoked");

        let (result, loaded) = self
            .update_service
            .update()
            .await
            .map_err(|e| format!("update failed: {e}"))?;

        if let Some(loaded) = loaded {
            let entry_count = loaded.index.len();
            *self.state.write().await = AppState::from(loaded);
            info!(entry_count, "in-memory state updated");
        }

        let entry_count = if result.updated {
            result.entry_count
        } else {
            self.state.read().await.index.len()
        };

        Ok(Json(UpdateGuideResponse {
            updated: result.updated,
            revision: result.revision,
            entry_count,
        }))
    }
}

fn to_api_entry(entry: &GuideEntry) -> EntryDetailResponse {
    EntryDetailResponse {
        anchor: entry.anchor.clone(),
        title: entry.title.clone(),
        body: entry.body.clone(),
        raw_markdown: entry.raw_markdown.clone(),
        examples: entry
            .examples
            .iter()
            .map(|e| ExampleSnippet {
                kind: e.kind.as_str().to_string(),
                label: e.label.clone(),
                language: e.snippet.as_ref().and_then(|s| s.language.clone()),
                code: e.snippet.as_ref().map(|s| s.code.clone()),
            })
            .collect(),
        comparisons: entry
            .tables
            .iter()
            .flat_map(|t| t.comparison_rows())
            .map(|r| ComparisonRowInfo {
                concept: r.concept,
                recommended: r.recommended,
                discouraged: r.discouraged,
            })
            .collect(),
    }
}

fn to_api_toc(rows: Vec<TocRow>) -> TableOfContentsResponse {
    TableOfContentsResponse {
        markdown: render_toc_markdown(&rows),
        entries: rows
            .into_iter()
            .map(|r| TocRowInfo {
                title: r.title,
                anchor: r.anchor,
            })
            .collect(),
    }
}

fn to_api_report(report: &LintReport) -> ValidateGuideResponse {
    ValidateGuideResponse {
        clean: report.is_clean(),
        findings: report
            .findings
            .iter()
            .map(|f| LintFinding {
                kind: f.kind().to_string(),
                line: f.line(),
                message: f.to_string(),
            })
            .collect(),
    }
}

#[tool_handler]
impl ServerHandler for StyleGuideServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "style-guide".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Style guide MCP server. Serves the entries of a Markdown coding style \
                 guide. Use table_of_contents to browse, get_entry to read one entry with \
                 its good/bad examples, search_guide for natural language queries, \
                 validate_guide to check the document's structure, and update_guide after \
                 the guide file changes."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuideFormat;
    use crate::parser::parse_guide;

    #[test]
    fn tools_publish_output_schemas() {
        let tools = StyleGuideServer::tool_router().list_all();
        for name in [
            "search_guide",
            "get_entry",
            "table_of_contents",
            "validate_guide",
            "update_guide",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[test]
    fn entry_response_carries_examples_and_comparisons() {
        let content = "### Standard tools

Task | Standard tools | 3rd party tools
---- | ---- | ----
Testing | Phpunit | Phpspec

Bad:

```php
$x = new Foo;
```
";
        let guide = parse_guide(content, &GuideFormat::default());
        let response = to_api_entry(&guide.entries[0]);
        assert_eq!(response.anchor, "standard-tools");
        assert_eq!(response.examples.len(), 1);
        assert_eq!(response.examples[0].kind, "discouraged");
        assert_eq!(response.examples[0].language.as_deref(), Some("php"));
        assert_eq!(response.comparisons.len(), 1);
        assert_eq!(response.comparisons[0].recommended, "Phpunit");
        assert_eq!(response.comparisons[0].discouraged.as_deref(), Some("Phpspec"));

        let report = to_api_report(&validate::validate(&guide));
        assert!(!report.clean);
        assert_eq!(report.findings[0].kind, "malformed_example");
        assert_eq!(report.findings[0].line, 7);
    }

    #[test]
    fn toc_markdown_follows_the_listed_rows() {
        let rows = vec![
            TocRow {
                title: "Foo Bar".to_string(),
                anchor: "foo-bar".to_string(),
            },
            TocRow {
                title: "Baz".to_string(),
                anchor: "baz".to_string(),
            },
        ];
        let response = to_api_toc(rows);
        assert_eq!(response.entries.len(), 2);
        assert_eq!(response.entries[1].anchor, "baz");
        assert_eq!(response.markdown, "- [Foo Bar](#foo-bar)\n- [Baz](#baz)\n");

        let empty = to_api_toc(Vec::new());
        assert!(empty.entries.is_empty());
        assert!(empty.markdown.is_empty());
    }
}
