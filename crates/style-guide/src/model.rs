use serde::{Deserialize, Serialize};

/// One topic of the guide: a heading at entry level and everything up to the next
/// heading of the same or higher level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideEntry {
    /// Heading text with wrapping emphasis removed, e.g. "Fat models, skinny controllers"
    pub title: String,
    /// Anchor derived from the title, e.g. "fat-models-skinny-controllers"
    pub anchor: String,
    /// 1-based line of the heading in the source document
    pub line: usize,
    /// Markdown below the heading, trimmed
    pub body: String,
    /// Heading plus body, as written
    pub raw_markdown: String,
    pub examples: Vec<Example>,
    pub tables: Vec<ComparisonTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleKind {
    Discouraged,
    Preferred,
}

impl ExampleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExampleKind::Discouraged => "discouraged",
            ExampleKind::Preferred => "preferred",
        }
    }
}

/// A "Bad:" / "Good:" marker and the code block that follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub kind: ExampleKind,
    /// Marker text without the trailing colon, e.g. "Bad" or "Good example"
    pub label: String,
    pub line: usize,
    /// `None` when no fenced block follows the marker.
    pub snippet: Option<CodeSnippet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSnippet {
    /// Fence info string, e.g. "php"
    pub language: Option<String>,
    pub code: String,
    /// Line of the opening fence
    pub line: usize,
}

/// Discouraged/preferred halves matched up within one entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExamplePair<'a> {
    pub discouraged: Option<&'a Example>,
    pub preferred: Option<&'a Example>,
}

impl GuideEntry {
    /// Pairs each discouraged example with the preferred example that follows it.
    /// Preferred examples with no discouraged predecessor stand alone, since the
    /// discouraged half is optional.
    pub fn example_pairs(&self) -> Vec<ExamplePair<'_>> {
        let mut pairs = Vec::new();
        let mut pending: Option<&Example> = None;
        for example in &self.examples {
            match example.kind {
                ExampleKind::Discouraged => {
                    if let Some(prev) = pending.replace(example) {
                        pairs.push(ExamplePair {
                            discouraged: Some(prev),
                            preferred: None,
                        });
                    }
                }
                ExampleKind::Preferred => pairs.push(ExamplePair {
                    discouraged: pending.take(),
                    preferred: Some(example),
                }),
            }
        }
        if let Some(prev) = pending {
            pairs.push(ExamplePair {
                discouraged: Some(prev),
                preferred: None,
            });
        }
        pairs
    }
}

/// A pipe table embedded in an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub concept: String,
    pub recommended: String,
    pub discouraged: Option<String>,
}

const RECOMMENDED_HEADERS: &[&str] = &["good", "standard", "recommended", "preferred"];
const DISCOURAGED_HEADERS: &[&str] = &["bad", "third-party", "3rd party", "avoid", "discouraged"];

impl ComparisonTable {
    /// Rows read as (concept, recommended form, discouraged form).
    ///
    /// Columns are picked by header name; without a recognisable header the second
    /// column is the recommended form and the third the discouraged one. A
    /// two-column table with no named concept column is a before/after table: the
    /// first column is the discouraged form, the second the recommended one, and
    /// the discouraged form also names the concept.
    pub fn comparison_rows(&self) -> Vec<ComparisonRow> {
        if self.is_before_after() {
            return self
                .rows
                .iter()
                .filter_map(|row| {
                    let before = row.first()?.clone();
                    Some(ComparisonRow {
                        concept: before.clone(),
                        recommended: row.get(1).cloned().unwrap_or_default(),
                        discouraged: Some(before).filter(|cell| !cell.is_empty()),
                    })
                })
                .collect();
        }

        let named_discouraged = find_column(&self.headers, DISCOURAGED_HEADERS);
        let recommended = find_column(&self.headers, RECOMMENDED_HEADERS)
            .or_else(|| (1..self.headers.len()).find(|&c| Some(c) != named_discouraged))
            .unwrap_or(1);
        let discouraged = named_discouraged
            .or_else(|| (self.headers.len() > 2).then_some(2))
            .filter(|&c| c != recommended);

        self.rows
            .iter()
            .filter_map(|row| {
                let concept = row.first()?.clone();
                let recommended = row.get(recommended).cloned().unwrap_or_default();
                let discouraged = discouraged
                    .and_then(|c| row.get(c))
                    .filter(|cell| !cell.is_empty())
                    .cloned();
                Some(ComparisonRow {
                    concept,
                    recommended,
                    discouraged,
                })
            })
            .collect()
    }

    fn is_before_after(&self) -> bool {
        let [first, second] = self.headers.as_slice() else {
            return false;
        };
        let names_any = |h: &str| {
            header_matches(h, RECOMMENDED_HEADERS) || header_matches(h, DISCOURAGED_HEADERS)
        };
        header_matches(first, DISCOURAGED_HEADERS) || (!names_any(first) && !names_any(second))
    }
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(i, h)| header_matches(h, names).then_some(i))
}

/// Whole-word match, so "Badge" does not match "bad" and "Third-party" matches
/// "third party".
fn header_matches(header: &str, names: &[&str]) -> bool {
    let words = header_words(header);
    names.iter().any(|name| {
        let wanted = header_words(name);
        !wanted.is_empty() && words.windows(wanted.len()).any(|w| w == wanted.as_slice())
    })
}

fn header_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// One row of the rendered table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocRow {
    pub title: String,
    pub anchor: String,
}

/// Any ATX heading in the document, entry or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    pub anchor: String,
    pub line: usize,
}

/// An in-page link, `[text](#target)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub text: String,
    /// Anchor without the leading `#`
    pub target: String,
    pub line: usize,
}

/// Everything the parser extracts from one guide document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedGuide {
    /// First level-1 heading, if any
    pub title: Option<String>,
    pub headings: Vec<Heading>,
    pub entries: Vec<GuideEntry>,
    /// Links inside the table-of-contents section, in document order
    pub toc: Vec<LinkRef>,
    /// Line of the table-of-contents heading, when the document has one
    pub toc_line: Option<usize>,
    /// Every in-page link outside code blocks, TOC links included
    pub links: Vec<LinkRef>,
    /// Opening line of a code fence that is never closed
    pub unterminated_fence: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(kind: ExampleKind, line: usize) -> Example {
        Example {
            kind,
            label: kind.as_str().to_string(),
            line,
            snippet: None,
        }
    }

    fn entry_with(examples: Vec<Example>) -> GuideEntry {
        GuideEntry {
            title: "T".to_string(),
            anchor: "t".to_string(),
            line: 1,
            body: String::new(),
            raw_markdown: String::new(),
            examples,
            tables: Vec::new(),
        }
    }

    #[test]
    fn pairs_bad_with_following_good() {
        let entry = entry_with(vec![
            example(ExampleKind::Discouraged, 3),
            example(ExampleKind::Preferred, 8),
            example(ExampleKind::Preferred, 12),
        ]);
        let pairs = entry.example_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].discouraged.map(|e| e.line), Some(3));
        assert_eq!(pairs[0].preferred.map(|e| e.line), Some(8));
        assert!(pairs[1].discouraged.is_none());
        assert_eq!(pairs[1].preferred.map(|e| e.line), Some(12));
    }

    #[test]
    fn unmatched_bad_examples_stay_half_pairs() {
        let entry = entry_with(vec![
            example(ExampleKind::Discouraged, 3),
            example(ExampleKind::Discouraged, 9),
        ]);
        let pairs = entry.example_pairs();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.preferred.is_none()));
    }

    #[test]
    fn comparison_rows_follow_named_columns() {
        let table = ComparisonTable {
            headers: vec!["What".into(), "How".into(), "Good".into(), "Bad".into()],
            rows: vec![vec![
                "Controller".into(),
                "singular".into(),
                "ArticleController".into(),
                "~~ArticlesController~~".into(),
            ]],
            line: 1,
        };
        assert_eq!(
            table.comparison_rows(),
            vec![ComparisonRow {
                concept: "Controller".into(),
                recommended: "ArticleController".into(),
                discouraged: Some("~~ArticlesController~~".into()),
            }]
        );
    }

    #[test]
    fn comparison_rows_fall_back_to_position() {
        let table = ComparisonTable {
            headers: vec!["Task".into(), "Standard tools".into(), "3rd party tools".into()],
            rows: vec![
                vec!["Authorization".into(), "Policies".into(), "Entrust".into()],
                vec!["Testing".into(), "Phpunit".into(), String::new()],
            ],
            line: 1,
        };
        let rows = table.comparison_rows();
        assert_eq!(rows[0].recommended, "Policies");
        assert_eq!(rows[0].discouraged.as_deref(), Some("Entrust"));
        assert_eq!(rows[1].discouraged, None);

        let named = ComparisonTable {
            headers: vec!["Task".into(), "Standard tools".into()],
            rows: vec![vec!["Testing".into(), "Phpunit".into()]],
            line: 1,
        };
        assert_eq!(
            named.comparison_rows(),
            vec![ComparisonRow {
                concept: "Testing".into(),
                recommended: "Phpunit".into(),
                discouraged: None,
            }]
        );
    }

    #[test]
    fn two_column_tables_read_as_before_and_after() {
        let table = ComparisonTable {
            headers: vec!["Common syntax".into(), "Shorter and more readable syntax".into()],
            rows: vec![vec!["`Session::get('cart')`".into(), "`session('cart')`".into()]],
            line: 1,
        };
        assert_eq!(
            table.comparison_rows(),
            vec![ComparisonRow {
                concept: "`Session::get('cart')`".into(),
                recommended: "`session('cart')`".into(),
                discouraged: Some("`Session::get('cart')`".into()),
            }]
        );

        let labelled = ComparisonTable {
            headers: vec!["Bad".into(), "Good".into()],
            rows: vec![vec!["var x".into(), "const x".into()]],
            line: 1,
        };
        let rows = labelled.comparison_rows();
        assert_eq!(rows[0].recommended, "const x");
        assert_eq!(rows[0].discouraged.as_deref(), Some("var x"));
    }

    #[test]
    fn hyphenated_third_party_header_is_discouraged() {
        let table = ComparisonTable {
            headers: vec!["Task".into(), "Third-party".into(), "Built-in".into()],
            rows: vec![vec!["Auth".into(), "Entrust".into(), "Policies".into()]],
            line: 1,
        };
        assert_eq!(
            table.comparison_rows(),
            vec![ComparisonRow {
                concept: "Auth".into(),
                recommended: "Policies".into(),
                discouraged: Some("Entrust".into()),
            }]
        );
    }

    #[test]
    fn header_keywords_match_whole_words() {
        let table = ComparisonTable {
            headers: vec!["Problem".into(), "Cause".into(), "Good".into(), "Bad".into()],
            rows: vec![vec![
                "N+1".into(),
                "lazy load".into(),
                "eager load".into(),
                "loop".into(),
            ]],
            line: 1,
        };
        let rows = table.comparison_rows();
        assert_eq!(rows[0].recommended, "eager load");
        assert_eq!(rows[0].discouraged.as_deref(), Some("loop"));

        assert!(header_matches("**Good**", RECOMMENDED_HEADERS));
        assert!(header_matches("third party tools", DISCOURAGED_HEADERS));
        assert!(!header_matches("Badge", DISCOURAGED_HEADERS));
        assert!(!header_matches("Cause", RECOMMENDED_HEADERS));
    }
}
