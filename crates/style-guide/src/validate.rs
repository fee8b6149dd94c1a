/// Structural checks over a parsed guide.
///
/// Checks only the document's own structure: link targets, anchor uniqueness, the
/// shape of example pairs and the table of contents. None of the findings stop the
/// guide from being served; they are reported to whoever maintains it.
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::model::ParsedGuide;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// A discouraged example with no preferred counterpart after it.
    MissingPreferred,
    /// An example marker not followed by a code block.
    MissingSnippet,
    /// A code fence that is never closed.
    UnterminatedFence,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MalformedReason::MissingPreferred => "discouraged example has no preferred counterpart",
            MalformedReason::MissingSnippet => "example marker is not followed by a code block",
            MalformedReason::UnterminatedFence => "code fence is never closed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LintError {
    #[error("line {line}: link target '#{target}' does not match any heading")]
    BrokenLink { line: usize, target: String },

    #[error("line {line}: anchor '{anchor}' already produced by the heading on line {first_line}")]
    DuplicateAnchor {
        line: usize,
        anchor: String,
        first_line: usize,
    },

    #[error("line {line}: malformed example in '{anchor}': {reason}")]
    MalformedExample {
        line: usize,
        anchor: String,
        reason: MalformedReason,
    },

    #[error("line {line}: entry '{anchor}' is missing from the table of contents")]
    UnlistedEntry { line: usize, anchor: String },

    #[error("line {line}: table of contents row '#{target}' does not point at a guide entry")]
    StaleTocRow { line: usize, target: String },

    #[error("line {line}: table of contents lists '#{target}' more than once")]
    DuplicateTocRow { line: usize, target: String },
}

impl LintError {
    pub fn kind(&self) -> &'static str {
        match self {
            LintError::BrokenLink { .. } => "broken_link",
            LintError::DuplicateAnchor { .. } => "duplicate_anchor",
            LintError::MalformedExample { .. } => "malformed_example",
            LintError::UnlistedEntry { .. } => "unlisted_entry",
            LintError::StaleTocRow { .. } => "stale_toc_row",
            LintError::DuplicateTocRow { .. } => "duplicate_toc_row",
        }
    }

    pub fn line(&self) -> usize {
        match self {
            LintError::BrokenLink { line, .. }
            | LintError::DuplicateAnchor { line, .. }
            | LintError::MalformedExample { line, .. }
            | LintError::UnlistedEntry { line, .. }
            | LintError::StaleTocRow { line, .. }
            | LintError::DuplicateTocRow { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    /// Ordered by source line.
    pub findings: Vec<LintError>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.findings.iter().filter(|f| f.kind() == kind).count()
    }
}

pub fn validate(guide: &ParsedGuide) -> LintReport {
    let mut findings = Vec::new();

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for heading in &guide.headings {
        match first_seen.get(heading.anchor.as_str()) {
            Some(&first_line) => findings.push(LintError::DuplicateAnchor {
                line: heading.line,
                anchor: heading.anchor.clone(),
                first_line,
            }),
            None => {
                first_seen.insert(&heading.anchor, heading.line);
            }
        }
    }

    for link in &guide.links {
        if !first_seen.contains_key(link.target.as_str()) {
            findings.push(LintError::BrokenLink {
                line: link.line,
                target: link.target.clone(),
            });
        }
    }

    check_examples(guide, &mut findings);
    check_toc(guide, &first_seen, &mut findings);

    findings.sort_by_key(LintError::line);
    LintReport { findings }
}

fn check_examples(guide: &ParsedGuide, findings: &mut Vec<LintError>) {
    for entry in &guide.entries {
        for example in entry.examples.iter().filter(|e| e.snippet.is_none()) {
            findings.push(LintError::MalformedExample {
                line: example.line,
                anchor: entry.anchor.clone(),
                reason: MalformedReason::MissingSnippet,
            });
        }
        for pair in entry.example_pairs() {
            if let (Some(discouraged), None) = (pair.discouraged, pair.preferred) {
                findings.push(LintError::MalformedExample {
                    line: discouraged.line,
                    anchor: entry.anchor.clone(),
                    reason: MalformedReason::MissingPreferred,
                });
            }
        }
    }

    if let Some(line) = guide.unterminated_fence {
        let anchor = guide
            .entries
            .iter()
            .rev()
            .find(|e| e.line <= line)
            .map(|e| e.anchor.clone())
            .unwrap_or_default();
        findings.push(LintError::MalformedExample {
            line,
            anchor,
            reason: MalformedReason::UnterminatedFence,
        });
    }
}

fn check_toc(
    guide: &ParsedGuide,
    heading_anchors: &HashMap<&str, usize>,
    findings: &mut Vec<LintError>,
) {
    if guide.toc_line.is_none() {
        return;
    }

    let entry_anchors: HashSet<&str> = guide.entries.iter().map(|e| e.anchor.as_str()).collect();
    let mut listed: HashSet<&str> = HashSet::new();
    for row in &guide.toc {
        let target = row.target.as_str();
        if !listed.insert(target) {
            findings.push(LintError::DuplicateTocRow {
                line: row.line,
                target: row.target.clone(),
            });
        } else if heading_anchors.contains_key(target) && !entry_anchors.contains(target) {
            findings.push(LintError::StaleTocRow {
                line: row.line,
                target: row.target.clone(),
            });
        }
    }

    for entry in &guide.entries {
        if !listed.contains(entry.anchor.as_str()) {
            findings.push(LintError::UnlistedEntry {
                line: entry.line,
                anchor: entry.anchor.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuideFormat;
    use crate::parser::parse_guide;

    fn lint(content: &str) -> LintReport {
        validate(&parse_guide(content, &GuideFormat::default()))
    }

    const CLEAN: &str = "# Guide

## Contents

[Foo Bar](#foo-bar)

[Naming](#naming)

### Foo Bar

Bad:

```js
var x = 1;
```

Good:

```js
const x = 1;
```

[Back to contents](#contents)

### Naming

Good:

```js
const userName = 'a';
```

[Back to contents](#contents)
";

    #[test]
    fn clean_guide_has_no_findings() {
        let report = lint(CLEAN);
        assert!(report.is_clean(), "unexpected findings: {:?}", report.findings);
    }

    #[test]
    fn reports_broken_links() {
        let content = CLEAN.replace("[Naming](#naming)", "[Naming](#namin)");
        let report = lint(&content);
        assert_eq!(
            report.findings,
            vec![
                LintError::BrokenLink {
                    line: 7,
                    target: "namin".to_string(),
                },
                LintError::UnlistedEntry {
                    line: 25,
                    anchor: "naming".to_string(),
                },
            ]
        );
    }

    #[test]
    fn reports_headings_with_colliding_anchors() {
        let content = format!("{CLEAN}\n### foo-bar\n\nMore.\n");
        let report = lint(&content);
        assert_eq!(report.count("duplicate_anchor"), 1);
        assert!(report.findings.contains(&LintError::DuplicateAnchor {
            line: 35,
            anchor: "foo-bar".to_string(),
            first_line: 9,
        }));
    }

    #[test]
    fn bad_example_without_good_is_malformed() {
        let content = "### Foo\n\nBad:\n\n```js\nvar x;\n```\n";
        let report = lint(content);
        assert_eq!(
            report.findings,
            vec![LintError::MalformedExample {
                line: 3,
                anchor: "foo".to_string(),
                reason: MalformedReason::MissingPreferred,
            }]
        );
    }

    #[test]
    fn marker_without_code_is_malformed() {
        let content = "### Foo\n\nGood:\n\nJust words.\n";
        let report = lint(content);
        assert_eq!(report.count("malformed_example"), 1);
        assert!(matches!(
            report.findings[0],
            LintError::MalformedExample {
                reason: MalformedReason::MissingSnippet,
                ..
            }
        ));
    }

    #[test]
    fn unterminated_fence_is_malformed() {
        let content = "### Foo\n\nGood:\n\n```js\nconst x = 1;\n";
        let report = lint(content);
        assert_eq!(
            report.findings,
            vec![LintError::MalformedExample {
                line: 5,
                anchor: "foo".to_string(),
                reason: MalformedReason::UnterminatedFence,
            }]
        );
    }

    #[test]
    fn toc_rows_must_match_entries_one_to_one() {
        let content = "## Contents

[Foo](#foo)
[Foo again](#foo)
[Appendix](#appendix)

### Foo

text

### Bar

text

## Appendix
";
        let report = lint(content);
        let kinds: Vec<&str> = report.findings.iter().map(LintError::kind).collect();
        assert_eq!(kinds, vec!["duplicate_toc_row", "stale_toc_row", "unlisted_entry"]);
        assert_eq!(report.findings[2].line(), 11);
    }

    #[test]
    fn guides_without_toc_skip_toc_checks() {
        let report = lint("### Foo\n\ntext\n\n### Bar\n\ntext\n");
        assert!(report.is_clean());
    }

    #[test]
    fn findings_render_readable_messages() {
        let err = LintError::MalformedExample {
            line: 3,
            anchor: "foo".to_string(),
            reason: MalformedReason::MissingPreferred,
        };
        assert_eq!(
            err.to_string(),
            "line 3: malformed example in 'foo': discouraged example has no preferred counterpart"
        );
    }
}
