/// Parser for Markdown style guides.
///
/// The document is read line by line:
/// - Fenced code blocks (``` or ~~~) are opaque; nothing inside them is a heading,
///   link or example marker.
/// - Every ATX heading is recorded. Headings at the entry level start a guide entry,
///   which runs until the next heading at the same or a higher level.
/// - The heading named like the configured TOC heading opens the table of contents.
///   A deeper heading whose section holds nothing but in-page links is a TOC group and
///   keeps it open; any other heading closes it.
/// - Inside an entry, "Bad:" / "Good:" style markers claim the next code block, and
///   pipe tables become comparison tables.
///
/// Content never makes the parser fail. Structural problems are left in the
/// `ParsedGuide` for the validator to report.
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::anchor::{slugify, strip_inline_markup};
use crate::config::GuideFormat;
use crate::error::AppError;
use crate::model::{
    CodeSnippet, ComparisonTable, Example, ExampleKind, GuideEntry, Heading, LinkRef, ParsedGuide,
};

const MAX_EMBEDDING_CHARS: usize = 3000;

pub fn load_guide(path: &Path, format: &GuideFormat) -> Result<ParsedGuide, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("failed to read {}: {e}", path.display())))?;
    Ok(parse_guide(&content, format))
}

pub fn parse_guide(content: &str, format: &GuideFormat) -> ParsedGuide {
    let heading_re = heading_regex();
    let link_re = Regex::new(r"\[([^\]]*)\]\(#([^)\s]*)\)").expect("valid regex");

    let lines: Vec<&str> = content.lines().collect();
    let mut guide = ParsedGuide::default();
    let mut fence: Option<Fence> = None;
    let mut toc_level: Option<usize> = None;
    let mut open_entry: Option<(String, String, usize)> = None;

    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 1;

        if let Some(open) = &fence {
            if open.closes(line) {
                fence = None;
            }
            continue;
        }
        if let Some(opened) = Fence::open(line, line_number) {
            fence = Some(opened);
            continue;
        }

        if let Some(caps) = heading_re.captures(line) {
            let level = caps[1].len();
            let title = strip_inline_markup(&caps[2]);
            let anchor = slugify(&title);

            if level <= format.entry_level {
                if let Some((title, anchor, start)) = open_entry.take() {
                    guide
                        .entries
                        .push(build_entry(&lines, start, idx, title, anchor));
                }
            }

            let toc_group = toc_level.is_some_and(|toc| level > toc)
                && is_link_list(&lines[idx + 1..], &heading_re, &link_re);
            if title.eq_ignore_ascii_case(&format.toc_heading) {
                toc_level = Some(level);
                guide.toc_line = Some(line_number);
            } else if !toc_group {
                toc_level = None;
                if level == format.entry_level {
                    open_entry = Some((title.clone(), anchor.clone(), idx));
                }
            }

            if level == 1 && guide.title.is_none() {
                guide.title = Some(title.clone());
            }
            guide.headings.push(Heading {
                level,
                title,
                anchor,
                line: line_number,
            });
            continue;
        }

        for caps in link_re.captures_iter(line) {
            let link = LinkRef {
                text: caps[1].trim().to_string(),
                target: caps[2].to_string(),
                line: line_number,
            };
            if toc_level.is_some() {
                guide.toc.push(link.clone());
            }
            guide.links.push(link);
        }
    }

    if let Some((title, anchor, start)) = open_entry.take() {
        guide
            .entries
            .push(build_entry(&lines, start, lines.len(), title, anchor));
    }
    guide.unterminated_fence = fence.map(|f| f.line);

    debug!(
        entries = guide.entries.len(),
        headings = guide.headings.len(),
        links = guide.links.len(),
        toc_rows = guide.toc.len(),
        "parsed guide"
    );
    guide
}

/// Build a single entry from a title and free-form Markdown body.
///
/// `line` is the line the heading would sit on. The body follows one blank line
/// later, as in the entry's `raw_markdown`.
pub fn parse_entry_body(title: &str, body: &str, line: usize) -> GuideEntry {
    let title = strip_inline_markup(title);
    let anchor = slugify(&title);
    let body = body.trim();
    let lines: Vec<&str> = body.lines().collect();
    let (examples, tables) = scan_body(&lines, line + 2);
    let hashes = "#".repeat(GuideFormat::default().entry_level);

    GuideEntry {
        raw_markdown: format!("{hashes} {title}\n\n{body}").trim_end().to_string(),
        title,
        anchor,
        line,
        body: body.to_string(),
        examples,
        tables,
    }
}

/// Text embedded for semantic search: title, prose with code removed, then the
/// first preferred snippet.
pub fn compose_embedding_text(entry: &GuideEntry) -> String {
    let lines: Vec<&str> = entry.body.lines().collect();
    let mut parts = vec![entry.title.clone()];

    let prose = prose_lines(&lines).join(" ");
    if !prose.trim().is_empty() {
        parts.push(prose.trim().to_string());
    }
    if let Some(snippet) = entry
        .examples
        .iter()
        .filter(|e| e.kind == ExampleKind::Preferred)
        .find_map(|e| e.snippet.as_ref())
    {
        parts.push(snippet.code.clone());
    }

    let text = parts.join(". ");
    if text.chars().count() > MAX_EMBEDDING_CHARS {
        text.chars().take(MAX_EMBEDDING_CHARS).collect()
    } else {
        text
    }
}

fn heading_regex() -> Regex {
    Regex::new(r"^ {0,3}(#{1,6})\s+(.*?)(?:\s+#+)?\s*$").expect("valid regex")
}

/// True when the lines up to the next heading contain in-page links and nothing else
/// but list markers (`-`, `1.`) and punctuation.
fn is_link_list(lines: &[&str], heading_re: &Regex, link_re: &Regex) -> bool {
    let mut links = 0;
    for line in lines {
        if heading_re.is_match(line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        links += link_re.find_iter(line).count();
        if link_re.replace_all(line, "").chars().any(char::is_alphabetic) {
            return false;
        }
    }
    links > 0
}

fn build_entry(
    lines: &[&str],
    start: usize,
    end: usize,
    title: String,
    anchor: String,
) -> GuideEntry {
    let body_lines = &lines[start + 1..end];
    let (examples, tables) = scan_body(body_lines, start + 2);

    GuideEntry {
        title,
        anchor,
        line: start + 1,
        body: body_lines.join("\n").trim().to_string(),
        raw_markdown: lines[start..end].join("\n").trim().to_string(),
        examples,
        tables,
    }
}

/// An open code fence.
struct Fence {
    marker: char,
    len: usize,
    line: usize,
    language: Option<String>,
}

impl Fence {
    fn open(line: &str, line_number: usize) -> Option<Self> {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }
        let trimmed = &line[indent..];
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        let info = trimmed[len..].trim();
        if marker == '`' && info.contains('`') {
            return None;
        }
        let language = info
            .split_whitespace()
            .next()
            .map(|s| s.to_string());
        Some(Self {
            marker,
            len,
            line: line_number,
            language,
        })
    }

    fn closes(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.len() >= self.len && trimmed.chars().all(|c| c == self.marker)
    }
}

/// Recognise an example marker line such as "Bad:", "**Good:**" or "Better example:".
fn parse_marker(marker_re: &Regex, line: &str) -> Option<(ExampleKind, String)> {
    let caps = marker_re.captures(line)?;
    let label = caps[1].trim().to_string();
    let kind = match caps[2].to_lowercase().as_str() {
        "bad" | "wrong" | "avoid" | "don't" | "dont" => ExampleKind::Discouraged,
        _ => ExampleKind::Preferred,
    };
    Some((kind, label))
}

fn scan_body(lines: &[&str], first_line: usize) -> (Vec<Example>, Vec<ComparisonTable>) {
    let marker_re = Regex::new(
        r"(?i)^\s*(?:\*\*|__)?((bad|wrong|avoid|don't|dont|good|better|right|prefer)\b[\w ']{0,30}?)\s*(?:\*\*|__)?\s*:\s*(?:\*\*|__)?\s*$",
    )
    .expect("valid regex");
    let separator_re =
        Regex::new(r"^\s*\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)*\|?\s*$").expect("valid regex");

    let mut examples: Vec<Example> = Vec::new();
    let mut tables = Vec::new();
    let mut pending: Option<usize> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let line_number = first_line + i;

        if let Some(fence) = Fence::open(line, line_number) {
            let mut end = i + 1;
            while end < lines.len() && !fence.closes(lines[end]) {
                end += 1;
            }
            let snippet = CodeSnippet {
                language: fence.language,
                code: lines[i + 1..end].join("\n"),
                line: line_number,
            };
            if let Some(idx) = pending.take() {
                examples[idx].snippet = Some(snippet);
            }
            i = end + 1;
            continue;
        }

        if pending.is_some() && is_indented_code(line) {
            let start = i;
            while i < lines.len() && (is_indented_code(lines[i]) || lines[i].trim().is_empty()) {
                i += 1;
            }
            let code: Vec<&str> = lines[start..i]
                .iter()
                .map(|l| l.strip_prefix("    ").or_else(|| l.strip_prefix('\t')).unwrap_or(l.trim()))
                .collect();
            if let Some(idx) = pending.take() {
                examples[idx].snippet = Some(CodeSnippet {
                    language: None,
                    code: code.join("\n").trim_end().to_string(),
                    line: line_number,
                });
            }
            continue;
        }

        if let Some((kind, label)) = parse_marker(&marker_re, line) {
            examples.push(Example {
                kind,
                label,
                line: line_number,
                snippet: None,
            });
            pending = Some(examples.len() - 1);
            i += 1;
            continue;
        }

        if line.contains('|') && i + 1 < lines.len() && separator_re.is_match(lines[i + 1]) {
            let headers = split_cells(line);
            let mut rows = Vec::new();
            let mut end = i + 2;
            while end < lines.len() && lines[end].contains('|') && !lines[end].trim().is_empty() {
                rows.push(split_cells(lines[end]));
                end += 1;
            }
            tables.push(ComparisonTable {
                headers,
                rows,
                line: line_number,
            });
            pending = None;
            i = end;
            continue;
        }

        if !line.trim().is_empty() {
            pending = None;
        }
        i += 1;
    }

    (examples, tables)
}

fn is_indented_code(line: &str) -> bool {
    (line.starts_with("    ") || line.starts_with('\t')) && !line.trim().is_empty()
}

fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(|c| c.trim().to_string()).collect()
}

/// Non-blank body lines outside code blocks.
fn prose_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut fence: Option<Fence> = None;
    for (i, line) in lines.iter().enumerate() {
        if let Some(open) = &fence {
            if open.closes(line) {
                fence = None;
            }
            continue;
        }
        if let Some(opened) = Fence::open(line, i + 1) {
            fence = Some(opened);
            continue;
        }
        if !line.trim().is_empty() {
            out.push(line.trim());
        }
    }
    out
}
