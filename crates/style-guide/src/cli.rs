use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    resolve_guide_path, GuideFormat, DEFAULT_ENTRY_LEVEL, DEFAULT_GUIDE_FILE, DEFAULT_TOC_HEADING,
};
use crate::error::AppError;
use crate::index::TopicIndex;
use crate::model::ParsedGuide;
use crate::parser;
use crate::validate::{self, LintReport};

#[derive(Parser, Debug)]
#[command(name = "style-guide", version, about = "Serve and check Markdown style guides")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the guide over MCP (stdio, or TCP when MCP_TCP_LISTEN_ADDR is set)
    Serve,
    /// Report broken links, duplicate anchors and malformed examples
    Check(GuideArgs),
    /// Print the table of contents as Markdown
    Toc(GuideArgs),
}

#[derive(Args, Debug)]
pub struct GuideArgs {
    /// Guide file, or a directory containing it
    #[arg(env = "STYLE_GUIDE_PATH")]
    pub path: PathBuf,

    /// File name to use when PATH is a directory
    #[arg(long, env = "STYLE_GUIDE_FILE", default_value = DEFAULT_GUIDE_FILE)]
    pub file: String,

    /// Heading level that starts an entry
    #[arg(long, env = "STYLE_GUIDE_ENTRY_LEVEL", default_value_t = DEFAULT_ENTRY_LEVEL)]
    pub entry_level: usize,

    /// Title of the table-of-contents heading
    #[arg(long, env = "STYLE_GUIDE_TOC_HEADING", default_value = DEFAULT_TOC_HEADING)]
    pub toc_heading: String,
}

impl GuideArgs {
    pub fn load(&self) -> Result<(PathBuf, ParsedGuide), AppError> {
        let format = GuideFormat::new(self.entry_level, self.toc_heading.as_str())?;
        let path = resolve_guide_path(&self.path, &self.file)?;
        let guide = parser::load_guide(&path, &format)?;
        Ok((path, guide))
    }
}

/// Validate the guide and print one line per finding. Returns the report so the
/// caller can pick an exit code.
pub fn check(args: &GuideArgs) -> Result<LintReport, AppError> {
    let (path, guide) = args.load()?;
    let report = validate::validate(&guide);
    for finding in &report.findings {
        println!("{}:{finding}", path.display());
    }
    println!(
        "{}: {} entries, {} findings",
        path.display(),
        guide.entries.len(),
        report.findings.len()
    );
    Ok(report)
}

/// Render the table of contents. Fails if two entries share an anchor, since such a
/// TOC could not link to both.
pub fn toc(args: &GuideArgs) -> Result<String, AppError> {
    let (_, guide) = args.load()?;
    let index = TopicIndex::try_from_entries(guide.entries)?;
    Ok(index.render_toc_markdown())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexError;

    fn write_guide(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("style-guide-cli-{}-{name}.md", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    fn args_for(path: &std::path::Path) -> GuideArgs {
        GuideArgs {
            path: path.to_path_buf(),
            file: DEFAULT_GUIDE_FILE.to_string(),
            entry_level: DEFAULT_ENTRY_LEVEL,
            toc_heading: DEFAULT_TOC_HEADING.to_string(),
        }
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["style-guide", "check", "guide.md", "--entry-level", "2"]).unwrap();
        match cli.command {
            Some(Command::Check(args)) => {
                assert_eq!(args.path, PathBuf::from("guide.md"));
                assert_eq!(args.entry_level, 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["style-guide"]).unwrap();
        assert!(cli.command.is_none());
        let cli = Cli::try_parse_from(["style-guide", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn check_reports_findings() {
        let path = write_guide("check", "### Foo\n\nBad:\n\n```js\nvar x;\n```\n\n[up](#top)\n");
        let report = check(&args_for(&path)).unwrap();
        assert_eq!(report.count("malformed_example"), 1);
        assert_eq!(report.count("broken_link"), 1);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn toc_renders_entries_and_rejects_collisions() {
        let path = write_guide("toc", "### Foo Bar\n\ntext\n\n### Baz\n\ntext\n");
        assert_eq!(toc(&args_for(&path)).unwrap(), "- [Foo Bar](#foo-bar)\n- [Baz](#baz)\n");
        std::fs::remove_file(&path).unwrap();

        let path = write_guide("toc-dup", "### Foo Bar\n\ntext\n\n### foo-bar\n\ntext\n");
        assert!(matches!(
            toc(&args_for(&path)),
            Err(AppError::Index(IndexError::DuplicateAnchor { .. }))
        ));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rejects_invalid_entry_level() {
        let path = write_guide("level", "### Foo\n");
        let mut args = args_for(&path);
        args.entry_level = 9;
        assert!(matches!(check(&args), Err(AppError::Config(_))));
        std::fs::remove_file(&path).unwrap();
    }
}
