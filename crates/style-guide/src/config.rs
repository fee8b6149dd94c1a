use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const DEFAULT_GUIDE_FILE: &str = "README.md";
pub const DEFAULT_ENTRY_LEVEL: usize = 3;
pub const DEFAULT_TOC_HEADING: &str = "Contents";

/// How a guide document is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideFormat {
    /// Heading level (1-6) that starts a guide entry.
    pub entry_level: usize,
    /// Title of the heading whose links form the table of contents.
    pub toc_heading: String,
}

impl Default for GuideFormat {
    fn default() -> Self {
        Self {
            entry_level: DEFAULT_ENTRY_LEVEL,
            toc_heading: DEFAULT_TOC_HEADING.to_string(),
        }
    }
}

impl GuideFormat {
    pub fn new(entry_level: usize, toc_heading: impl Into<String>) -> Result<Self, AppError> {
        if !(1..=6).contains(&entry_level) {
            return Err(AppError::Config(format!(
                "entry heading level must be between 1 and 6, got {entry_level}"
            )));
        }
        let toc_heading = toc_heading.into().trim().to_string();
        if toc_heading.is_empty() {
            return Err(AppError::Config("TOC heading must not be empty".to_string()));
        }
        Ok(Self {
            entry_level,
            toc_heading,
        })
    }

    /// Optional:
    /// - `STYLE_GUIDE_ENTRY_LEVEL` (default: 3)
    /// - `STYLE_GUIDE_TOC_HEADING` (default: "Contents")
    pub fn from_env() -> Result<Self, AppError> {
        let entry_level = match std::env::var("STYLE_GUIDE_ENTRY_LEVEL") {
            Ok(raw) => raw.trim().parse::<usize>().map_err(|_| {
                AppError::Config(format!("STYLE_GUIDE_ENTRY_LEVEL must be a number, got '{raw}'"))
            })?,
            Err(_) => DEFAULT_ENTRY_LEVEL,
        };
        let toc_heading = std::env::var("STYLE_GUIDE_TOC_HEADING")
            .unwrap_or_else(|_| DEFAULT_TOC_HEADING.to_string());
        Self::new(entry_level, toc_heading)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: Option<String>,
    pub lancedb_path: String,
    pub guide_path: PathBuf,
    pub format: GuideFormat,
}

impl Config {
    /// Required:
    /// - `LANCEDB_PATH`
    /// - `STYLE_GUIDE_PATH` (the guide file, or a directory holding it)
    ///
    /// Optional:
    /// - `REDIS_URL`
    /// - `STYLE_GUIDE_FILE` (file name inside a directory path, default: "README.md")
    /// - `STYLE_GUIDE_ENTRY_LEVEL`, `STYLE_GUIDE_TOC_HEADING` (see [`GuideFormat::from_env`])
    pub fn from_env() -> Result<Self, AppError> {
        let lancedb_path = std::env::var("LANCEDB_PATH")
            .map_err(|_| AppError::Config("LANCEDB_PATH environment variable is required".to_string()))?;

        let guide_path = std::env::var("STYLE_GUIDE_PATH").map_err(|_| {
            AppError::Config("STYLE_GUIDE_PATH environment variable is required".to_string())
        })?;
        let file_name =
            std::env::var("STYLE_GUIDE_FILE").unwrap_or_else(|_| DEFAULT_GUIDE_FILE.to_string());

        Ok(Self {
            redis_url: std::env::var("REDIS_URL").ok(),
            lancedb_path,
            guide_path: resolve_guide_path(Path::new(&guide_path), &file_name)?,
            format: GuideFormat::from_env()?,
        })
    }
}

/// A file path is used as given; a directory must contain `file_name`.
pub fn resolve_guide_path(path: &Path, file_name: &str) -> Result<PathBuf, AppError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        let nested = path.join(file_name);
        if nested.is_file() {
            return Ok(nested);
        }
        return Err(AppError::Config(format!(
            "required file not found: {}",
            nested.display()
        )));
    }
    Err(AppError::Config(format!(
        "guide path does not exist: {}",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_rejects_bad_levels() {
        assert!(GuideFormat::new(0, "Contents").is_err());
        assert!(GuideFormat::new(7, "Contents").is_err());
        assert!(GuideFormat::new(2, "  ").is_err());
        let format = GuideFormat::new(2, " Table of contents ").unwrap();
        assert_eq!(format.entry_level, 2);
        assert_eq!(format.toc_heading, "Table of contents");
    }

    #[test]
    fn resolves_file_inside_directory() {
        let dir = std::env::temp_dir().join(format!("style-guide-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("GUIDE.md");
        std::fs::write(&file, "# Guide\n").unwrap();

        assert_eq!(resolve_guide_path(&file, "ignored.md").unwrap(), file);
        assert_eq!(resolve_guide_path(&dir, "GUIDE.md").unwrap(), file);
        assert!(resolve_guide_path(&dir, "README.md").is_err());
        assert!(resolve_guide_path(&dir.join("missing"), "README.md").is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
