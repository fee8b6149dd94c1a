/// Heading anchors as rendered Markdown produces them.
///
/// The rule is GitHub's: lower-case, whitespace becomes `-`, letters, digits, `-` and `_`
/// survive, everything else is dropped. Hyphen runs are kept as-is, so `N + 1` becomes
/// `n--1`; collapsing them would break links that already work in rendered output.
use std::sync::LazyLock;

use regex::Regex;

static INLINE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid regex"));

pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.trim().chars() {
        if ch.is_whitespace() {
            out.push('-');
        } else if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Display form of a heading: inline links reduced to their text and wrapping emphasis
/// (`**Title**`, `__Title__`) removed.
pub fn strip_inline_markup(heading: &str) -> String {
    let text = INLINE_LINK.replace_all(heading.trim(), "$1");
    let mut text = text.trim();
    for marker in ["**", "__"] {
        if let Some(inner) = text
            .strip_prefix(marker)
            .and_then(|t| t.strip_suffix(marker))
        {
            text = inner.trim();
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_become_hyphens() {
        assert_eq!(slugify("Foo Bar"), "foo-bar");
        assert_eq!(slugify("foo-bar"), "foo-bar");
        assert_eq!(slugify("Single responsibility principle"), "single-responsibility-principle");
    }

    #[test]
    fn punctuation_is_dropped() {
        assert_eq!(slugify("Fat models, skinny controllers"), "fat-models-skinny-controllers");
        assert_eq!(slugify("Don't repeat yourself (DRY)"), "dont-repeat-yourself-dry");
        assert_eq!(slugify("**Mass assignment**"), "mass-assignment");
        assert_eq!(slugify("Use `config()` helpers"), "use-config-helpers");
    }

    #[test]
    fn hyphen_runs_are_preserved() {
        assert_eq!(
            slugify("Eager loading (N + 1 problem)"),
            "eager-loading-n--1-problem"
        );
    }

    #[test]
    fn emoji_and_surrounding_space_vanish() {
        assert_eq!(slugify("  🔝 Back to contents "), "-back-to-contents");
        assert_eq!(slugify("snake_case names"), "snake_case-names");
    }

    #[test]
    fn non_ascii_letters_are_kept() {
        assert_eq!(slugify("Éviter les Façades"), "éviter-les-façades");
    }

    #[test]
    fn strips_emphasis_and_links() {
        assert_eq!(strip_inline_markup("**Single responsibility principle**"), "Single responsibility principle");
        assert_eq!(strip_inline_markup("__Naming__ "), "Naming");
        assert_eq!(strip_inline_markup("See [Blade](#blade) docs"), "See Blade docs");
        assert_eq!(strip_inline_markup("Plain **bold** inside"), "Plain **bold** inside");
    }
}
