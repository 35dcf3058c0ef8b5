//! Public slug derivation and normalization.
//!
//! Slugs are lowercase ASCII letters, digits and single dashes, never
//! starting or ending with a dash.

use regex::Regex;
use std::sync::LazyLock;

static NOT_TITLE_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NOT_SLUG_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]").unwrap());
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

fn collapse_dashes(s: &str) -> String {
    DASH_RUN.replace_all(s, "-").trim_matches('-').to_string()
}

/// Derive a slug from a title.
///
/// Characters outside `[a-z0-9\s-]` are dropped (not replaced), so
/// `"Twitter / X"` becomes `"twitter-x"`.
pub fn generate(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept = NOT_TITLE_CHAR.replace_all(lowered.trim(), "");
    let dashed = WHITESPACE_RUN.replace_all(&kept, "-");
    collapse_dashes(&dashed)
}

/// Normalize a supplied or derived slug.
///
/// Characters outside `[a-z0-9-]` become dashes.
pub fn normalize(slug: &str) -> String {
    let lowered = slug.to_lowercase();
    let replaced = NOT_SLUG_CHAR.replace_all(lowered.trim(), "-");
    collapse_dashes(&replaced)
}

/// Find the first free slug among `base`, `base-2`, `base-3`, ...
///
/// `is_taken` is asked about each candidate in turn.
pub fn make_unique<E>(
    base: &str,
    mut is_taken: impl FnMut(&str) -> Result<bool, E>,
) -> Result<String, E> {
    let mut candidate = base.to_string();
    let mut counter = 1u32;
    while is_taken(&candidate)? {
        counter += 1;
        candidate = format!("{base}-{counter}");
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("My Tool", "my-tool")]
    #[case("  Gmail  ", "gmail")]
    #[case("Twitter / X", "twitter-x")]
    #[case("Google   Calendar", "google-calendar")]
    #[case("--Edge--Case--", "edge-case")]
    #[case("Café Agent", "caf-agent")]
    #[case("!!!", "")]
    fn test_generate(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(generate(title), expected);
    }

    #[rstest]
    #[case("My_Slug", "my-slug")]
    #[case("already-good", "already-good")]
    #[case("a..b", "a-b")]
    #[case("-Trim Me-", "trim-me")]
    #[case("UPPER", "upper")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_make_unique_free_base() {
        let slug: Result<String, ()> = make_unique("gmail", |_| Ok(false));
        assert_eq!(slug.unwrap(), "gmail");
    }

    #[test]
    fn test_make_unique_counts_from_two() {
        let taken = ["my-tool", "my-tool-2"];
        let slug: Result<String, ()> = make_unique("my-tool", |c| Ok(taken.contains(&c)));
        assert_eq!(slug.unwrap(), "my-tool-3");
    }

    #[test]
    fn test_make_unique_propagates_errors() {
        let slug: Result<String, &str> = make_unique("x", |_| Err("store down"));
        assert_eq!(slug.unwrap_err(), "store down");
    }
}
