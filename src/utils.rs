use std::ops::RangeInclusive;
use std::sync::LazyLock;

use crate::regex::Regex;
use crate::{Result, TrackerError};

/// Years accepted for a publication.
pub(crate) const YEAR_RANGE: RangeInclusive<i32> = 1800..=2100;

static ARXIV_ABS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"arxiv\.org/abs/([0-9]+\.[0-9]+)").unwrap());

static BARE_DOI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.\d{4,}/\S+$").unwrap());

/// Converts the hyphens of a page range into en-dashes.
///
/// # Arguments
///
/// * `pages` - The page string to format, e.g. `100-110`
pub(crate) fn format_page_range(pages: &str) -> String {
    let pages = pages.trim();
    let mut out = String::with_capacity(pages.len() + 2);
    let mut previous_dash = false;
    for c in pages.chars() {
        if c == '-' {
            // `100--110` is a common LaTeX habit
            if !previous_dash {
                out.push('\u{2013}');
            }
            previous_dash = true;
        } else {
            out.push(c);
            previous_dash = false;
        }
    }
    out
}

/// Returns `true` for a bare DOI such as `10.1000/xyz`.
pub(crate) fn is_bare_doi(value: &str) -> bool {
    BARE_DOI_REGEX.is_match(value.trim())
}

/// Turns a DOI field into the form appended to a citation.
///
/// Bare DOIs become `https://doi.org/` links, anything starting with `http`
/// is passed through, and any other value is kept as-is.
pub(crate) fn doi_link(doi: &str) -> String {
    let doi = doi.trim();
    if doi.starts_with("http") {
        doi.to_string()
    } else if is_bare_doi(doi) {
        format!("https://doi.org/{}", doi)
    } else {
        doi.to_string()
    }
}

/// Extracts the arXiv identifier from an `arxiv.org/abs/<id>` link.
pub(crate) fn extract_arxiv_id(doi: &str) -> Option<&str> {
    ARXIV_ABS_REGEX
        .captures(doi)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Validates a publication year.
///
/// Empty input is allowed and means "unknown". Anything else must be a
/// 4-digit year inside [`YEAR_RANGE`].
pub(crate) fn parse_year(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }
    match value.parse::<i32>() {
        Ok(year) if value.len() == 4 && YEAR_RANGE.contains(&year) => Ok(value.to_string()),
        _ => Err(TrackerError::Validation(format!(
            "year '{}' must be between {} and {}",
            value,
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        ))),
    }
}

/// Truncates a string to at most `max_chars` characters.
pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}

/// Returns `true` if the input starts with an `http://` or `https://` scheme.
pub(crate) fn is_absolute_url(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Today's local date formatted as `YYYY-MM-DD`.
pub(crate) fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Returns `true` if the value is a valid `YYYY-MM-DD` date.
pub(crate) fn is_valid_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("100-110", "100\u{2013}110")]
    #[case("100--110", "100\u{2013}110")]
    #[case("e071674", "e071674")]
    #[case(" R575-R582 ", "R575\u{2013}R582")]
    #[case("", "")]
    fn test_format_page_range(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_page_range(input), expected);
    }

    #[rstest]
    #[case("10.1000/xyz", "https://doi.org/10.1000/xyz")]
    #[case(" 10.1038/nature14539 ", "https://doi.org/10.1038/nature14539")]
    #[case("https://doi.org/10.1000/xyz", "https://doi.org/10.1000/xyz")]
    #[case("http://example.org/paper", "http://example.org/paper")]
    #[case("doi:10.1000/xyz", "doi:10.1000/xyz")]
    #[case("", "")]
    fn test_doi_link(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(doi_link(input), expected);
    }

    #[test]
    fn test_extract_arxiv_id() {
        assert_eq!(
            extract_arxiv_id("https://arxiv.org/abs/1706.03762"),
            Some("1706.03762")
        );
        assert_eq!(extract_arxiv_id("https://arxiv.org/pdf/1706.03762"), None);
        assert_eq!(extract_arxiv_id(""), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2017").unwrap(), "2017");
        assert_eq!(parse_year(" 1998 ").unwrap(), "1998");
        assert_eq!(parse_year("").unwrap(), "");
        assert!(parse_year("17").is_err());
        assert!(parse_year("3017").is_err());
        assert!(parse_year("20x7").is_err());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_dates() {
        assert!(is_valid_date(&today()));
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2023-02-29"));
        assert!(!is_valid_date("yesterday"));
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://arxiv.org/abs/1706.03762"));
        assert!(is_absolute_url("HTTP://EXAMPLE.ORG"));
        assert!(!is_absolute_url("arxiv.org/abs/1706.03762"));
        assert!(!is_absolute_url("ftp://files"));
    }
}
