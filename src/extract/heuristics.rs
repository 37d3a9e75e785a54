//! Heuristic fallback used when no external assistant is available.
//!
//! This is pattern matching, not language understanding: a table of curated
//! papers, a list of venue patterns, and a topic table for keywords.

use std::sync::LazyLock;

use crate::regex::{Regex, escape};
use crate::utils::{YEAR_RANGE, is_absolute_url, truncate_chars};
use crate::PaperInfo;

/// Placeholder relevance note attached to heuristic results.
pub const GENERIC_RELEVANCE: &str = "This paper may be relevant to your research area. Please review and update the relevance notes as needed.";

/// Keywords used when no topic matches.
const GENERIC_KEYWORDS: &[&str] = &["research", "academic study", "analysis"];

/// Maximum number of suggested keywords.
const MAX_KEYWORDS: usize = 4;

/// Length of the raw-input prefix used when no usable title remains.
const FALLBACK_TITLE_CHARS: usize = 100;

/// Titles this short (in characters) are not plausible.
const MIN_TITLE_CHARS: usize = 3;

/// A curated paper recognized from fingerprints in the input.
#[derive(Debug, Clone, Copy)]
pub struct KnownPaper {
    /// Matches when every term appears in the lowercased input
    pub all_terms: &'static [&'static str],
    /// Matches when any of these appears verbatim in the input
    pub identifiers: &'static [&'static str],
    pub title: &'static str,
    pub authors: &'static str,
    pub year: &'static str,
    pub journal: &'static str,
    pub keywords: &'static str,
    pub abstract_text: &'static str,
    pub url: &'static str,
    pub relevance: &'static str,
}

impl KnownPaper {
    /// Checks the input against this paper's fingerprints.
    pub fn matches(&self, input: &str) -> bool {
        let lower = input.to_lowercase();
        let all_terms = !self.all_terms.is_empty()
            && self.all_terms.iter().all(|term| lower.contains(term));
        all_terms || self.identifiers.iter().any(|id| input.contains(id))
    }

    pub fn to_info(&self) -> PaperInfo {
        PaperInfo {
            title: self.title.to_string(),
            authors: self.authors.to_string(),
            year: self.year.to_string(),
            journal: self.journal.to_string(),
            keywords: self.keywords.to_string(),
            abstract_text: self.abstract_text.to_string(),
            url: self.url.to_string(),
            relevance: self.relevance.to_string(),
        }
    }
}

/// Papers returned verbatim when their fingerprints match.
pub const KNOWN_PAPERS: &[KnownPaper] = &[KnownPaper {
    all_terms: &["attention", "need"],
    identifiers: &["1706.03762"],
    title: "Attention Is All You Need",
    authors: "Vaswani, A., Shazeer, N., Parmar, N., Uszkoreit, J., Jones, L., Gomez, A. N., Kaiser, L., & Polosukhin, I.",
    year: "2017",
    journal: "Advances in Neural Information Processing Systems",
    keywords: "transformer, attention mechanism, neural networks, deep learning",
    abstract_text: "Introduced the Transformer architecture that revolutionized NLP by relying entirely on attention mechanisms, eliminating recurrence and convolutions.",
    url: "https://arxiv.org/abs/1706.03762",
    relevance: "Seminal paper for understanding modern language models and transformer architectures.",
}];

/// Venue patterns, tried in order.
static JOURNAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Academy of Management",
        r"(?i)Management Review",
        r"(?i)Strategic Management",
        r"(?i)Nature",
        r"(?i)Science",
        r"(?i)Journal of",
        r"(?i)Proceedings of",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Topic indicators and the keywords they suggest, tried in order.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("management", &["management", "leadership", "organization"]),
    ("strategy", &["strategy", "competitive advantage", "business model"]),
    ("technology", &["technology", "innovation", "digital transformation"]),
    ("learning", &["machine learning", "artificial intelligence", "data science"]),
    ("neural", &["neural networks", "deep learning", "AI"]),
    ("social", &["social networks", "sociology", "social science"]),
];

static YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d{4})\)|\b(\d{4})\b").unwrap());
static PAREN_YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\d{4}\)").unwrap());
static BARE_YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\b").unwrap());
static VOLUME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Vol\.\s*\d+").unwrap());
static ISSUE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)No\.\s*\d+").unwrap());
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Approximates what an assistant would extract from free text.
///
/// A curated paper whose fingerprints match is returned verbatim. Otherwise
/// the year, venue, title and keywords are derived from patterns, the
/// relevance is a placeholder, and the URL is kept only if the input itself
/// is an absolute URL.
///
/// # Examples
///
/// ```
/// use papertrack::extract::fallback_extract;
///
/// let info = fallback_extract("Attention is all you need");
/// assert_eq!(info.year, "2017");
///
/// let info = fallback_extract("Dynamic capabilities, Strategic Management Journal (1997)");
/// assert_eq!(info.year, "1997");
/// assert_eq!(info.journal, "Strategic Management");
/// ```
pub fn fallback_extract(input: &str) -> PaperInfo {
    let input = input.trim();

    if let Some(known) = KNOWN_PAPERS.iter().find(|paper| paper.matches(input)) {
        tracing::debug!(title = known.title, "input matched a curated paper");
        return known.to_info();
    }

    let year = extract_year(input).unwrap_or_default();
    let journal = extract_journal(input).unwrap_or_default();
    let title = extract_title(input, &journal);
    let keywords = suggest_keywords(input);
    let url = if is_absolute_url(input) {
        input.to_string()
    } else {
        String::new()
    };

    tracing::debug!(%title, %year, %journal, "heuristic extraction");

    PaperInfo {
        title,
        year,
        journal,
        keywords,
        url,
        relevance: GENERIC_RELEVANCE.to_string(),
        ..Default::default()
    }
}

/// First parenthesized or standalone 4-digit year in the plausible range.
fn extract_year(input: &str) -> Option<String> {
    YEAR_REGEX
        .captures_iter(input)
        .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map(|m| m.as_str())
        .find(|year| year.parse::<i32>().is_ok_and(|y| YEAR_RANGE.contains(&y)))
        .map(String::from)
}

/// Text of the first matching venue pattern, as it appears in the input.
fn extract_journal(input: &str) -> Option<String> {
    JOURNAL_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(input))
        .map(|m| m.as_str().to_string())
}

/// What remains of the input once venue, year, volume and issue are removed.
fn extract_title(input: &str, journal: &str) -> String {
    let mut title = input.to_string();
    if !journal.is_empty() {
        let pattern = format!("(?i){}", escape(journal));
        if let Ok(journal_regex) = Regex::new(&pattern) {
            title = journal_regex.replace_all(&title, "").into_owned();
        }
    }
    title = PAREN_YEAR_REGEX.replace_all(&title, "").into_owned();
    title = BARE_YEAR_REGEX.replace(&title, "").into_owned();
    title = VOLUME_REGEX.replace_all(&title, "").into_owned();
    title = ISSUE_REGEX.replace_all(&title, "").into_owned();
    title = WHITESPACE_REGEX.replace_all(&title, " ").into_owned();

    let title = title
        .trim()
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | ':' | '.' | '-') || c.is_whitespace())
        .trim();

    if title.chars().count() > MIN_TITLE_CHARS {
        title.to_string()
    } else {
        truncate_chars(input, FALLBACK_TITLE_CHARS).to_string()
    }
}

/// Keywords of the first topic mentioned in the input, or a generic set.
fn suggest_keywords(input: &str) -> String {
    let lower = input.to_lowercase();
    let keywords = TOPIC_KEYWORDS
        .iter()
        .find(|(topic, _)| lower.contains(topic))
        .map(|(_, keywords)| *keywords)
        .unwrap_or(GENERIC_KEYWORDS);

    keywords
        .iter()
        .take(MAX_KEYWORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_paper_by_terms() {
        let info = fallback_extract("Attention is all you need");
        assert_eq!(info.title, "Attention Is All You Need");
        assert_eq!(info.year, "2017");
        assert_eq!(info.url, "https://arxiv.org/abs/1706.03762");
    }

    #[test]
    fn test_known_paper_by_identifier() {
        let info = fallback_extract("https://arxiv.org/abs/1706.03762");
        assert_eq!(info.journal, "Advances in Neural Information Processing Systems");
    }

    #[test]
    fn test_citation_like_input() {
        let info = fallback_extract(
            "Building theory from case studies. Academy of Management Review (1989), Vol. 14, No. 4",
        );
        assert_eq!(info.year, "1989");
        assert_eq!(info.journal, "Academy of Management");
        assert_eq!(info.title, "Building theory from case studies. Review");
        assert_eq!(info.keywords, "management, leadership, organization");
        assert_eq!(info.relevance, GENERIC_RELEVANCE);
        assert_eq!(info.url, "");
        assert_eq!(info.authors, "");
    }

    #[test]
    fn test_bare_year_and_topic() {
        let info = fallback_extract("Graph neural methods 2019");
        assert_eq!(info.year, "2019");
        assert_eq!(info.journal, "");
        assert_eq!(info.title, "Graph neural methods");
        assert_eq!(info.keywords, "neural networks, deep learning, AI");
    }

    #[test]
    fn test_generic_keywords_and_short_title_fallback() {
        let info = fallback_extract("Nature 2020");
        assert_eq!(info.journal, "Nature");
        assert_eq!(info.title, "Nature 2020");
        assert_eq!(info.keywords, "research, academic study, analysis");
    }

    #[test]
    fn test_url_is_preserved_only_for_absolute_urls() {
        let info = fallback_extract("https://example.org/papers/42");
        assert_eq!(info.url, "https://example.org/papers/42");

        let info = fallback_extract("example.org/papers/42");
        assert_eq!(info.url, "");
    }

    #[test]
    fn test_implausible_year_is_skipped() {
        assert_eq!(extract_year("Catalog 0042, printed 1999"), Some("1999".to_string()));
        assert_eq!(extract_year("no year here"), None);
    }

    #[test]
    fn test_long_input_title_is_truncated() {
        let input = "(2001)";
        assert_eq!(extract_title(input, ""), "(2001)");
        let long = "x".repeat(150);
        assert_eq!(extract_title(&format!("{} 2001", long), "").len(), 150);
    }
}
