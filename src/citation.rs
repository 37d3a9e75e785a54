//! APA-7 citation formatting.
//!
//! Formats a [`PaperRecord`] as an APA 7th edition reference. Formatting is a
//! pure function of the record: the same record always yields the same string.
//!
//! # Example
//!
//! ```
//! use papertrack::{PaperRecord, format_citation};
//!
//! let paper = PaperRecord {
//!     title: "A test article".to_string(),
//!     authors: "Smith, J., Doe, A.".to_string(),
//!     year: "2023".to_string(),
//!     journal: "Journal of Tests".to_string(),
//!     doi: "10.1000/xyz".to_string(),
//!     ..Default::default()
//! };
//!
//! assert_eq!(
//!     format_citation(&paper),
//!     "Smith, J., & Doe, A. (2023). A test article. Journal of Tests. https://doi.org/10.1000/xyz."
//! );
//! ```
//!
//! # Author lists
//!
//! - one author: `Smith, J.`
//! - two authors: `Smith, J., & Doe, A.`
//! - three to twenty: every name, Oxford comma and `&` before the last
//! - more than twenty: the first nineteen, an ellipsis, then the last author

use crate::PaperRecord;
use crate::utils::{doi_link, extract_arxiv_id, format_page_range};

/// Largest author list written out in full.
const MAX_LISTED_AUTHORS: usize = 20;

/// Authors listed before the ellipsis when the list is truncated.
const AUTHORS_BEFORE_ELLIPSIS: usize = 19;

/// A citation in a copy/paste safe form and a form with emphasis markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedCitation {
    /// Plain text citation
    pub plain: String,
    /// Same citation with the venue and volume wrapped in `*` for display
    pub marked: String,
}

/// Formats a paper as a plain APA-7 citation.
///
/// Returns an empty string if the authors or the title are missing.
pub fn format_citation(paper: &PaperRecord) -> String {
    render(paper, false)
}

/// Formats a paper as both a plain and an emphasis-marked APA-7 citation.
pub fn format_presentational(paper: &PaperRecord) -> FormattedCitation {
    FormattedCitation {
        plain: render(paper, false),
        marked: render(paper, true),
    }
}

/// Splits a raw author field into individual names.
///
/// Commas separate names, except that a token made only of initials
/// (`A.`, `A. N.`, `J.-P.`) belongs to the surname before it. A leading `&`
/// or `and` is dropped, so an already formatted list splits cleanly.
///
/// # Examples
///
/// ```
/// use papertrack::citation::split_authors;
///
/// assert_eq!(
///     split_authors("Vaswani, A., Shazeer, N., & Parmar, N."),
///     vec!["Vaswani, A.", "Shazeer, N.", "Parmar, N."]
/// );
/// assert_eq!(split_authors("Ada Lovelace, Alan Turing"), vec!["Ada Lovelace", "Alan Turing"]);
/// ```
pub fn split_authors(raw: &str) -> Vec<String> {
    // (name, already carries initials)
    let mut names: Vec<(String, bool)> = Vec::new();

    for token in raw.split([',', '&']) {
        let token = strip_list_markers(token);
        if token.is_empty() {
            continue;
        }
        let initials = is_initials(token);
        match names.last_mut() {
            Some((name, has_initials)) if initials && !*has_initials => {
                name.push_str(", ");
                name.push_str(token);
                *has_initials = true;
            }
            _ => names.push((token.to_string(), initials)),
        }
    }

    names.into_iter().map(|(name, _)| name).collect()
}

/// Joins author names following the APA-7 rules.
pub fn join_authors(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{}, & {}", first, second),
        [init @ .., last] if names.len() <= MAX_LISTED_AUTHORS => {
            format!("{}, & {}", init.join(", "), last)
        }
        [init @ .., last] => format!(
            "{}, \u{2026} {}",
            init[..AUTHORS_BEFORE_ELLIPSIS].join(", "),
            last
        ),
    }
}

/// Splits and re-joins a raw author field.
pub fn format_author_list(raw: &str) -> String {
    join_authors(&split_authors(raw))
}

/// Returns `true` for tokens made only of initials: `A.`, `A. N.`, `J.-P.`, `Ö.`.
fn is_initials(token: &str) -> bool {
    let mut chars = token.chars();
    let mut count = 0;
    while let Some(c) = chars.next() {
        if c.is_whitespace() || c == '-' {
            continue;
        }
        if !c.is_uppercase() || chars.next() != Some('.') {
            return false;
        }
        count += 1;
    }
    count > 0
}

/// Removes separators that are not part of a name.
fn strip_list_markers(token: &str) -> &str {
    let mut token = token.trim();
    loop {
        let stripped = token
            .strip_prefix("and ")
            .or_else(|| token.strip_prefix('\u{2026}'))
            .or_else(|| token.strip_prefix("..."))
            .map(str::trim_start);
        match stripped {
            Some(rest) => token = rest,
            None => return token,
        }
    }
}

fn emphasize(text: &str, marked: bool) -> String {
    if marked {
        format!("*{}*", text)
    } else {
        text.to_string()
    }
}

fn render(paper: &PaperRecord, marked: bool) -> String {
    let title = paper.title.trim();
    let title = title.strip_suffix('.').unwrap_or(title);
    if paper.authors.trim().is_empty() || title.is_empty() {
        return String::new();
    }

    let authors = format_author_list(&paper.authors);
    if authors.is_empty() {
        return String::new();
    }

    let year = match paper.year.trim() {
        "" => "(n.d.)".to_string(),
        year => format!("({})", year),
    };
    let journal = paper.journal.trim();
    let doi = doi_link(&paper.doi);

    if journal.to_lowercase().contains("arxiv") {
        let arxiv_id = extract_arxiv_id(&paper.doi)
            .map(|id| format!(" arXiv:{}", id))
            .unwrap_or_default();
        let citation = format!(
            "{} {}. {}. {}{}. {}",
            authors,
            year,
            title,
            emphasize("arXiv preprint", marked),
            arxiv_id,
            doi
        );
        citation.trim_end().to_string()
    } else if !journal.is_empty() {
        let mut source = emphasize(journal, marked);
        // Tracks whether the last plain segment already ends the sentence.
        let mut ends_with_period = journal.ends_with('.');

        let volume = paper.volume.trim();
        if !volume.is_empty() {
            source.push_str(", ");
            source.push_str(&emphasize(volume, marked));
            ends_with_period = false;
        }
        let issue = paper.issue.trim();
        if !issue.is_empty() {
            source.push_str(&format!("({})", issue));
            ends_with_period = false;
        }
        let pages = paper.pages.trim();
        if !pages.is_empty() {
            source.push_str(", ");
            source.push_str(&format_page_range(pages));
            ends_with_period = false;
        }

        let mut citation = format!("{} {}. {}. {}", authors, year, title, source);
        if !ends_with_period || marked {
            citation.push('.');
        }
        if !doi.is_empty() {
            citation.push(' ');
            citation.push_str(&doi);
            if !doi.ends_with('.') {
                citation.push('.');
            }
        }
        citation
    } else if doi.is_empty() {
        format!("{} {}. {}", authors, year, title)
    } else {
        format!("{} {}. {}. {}", authors, year, title, doi)
    }
}
