//! HTML rendering of summary cards and reading statistics.
//!
//! Every piece of record text is escaped before it reaches the markup, and
//! the DOI/URL field becomes a link only when it parses as an `http` or
//! `https` URL. Anything else is shown as plain text.

use itertools::Itertools;
use url::Url;

use crate::{PaperInfo, PaperRecord, StoreStats};

/// Shown instead of the cards when the collection is empty.
pub const EMPTY_SUMMARY: &str = "No papers added yet. Add some papers to see them here!";

const UNTITLED: &str = "Untitled Paper";
const NO_YEAR: &str = "Year not specified";

/// Escapes text for use in element content and quoted attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Parses a link target, accepting only `http` and `https` URLs.
///
/// # Examples
///
/// ```
/// use papertrack::html::safe_link;
///
/// assert!(safe_link("https://doi.org/10.1038/nature14539").is_some());
/// assert!(safe_link("javascript:alert(1)").is_none());
/// assert!(safe_link("10.1038/nature14539").is_none());
/// ```
pub fn safe_link(value: &str) -> Option<Url> {
    let url = Url::parse(value.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        scheme => {
            tracing::debug!(scheme, "refusing to link non-http URL");
            None
        }
    }
}

fn push_section(out: &mut String, class: &str, heading: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    out.push_str(&format!(
        "  <div class=\"{}\">\n    <div class=\"section-heading\">{}</div>\n    <div class=\"section-body\">{}</div>\n  </div>\n",
        class,
        heading,
        escape_html(body)
    ));
}

/// Renders one paper as a summary card.
pub fn render_summary_card(paper: &PaperRecord) -> String {
    let mut out = String::with_capacity(1024);
    let link = safe_link(&paper.doi);

    out.push_str(&format!("<div class=\"paper-card\" data-id=\"{}\">\n", paper.id));

    out.push_str("  <div class=\"paper-status-info\">\n");
    out.push_str(&format!(
        "    <span class=\"status-badge\">{}</span>\n",
        escape_html(&paper.status.label())
    ));
    out.push_str(&format!(
        "    <span class=\"priority-badge\">{}</span>\n",
        paper.priority
    ));
    if let Some(rating) = paper.rating {
        out.push_str(&format!(
            "    <span class=\"rating-stars\">{}</span>\n",
            "\u{2605}".repeat(usize::from(rating.stars()))
        ));
    }
    out.push_str("  </div>\n");

    let title = match paper.title.trim() {
        "" => UNTITLED,
        title => title,
    };
    out.push_str(&format!(
        "  <div class=\"paper-title\">{}</div>\n",
        escape_html(title)
    ));

    if !paper.authors.trim().is_empty() {
        out.push_str(&format!(
            "  <div class=\"paper-authors\">{}</div>\n",
            escape_html(&paper.authors)
        ));
    }

    let year = match paper.year.trim() {
        "" => NO_YEAR,
        year => year,
    };
    let mut year_journal = escape_html(year);
    if !paper.journal.trim().is_empty() {
        year_journal.push_str(" \u{2022} ");
        year_journal.push_str(&escape_html(paper.journal.trim()));
    }
    out.push_str(&format!(
        "  <div class=\"paper-year-journal\">{}</div>\n",
        year_journal
    ));

    let keywords = paper.keyword_list();
    if !keywords.is_empty() {
        let tags = keywords
            .iter()
            .map(|keyword| format!("<span class=\"keyword-tag\">{}</span>", escape_html(keyword)))
            .join("");
        out.push_str(&format!("  <div class=\"paper-keywords\">{}</div>\n", tags));
    }

    push_section(&mut out, "paper-key-points", "Key Points:", &paper.key_points);
    push_section(&mut out, "paper-relevance", "Relevance &amp; Notes:", &paper.notes);

    match link {
        Some(url) => out.push_str(&format!(
            "  <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"paper-link\">Open Paper</a>\n",
            escape_html(url.as_str())
        )),
        None if !paper.doi.trim().is_empty() => out.push_str(&format!(
            "  <span class=\"paper-link disabled\">{}</span>\n",
            escape_html(paper.doi.trim())
        )),
        None => {}
    }

    out.push_str("</div>\n");
    out
}

/// Renders the summary grid, or the empty-state message.
pub fn render_summary(papers: &[PaperRecord]) -> String {
    if papers.is_empty() {
        return format!("<div class=\"empty-summary\">{}</div>\n", EMPTY_SUMMARY);
    }
    papers.iter().map(render_summary_card).join("")
}

/// Renders the reading progress counters.
pub fn render_stats(stats: &StoreStats) -> String {
    [
        ("totalCount", "Total Papers", stats.total),
        ("readCount", "Read", stats.read),
        ("readingCount", "Reading", stats.reading),
        ("toReadCount", "To Read", stats.to_read),
    ]
    .iter()
    .map(|(id, label, count)| {
        format!(
            "<div class=\"stat-card\"><span class=\"stat-number\" id=\"{}\">{}</span><span class=\"stat-label\">{}</span></div>",
            id, count, label
        )
    })
    .join("\n")
}

/// Renders an extraction candidate for confirmation before it is added.
pub fn render_preview(info: &PaperInfo) -> String {
    let rows = [
        ("Title", &info.title),
        ("Authors", &info.authors),
        ("Year", &info.year),
        ("Journal", &info.journal),
        ("Keywords", &info.keywords),
        ("Abstract", &info.abstract_text),
        ("URL", &info.url),
        ("Relevance", &info.relevance),
    ];

    let body = rows
        .iter()
        .map(|(label, value)| {
            let value = match value.trim() {
                "" => "<em>Not found</em>".to_string(),
                value => escape_html(value),
            };
            format!("  <div class=\"preview-field\"><strong>{}:</strong> {}</div>", label, value)
        })
        .join("\n");

    format!("<div class=\"paper-preview\">\n{}\n</div>\n", body)
}
