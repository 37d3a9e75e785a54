//! A library for tracking research papers and formatting their APA-7 citations.
//!
//! `papertrack` keeps a reading list of papers in memory, regenerates an APA-7
//! citation whenever the fields that drive it change, and turns pasted text
//! (already-structured JSON or free text) into a candidate paper record.
//!
//! # Key Features
//!
//! - **Citation formatting**: APA-7 author lists (two authors, Oxford comma up to
//!   twenty, ellipsis beyond), arXiv preprints, DOI links and page ranges.
//! - **Record extraction**:
//!   - JSON objects with recognized paper keys are accepted as-is
//!   - Free text produces a ready-to-send request for an external assistant
//!   - A bounded heuristic fallback approximates that assistant offline
//! - **Store**: monotonically assigned ids, enum coercion, change notifications.
//! - **CSV import/export** with a fixed column layout and size caps.
//! - **HTML summary cards** with escaped output and safe links.
//!
//! # Basic Usage
//!
//! ```rust
//! use papertrack::{PaperInfo, PaperStore};
//!
//! let mut store = PaperStore::new();
//! let id = store.add_from_info(PaperInfo {
//!     title: "Deep learning".to_string(),
//!     authors: "LeCun, Y., Bengio, Y., & Hinton, G.".to_string(),
//!     year: "2015".to_string(),
//!     journal: "Nature".to_string(),
//!     ..Default::default()
//! });
//!
//! let paper = store.get(id).unwrap();
//! assert_eq!(
//!     paper.citation,
//!     "LeCun, Y., Bengio, Y., & Hinton, G. (2015). Deep learning. Nature."
//! );
//! ```
//!
//! # Extracting Pasted Input
//!
//! ```rust
//! use papertrack::extract::{Classification, Extractor};
//!
//! let extractor = Extractor::new();
//! match extractor.classify(r#"{"title": "Deep learning", "year": "2015"}"#).unwrap() {
//!     Classification::Structured(info) => assert_eq!(info.title, "Deep learning"),
//!     Classification::NeedsExternalHelp(request) => println!("{}", request.prompt),
//! }
//! ```
//!
//! # Error Handling
//!
//! The library uses a custom [`Result`] type that wraps [`TrackerError`] for
//! consistent error handling across all operations:
//!
//! ```rust
//! use papertrack::{TrackerError, extract::Extractor};
//!
//! match Extractor::new().classify("   ") {
//!     Err(TrackerError::Validation(msg)) => eprintln!("Rejected: {}", msg),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod citation;
pub mod config;
#[cfg(feature = "csv")]
pub mod csv;
pub mod error;
pub mod extract;
pub mod html;
mod regex;
pub mod store;
mod utils;

// Reexports
pub use citation::{FormattedCitation, format_citation, format_presentational};
pub use config::TrackerConfig;
pub use error::TrackerError;
pub use store::{PaperField, PaperStore, StoreEvent, StoreStats};

/// A specialized Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Identifier of a paper within one [`PaperStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(pub u64);

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reading status of a paper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    ToRead,
    Reading,
    Read,
    Skimmed,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::ToRead, Status::Reading, Status::Read, Status::Skimmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ToRead => "to-read",
            Status::Reading => "reading",
            Status::Read => "read",
            Status::Skimmed => "skimmed",
        }
    }

    /// Human readable label, e.g. `to read`.
    pub fn label(&self) -> String {
        self.as_str().replace('-', " ")
    }

    /// Parses a status, falling back to the default for anything outside the domain.
    pub fn coerce(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            if !value.trim().is_empty() {
                tracing::debug!(value, "coercing unknown status to default");
            }
            Status::default()
        })
    }
}

impl FromStr for Status {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| TrackerError::Validation(format!("unknown status '{}'", s)))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reading priority of a paper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parses a priority, falling back to the default for anything outside the domain.
    pub fn coerce(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            if !value.trim().is_empty() {
                tracing::debug!(value, "coercing unknown priority to default");
            }
            Priority::default()
        })
    }
}

impl FromStr for Priority {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s.trim())
            .ok_or_else(|| TrackerError::Validation(format!("unknown priority '{}'", s)))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A star rating between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(stars: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&stars).then_some(Rating(stars))
    }

    pub fn stars(&self) -> u8 {
        self.0
    }

    /// Parses an optional rating; empty or out-of-range input yields `None`.
    pub fn coerce(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let rating = value.parse::<u8>().ok().and_then(Rating::new);
        if rating.is_none() {
            tracing::debug!(value, "coercing invalid rating to empty");
        }
        rating
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating {} is outside 1-5", value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single tracked paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperRecord {
    pub id: PaperId,
    /// Title of the work
    pub title: String,
    /// Raw author list, e.g. `Smith, J., & Doe, A.`
    pub authors: String,
    /// Publication year, empty when unknown
    pub year: String,
    /// Journal or venue name
    pub journal: String,
    /// Comma-separated tags
    pub keywords: String,
    pub status: Status,
    pub priority: Priority,
    pub rating: Option<Rating>,
    /// Date the paper was added, `YYYY-MM-DD`
    pub date_added: String,
    pub key_points: String,
    pub notes: String,
    /// Derived APA-7 citation, user-editable until the next regeneration
    pub citation: String,
    /// DOI or URL
    pub doi: String,
    /// Chapter or topic the paper belongs to
    pub chapter: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
}

impl PaperRecord {
    /// Keywords split on commas, trimmed, without empty entries.
    pub fn keyword_list(&self) -> Vec<&str> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Paper information produced by the extractor, before it becomes a record.
///
/// This is also the exact response shape expected from an external assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperInfo {
    pub title: String,
    pub authors: String,
    pub year: String,
    pub journal: String,
    pub keywords: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
    pub relevance: String,
}

impl PaperInfo {
    /// The keys recognized in structured input.
    pub const KEYS: [&'static str; 8] = [
        "title", "authors", "year", "journal", "keywords", "abstract", "url", "relevance",
    ];

    /// Returns `true` when every field is blank.
    pub fn is_empty(&self) -> bool {
        [
            &self.title,
            &self.authors,
            &self.year,
            &self.journal,
            &self.keywords,
            &self.abstract_text,
            &self.url,
            &self.relevance,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }
}
