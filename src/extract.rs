//! Turning pasted text into paper information.
//!
//! The extractor accepts whatever a user pastes: a JSON object with paper
//! fields, a title, a URL, a DOI or a formatted citation. JSON objects with at
//! least one recognized key are taken as they are. Anything else needs an
//! external assistant to resolve it, so the extractor builds the request for
//! that assistant instead of guessing. A bounded heuristic fallback
//! ([`fallback_extract`]) stands in for the assistant when none is available.
//!
//! # Example
//!
//! ```
//! use papertrack::extract::{Classification, Extractor};
//!
//! let extractor = Extractor::new();
//!
//! let structured = extractor
//!     .classify(r#"{"title": "Attention Is All You Need", "year": "2017"}"#)
//!     .unwrap();
//! assert!(matches!(structured, Classification::Structured(_)));
//!
//! let free_text = extractor.classify("attention is all you need").unwrap();
//! assert!(matches!(free_text, Classification::NeedsExternalHelp(_)));
//! ```

mod external;
mod flow;
mod heuristics;
mod prompt;

use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use external::{Collaborator, SimulatedCollaborator, extract_with_timeout};
pub use flow::{ExtractionFlow, ExtractionState};
pub use heuristics::{KNOWN_PAPERS, KnownPaper, fallback_extract};
pub use prompt::{ExtractionRequest, build_prompt, parse_response};

use crate::regex::Regex;
use crate::utils::{is_absolute_url, is_bare_doi};
use crate::{PaperInfo, Result, TrackerError};

/// Default cap on accepted input, in characters.
pub const DEFAULT_MAX_INPUT_LEN: usize = 10_000;

/// Default deadline for an external extraction call.
pub const DEFAULT_EXTERNAL_TIMEOUT: Duration = Duration::from_secs(20);

/// Default latency of the simulated assistant.
pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_secs(2);

static PAREN_YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\d{4}\)").unwrap());

/// Configuration for the extractor.
///
/// # Examples
///
/// ```
/// use papertrack::extract::ExtractorConfig;
/// use std::time::Duration;
///
/// let mut config = ExtractorConfig::new();
/// config
///     .set_max_input_len(2_000)
///     .set_external_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Longest accepted input, in characters
    pub(crate) max_input_len: usize,
    /// Deadline for an external extraction call
    pub(crate) external_timeout: Duration,
    /// Delay of the simulated assistant
    pub(crate) simulated_latency: Duration,
    /// Whether unstructured input goes through the heuristic fallback
    /// instead of waiting for a manually relayed response
    pub(crate) heuristic_fallback: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorConfig {
    /// Creates a new extractor configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            external_timeout: DEFAULT_EXTERNAL_TIMEOUT,
            simulated_latency: DEFAULT_SIMULATED_LATENCY,
            heuristic_fallback: false,
        }
    }

    pub fn set_max_input_len(&mut self, max_input_len: usize) -> &mut Self {
        self.max_input_len = max_input_len;
        self
    }

    pub fn set_external_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.external_timeout = timeout;
        self
    }

    pub fn set_simulated_latency(&mut self, latency: Duration) -> &mut Self {
        self.simulated_latency = latency;
        self
    }

    pub fn set_heuristic_fallback(&mut self, enabled: bool) -> &mut Self {
        self.heuristic_fallback = enabled;
        self
    }

    pub fn max_input_len(&self) -> usize {
        self.max_input_len
    }

    pub fn external_timeout(&self) -> Duration {
        self.external_timeout
    }

    pub fn simulated_latency(&self) -> Duration {
        self.simulated_latency
    }

    pub fn heuristic_fallback(&self) -> bool {
        self.heuristic_fallback
    }
}

/// Outcome of classifying raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The input already was a structured paper record.
    Structured(PaperInfo),
    /// The input must be resolved by an external assistant.
    NeedsExternalHelp(ExtractionRequest),
}

/// What kind of reference a free-text input looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Url,
    Doi,
    Citation,
    Title,
}

/// Guesses what kind of reference the input is.
///
/// # Examples
///
/// ```
/// use papertrack::extract::{InputKind, detect_input_kind};
///
/// assert_eq!(detect_input_kind("https://arxiv.org/abs/1706.03762"), InputKind::Url);
/// assert_eq!(detect_input_kind("10.1038/nature14539"), InputKind::Doi);
/// assert_eq!(detect_input_kind("LeCun et al. (2015)"), InputKind::Citation);
/// assert_eq!(detect_input_kind("Deep learning"), InputKind::Title);
/// ```
pub fn detect_input_kind(input: &str) -> InputKind {
    let input = input.trim();
    if is_absolute_url(input) || input.contains("arxiv.org") || input.contains("doi.org") {
        InputKind::Url
    } else if is_bare_doi(input) {
        InputKind::Doi
    } else if input.contains("et al.") || PAREN_YEAR_REGEX.is_match(input) {
        InputKind::Citation
    } else {
        InputKind::Title
    }
}

/// Interprets input as a structured paper record.
///
/// The input qualifies only if it is a JSON object (not `null`, not an array)
/// with at least one key from [`PaperInfo::KEYS`]. Numbers are stringified,
/// arrays of values are joined with `, ` and `null` reads as empty.
///
/// # Errors
///
/// Returns [`TrackerError::StructureMismatch`] for any other shape.
pub fn parse_structured(input: &str) -> Result<PaperInfo> {
    let value: Value = serde_json::from_str(input.trim())
        .map_err(|e| TrackerError::StructureMismatch(e.to_string()))?;

    let Value::Object(map) = value else {
        return Err(TrackerError::StructureMismatch(
            "expected a JSON object".into(),
        ));
    };

    if !map.keys().any(|key| PaperInfo::KEYS.contains(&key.as_str())) {
        return Err(TrackerError::StructureMismatch(
            "object has no recognized paper fields".into(),
        ));
    }

    let field = |key: &str| map.get(key).map(json_to_text).unwrap_or_default();

    Ok(PaperInfo {
        title: field("title"),
        authors: field("authors"),
        year: field("year"),
        journal: field("journal"),
        keywords: field("keywords"),
        abstract_text: field("abstract"),
        url: field("url"),
        relevance: field("relevance"),
    })
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(json_to_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Classifies pasted input and extracts paper information from it.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// Creates a new extractor with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::new(),
        }
    }

    /// Creates a new extractor with custom configuration
    #[must_use]
    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Rejects empty and over-length input, returning the trimmed text.
    pub fn validate<'a>(&self, raw: &'a str) -> Result<&'a str> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(TrackerError::Validation(
                "Please enter a paper title, URL, DOI, or citation information".into(),
            ));
        }
        let len = input.chars().count();
        if len > self.config.max_input_len {
            return Err(TrackerError::Validation(format!(
                "input is {} characters long, the limit is {}",
                len, self.config.max_input_len
            )));
        }
        Ok(input)
    }

    /// Classifies raw input as a structured record or as a request for help.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] for empty or over-length input.
    /// A JSON document without recognized keys is not an error: it is
    /// treated like free text.
    pub fn classify(&self, raw: &str) -> Result<Classification> {
        let input = self.validate(raw)?;

        match parse_structured(input) {
            Ok(info) => {
                tracing::debug!(title = %info.title, "input recognized as structured record");
                Ok(Classification::Structured(info))
            }
            Err(TrackerError::StructureMismatch(reason)) => {
                let kind = detect_input_kind(input);
                tracing::debug!(?kind, %reason, "input needs external extraction");
                Ok(Classification::NeedsExternalHelp(ExtractionRequest::new(
                    input,
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Validates the input and runs the heuristic fallback on it.
    pub fn fallback(&self, raw: &str) -> Result<PaperInfo> {
        let input = self.validate(raw)?;
        Ok(fallback_extract(input))
    }

    /// Sends a request to an external assistant under the configured deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Timeout`] if the deadline passes,
    /// [`TrackerError::Cancelled`] if `cancel` fires first, or whatever error the
    /// assistant reported.
    pub async fn extract_external(
        &self,
        collaborator: &dyn Collaborator,
        request: &ExtractionRequest,
        cancel: &CancellationToken,
    ) -> Result<PaperInfo> {
        extract_with_timeout(collaborator, request, self.config.external_timeout, cancel).await
    }
}
