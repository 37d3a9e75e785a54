//! Requests for, and responses from, an external assistant.

use serde_json::Value;

use crate::{PaperInfo, Result, TrackerError};

/// A ready-to-send extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// The user's input, trimmed
    pub raw_input: String,
    /// Prompt embedding the input, to be relayed to the assistant
    pub prompt: String,
}

impl ExtractionRequest {
    pub fn new(raw_input: &str) -> Self {
        let raw_input = raw_input.trim().to_string();
        let prompt = build_prompt(&raw_input);
        Self { raw_input, prompt }
    }
}

/// Builds the plain-text prompt asking an assistant for paper information.
///
/// The reply is expected to be a single JSON object with exactly the keys of
/// [`PaperInfo::KEYS`], every value a string.
pub fn build_prompt(input: &str) -> String {
    format!(
        r#"I'm using a research paper tracker and need you to extract paper information. The user provided: "{input}"

Please analyze this and return the information in this exact JSON format:

{{
  "title": "Full paper title",
  "authors": "Author names in APA format (Last, F. M., Last, F. M., & Last, F. M.)",
  "year": "Publication year",
  "journal": "Journal or venue name",
  "keywords": "keyword1, keyword2, keyword3, keyword4",
  "abstract": "Key findings, methodology, and main contributions in 2-3 sentences",
  "url": "DOI link or paper URL",
  "relevance": "Why this paper might be relevant to research (1-2 sentences)"
}}

Please ensure the JSON is properly formatted and fill in as much information as possible. If you cannot find certain fields, use empty strings but keep the JSON structure intact."#
    )
}

/// Parses an assistant's reply into paper information.
///
/// The JSON object may be surrounded by prose or a code fence. Missing keys
/// read as empty strings and unknown keys are ignored.
///
/// # Errors
///
/// Returns [`TrackerError::Validation`] if the reply holds no JSON object, the
/// object has none of the expected keys, or an expected key is not a string.
pub fn parse_response(reply: &str) -> Result<PaperInfo> {
    let (start, end) = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(TrackerError::Validation(
                "response does not contain a JSON object".into(),
            ));
        }
    };

    let value: Value = serde_json::from_str(&reply[start..=end])?;
    let Value::Object(map) = &value else {
        return Err(TrackerError::Validation(
            "response is not a JSON object".into(),
        ));
    };

    let mut recognized = 0;
    for key in PaperInfo::KEYS {
        match map.get(key) {
            None => {}
            Some(Value::String(_)) => recognized += 1,
            Some(other) => {
                return Err(TrackerError::Validation(format!(
                    "field '{}' must be a string, got {}",
                    key, other
                )));
            }
        }
    }
    if recognized == 0 {
        return Err(TrackerError::Validation(
            "response has none of the expected fields".into(),
        ));
    }

    let mut info: PaperInfo = serde_json::from_value(value)?;
    for field in [
        &mut info.title,
        &mut info.authors,
        &mut info.year,
        &mut info.journal,
        &mut info.keywords,
        &mut info.abstract_text,
        &mut info.url,
        &mut info.relevance,
    ] {
        *field = field.trim().to_string();
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prompt_embeds_input_and_keys() {
        let request = ExtractionRequest::new("  Deep learning, Nature 2015 ");
        assert_eq!(request.raw_input, "Deep learning, Nature 2015");
        assert!(request.prompt.contains(r#"The user provided: "Deep learning, Nature 2015""#));
        for key in PaperInfo::KEYS {
            assert!(request.prompt.contains(&format!("\"{}\":", key)), "{}", key);
        }
    }

    #[test]
    fn test_parse_fenced_response() {
        let reply = r#"Here you go:
```json
{
  "title": " Deep learning ",
  "authors": "LeCun, Y., Bengio, Y., & Hinton, G.",
  "year": "2015",
  "journal": "Nature",
  "keywords": "deep learning",
  "abstract": "",
  "url": "https://doi.org/10.1038/nature14539",
  "relevance": ""
}
```"#;
        let info = parse_response(reply).unwrap();
        assert_eq!(info.title, "Deep learning");
        assert_eq!(info.year, "2015");
        assert_eq!(info.url, "https://doi.org/10.1038/nature14539");
    }

    #[test]
    fn test_parse_response_rejects_non_string_values() {
        let result = parse_response(r#"{"title": "x", "year": 2015}"#);
        assert!(matches!(result, Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_parse_response_rejects_missing_object() {
        assert!(parse_response("I could not find that paper.").is_err());
        assert!(parse_response(r#"{"name": "x"}"#).is_err());
        assert!(parse_response("{ not json }").is_err());
    }
}
