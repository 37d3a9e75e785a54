//! State of the "add from pasted text" affordance.
//!
//! ```text
//! Idle -> Validating -> StructuredRecognized  -> Idle
//!                    -> FallbackHeuristic     -> Idle
//!                    -> AwaitingExternalHelp  -> Idle
//! ```
//!
//! A candidate leaves the flow through [`ExtractionFlow::confirm`]; the caller
//! then hands it to the store. Failed validation returns to `Idle` without a
//! candidate.

use super::heuristics::fallback_extract;
use super::prompt::{ExtractionRequest, parse_response};
use super::{Classification, Extractor};
use crate::{PaperInfo, Result, TrackerError};

/// Where the extraction affordance currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtractionState {
    #[default]
    Idle,
    Validating,
    /// Input was a structured record, awaiting confirmation.
    StructuredRecognized(PaperInfo),
    /// Input was resolved by the heuristic fallback, awaiting confirmation.
    FallbackHeuristic(PaperInfo),
    /// The request must be relayed to an external assistant.
    AwaitingExternalHelp(ExtractionRequest),
}

impl ExtractionState {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractionState::Idle => "idle",
            ExtractionState::Validating => "validating",
            ExtractionState::StructuredRecognized(_) => "structured",
            ExtractionState::FallbackHeuristic(_) => "fallback",
            ExtractionState::AwaitingExternalHelp(_) => "awaiting-external-help",
        }
    }

    /// The candidate awaiting confirmation, if any.
    pub fn candidate(&self) -> Option<&PaperInfo> {
        match self {
            ExtractionState::StructuredRecognized(info)
            | ExtractionState::FallbackHeuristic(info) => Some(info),
            _ => None,
        }
    }

    /// The request to relay, if the flow waits for an assistant.
    pub fn pending_request(&self) -> Option<&ExtractionRequest> {
        match self {
            ExtractionState::AwaitingExternalHelp(request) => Some(request),
            _ => None,
        }
    }
}

/// Drives an [`Extractor`] through the states of the paste-to-add affordance.
#[derive(Debug, Clone, Default)]
pub struct ExtractionFlow {
    extractor: Extractor,
    state: ExtractionState,
}

impl ExtractionFlow {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor,
            state: ExtractionState::Idle,
        }
    }

    pub fn state(&self) -> &ExtractionState {
        &self.state
    }

    fn transition(&mut self, next: ExtractionState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "extraction state");
        self.state = next;
    }

    /// Submits raw input.
    ///
    /// Unstructured input either waits for an external assistant or, when the
    /// extractor is configured for it, goes through the heuristic fallback.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] for empty or over-length input;
    /// the flow is back in `Idle` afterwards.
    pub fn submit(&mut self, raw: &str) -> Result<&ExtractionState> {
        self.transition(ExtractionState::Validating);

        let next = match self.extractor.classify(raw) {
            Ok(Classification::Structured(info)) => ExtractionState::StructuredRecognized(info),
            Ok(Classification::NeedsExternalHelp(request)) => {
                if self.extractor.config().heuristic_fallback() {
                    ExtractionState::FallbackHeuristic(fallback_extract(&request.raw_input))
                } else {
                    ExtractionState::AwaitingExternalHelp(request)
                }
            }
            Err(e) => {
                tracing::info!(error = %e, "input rejected");
                self.transition(ExtractionState::Idle);
                return Err(e);
            }
        };

        self.transition(next);
        Ok(&self.state)
    }

    /// Accepts the assistant's reply for the pending request.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] if no request is pending or the
    /// reply cannot be parsed; the flow keeps waiting in the latter case.
    pub fn provide_response(&mut self, reply: &str) -> Result<&ExtractionState> {
        if self.state.pending_request().is_none() {
            return Err(TrackerError::Validation(
                "no extraction request is pending".into(),
            ));
        }
        let info = parse_response(reply)?;
        self.transition(ExtractionState::StructuredRecognized(info));
        Ok(&self.state)
    }

    /// Takes the candidate for confirmation and returns to `Idle`.
    pub fn confirm(&mut self) -> Option<PaperInfo> {
        let candidate = match std::mem::take(&mut self.state) {
            ExtractionState::StructuredRecognized(info)
            | ExtractionState::FallbackHeuristic(info) => Some(info),
            other => {
                self.state = other;
                return None;
            }
        };
        self.transition(ExtractionState::Idle);
        candidate
    }

    /// Abandons whatever is in progress.
    pub fn reset(&mut self) {
        self.transition(ExtractionState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractorConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structured_input_then_confirm() {
        let mut flow = ExtractionFlow::default();
        let state = flow.submit(r#"{"title": "Deep learning"}"#).unwrap();
        assert_eq!(state.name(), "structured");

        let info = flow.confirm().unwrap();
        assert_eq!(info.title, "Deep learning");
        assert_eq!(flow.state(), &ExtractionState::Idle);
    }

    #[test]
    fn test_free_text_waits_for_assistant() {
        let mut flow = ExtractionFlow::default();
        flow.submit("Deep learning, Nature 2015").unwrap();
        let request = flow.state().pending_request().unwrap();
        assert!(request.prompt.contains("Deep learning, Nature 2015"));
        assert_eq!(flow.confirm(), None);

        assert!(flow.provide_response("no json here").is_err());
        assert!(flow.state().pending_request().is_some());

        flow.provide_response(r#"{"title": "Deep learning", "year": "2015"}"#)
            .unwrap();
        assert_eq!(flow.confirm().unwrap().year, "2015");
    }

    #[test]
    fn test_heuristic_fallback_mode() {
        let mut config = ExtractorConfig::new();
        config.set_heuristic_fallback(true);
        let mut flow = ExtractionFlow::new(Extractor::new().with_config(config));

        let state = flow.submit("Attention is all you need").unwrap();
        assert_eq!(state.name(), "fallback");
        assert_eq!(state.candidate().unwrap().year, "2017");
    }

    #[test]
    fn test_rejected_input_returns_to_idle() {
        let mut flow = ExtractionFlow::default();
        assert!(flow.submit("  ").is_err());
        assert_eq!(flow.state(), &ExtractionState::Idle);
    }

    #[test]
    fn test_response_without_pending_request() {
        let mut flow = ExtractionFlow::default();
        assert!(flow.provide_response(r#"{"title": "x"}"#).is_err());
    }

    #[test]
    fn test_reset() {
        let mut flow = ExtractionFlow::default();
        flow.submit("some title").unwrap();
        flow.reset();
        assert_eq!(flow.state(), &ExtractionState::Idle);
    }
}
