//! The external assistant seam and its deadline handling.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::heuristics::fallback_extract;
use super::prompt::ExtractionRequest;
use super::{DEFAULT_SIMULATED_LATENCY, InputKind, detect_input_kind};
use crate::{PaperInfo, Result, TrackerError};

/// Hosts the simulated assistant treats as unreachable.
const UNREACHABLE_MARKERS: &[&str] = &["example.com", "broken-link"];

/// An assistant that turns an extraction request into paper information.
pub trait Collaborator: Send + Sync {
    /// Name used in log events.
    fn name(&self) -> &str;

    /// Resolves the request.
    fn extract<'a>(
        &'a self,
        request: &'a ExtractionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PaperInfo>> + Send + 'a>>;
}

/// A stand-in assistant: waits for a fixed latency, then answers with the
/// heuristic fallback.
#[derive(Debug, Clone)]
pub struct SimulatedCollaborator {
    latency: Duration,
}

impl Default for SimulatedCollaborator {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_LATENCY)
    }
}

impl SimulatedCollaborator {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Collaborator for SimulatedCollaborator {
    fn name(&self) -> &str {
        "simulated"
    }

    fn extract<'a>(
        &'a self,
        request: &'a ExtractionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PaperInfo>> + Send + 'a>> {
        Box::pin(async move {
            tokio::time::sleep(self.latency).await;

            let input = request.raw_input.as_str();
            if detect_input_kind(input) == InputKind::Url
                && UNREACHABLE_MARKERS.iter().any(|marker| input.contains(marker))
            {
                return Err(TrackerError::Unreachable(input.to_string()));
            }

            Ok(fallback_extract(input))
        })
    }
}

/// Runs an extraction request with a deadline and a cancellation token.
///
/// The call resolves exactly once: with the assistant's answer, with
/// [`TrackerError::Timeout`] when `deadline` passes first, or with
/// [`TrackerError::Cancelled`] when `cancel` fires first. In the latter two
/// cases the assistant's future is dropped and its result never observed.
pub async fn extract_with_timeout(
    collaborator: &dyn Collaborator,
    request: &ExtractionRequest,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<PaperInfo> {
    tracing::debug!(collaborator = collaborator.name(), ?deadline, "starting external extraction");

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!(collaborator = collaborator.name(), "external extraction cancelled");
            Err(TrackerError::Cancelled)
        }
        outcome = tokio::time::timeout(deadline, collaborator.extract(request)) => match outcome {
            Ok(Ok(info)) => {
                tracing::debug!(collaborator = collaborator.name(), title = %info.title, "external extraction finished");
                Ok(info)
            }
            Ok(Err(e)) => {
                tracing::warn!(collaborator = collaborator.name(), error = %e, "external extraction failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(collaborator = collaborator.name(), ?deadline, "external extraction timed out");
                Err(TrackerError::Timeout(deadline))
            }
        },
    }
}
