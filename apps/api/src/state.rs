use std::sync::Arc;

use crate::config::Config;
use crate::screening::evaluator::CandidateEvaluator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable evaluation backend. Default: LlmEvaluator over the Gemini client.
    pub evaluator: Arc<dyn CandidateEvaluator>,
    pub config: Config,
}
