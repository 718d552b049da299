//! Candidate evaluation — pluggable, trait-based backend that judges one
//! candidate document against a job description.
//!
//! Default: `LlmEvaluator` (Gemini via `LlmClient`).
//! Tests swap in canned implementations; no handler or pipeline code changes.
//!
//! `AppState` holds an `Arc<dyn CandidateEvaluator>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::llm_client::{LlmClient, LlmError};
use crate::screening::prompts::SCREENING_PROMPT_TEMPLATE;

// ────────────────────────────────────────────────────────────────────────────
// Output data models (shared across all evaluator backends)
// ────────────────────────────────────────────────────────────────────────────

/// Yes/No fit verdict. Models occasionally answer with casing variants,
/// booleans, or something else entirely; anything that is not a clear yes/no
/// reads as `Unknown` instead of failing the whole evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MatchVerdict {
    Yes,
    No,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for MatchVerdict {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" => MatchVerdict::Yes,
                "no" => MatchVerdict::No,
                _ => MatchVerdict::Unknown,
            },
            Value::Bool(true) => MatchVerdict::Yes,
            Value::Bool(false) => MatchVerdict::No,
            _ => MatchVerdict::Unknown,
        })
    }
}

/// The model's verdict, returned under the `evaluation` key. Wire names stay
/// capitalized ("Match", "Reasoning") to match the schema the prompt pins.
/// Missing keys fall back to defaults rather than failing the parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "Match", default)]
    pub verdict: MatchVerdict,
    #[serde(rename = "Reasoning", default)]
    pub reasoning: String,
}

/// Structured result of one candidate evaluation. `parsed_resume` is a
/// free-form attribute map — the model picks keys (Name, Contact, Skills,
/// Experience, ...), so no schema is imposed on it here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(default)]
    pub parsed_resume: Map<String, Value>,
    #[serde(default)]
    pub evaluation: Verdict,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The evaluator trait. Implement this to swap backends without touching the
/// pipeline, handler, or caller code.
///
/// Carried in `AppState` as `Arc<dyn CandidateEvaluator>`.
#[async_trait]
pub trait CandidateEvaluator: Send + Sync {
    /// Evaluates one candidate document against the job description.
    /// Both arguments are extracted text and guaranteed non-empty.
    async fn evaluate(
        &self,
        job_description: &str,
        candidate_text: &str,
    ) -> Result<EvaluationResult, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmEvaluator — production backend
// ────────────────────────────────────────────────────────────────────────────

/// Gemini-backed evaluator: one prompt, one structured-JSON reply.
pub struct LlmEvaluator(pub LlmClient);

#[async_trait]
impl CandidateEvaluator for LlmEvaluator {
    async fn evaluate(
        &self,
        job_description: &str,
        candidate_text: &str,
    ) -> Result<EvaluationResult, LlmError> {
        let prompt = build_screening_prompt(job_description, candidate_text);
        self.0.call_json(&prompt).await
    }
}

/// Fills the screening template with both texts verbatim.
fn build_screening_prompt(job_description: &str, candidate_text: &str) -> String {
    SCREENING_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{candidate_text}", candidate_text)
}
