//! Batch screening pipeline — one job description against an ordered set of
//! candidate documents.
//!
//! The job description must extract cleanly or the whole batch is rejected.
//! Candidate failures are isolated: extraction and evaluation errors become
//! per-candidate records and the batch keeps going, so the output always has
//! exactly one record per uploaded candidate, in upload order.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::{self, UploadedDocument};
use crate::llm_client::LlmError;
use crate::screening::evaluator::{CandidateEvaluator, EvaluationResult};

/// Successful evaluation of one candidate. Flattens to
/// `{"filename", "parsed_resume", "evaluation"}` on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub filename: String,
    #[serde(flatten)]
    pub result: EvaluationResult,
}

/// A candidate that could not be read or evaluated. Serializes to
/// `{"filename", "error"}`.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateFailure {
    pub filename: String,
    pub error: String,
}

/// Per-candidate outcome. Every uploaded candidate yields exactly one of
/// these — failures are recorded, never dropped.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScreeningOutcome {
    Evaluated(CandidateReport),
    Failed(CandidateFailure),
}

/// Screens every candidate document against the job description,
/// sequentially and in upload order.
pub async fn screen_candidates(
    evaluator: &dyn CandidateEvaluator,
    job_description: &UploadedDocument,
    candidates: &[UploadedDocument],
) -> Result<Vec<ScreeningOutcome>, AppError> {
    let job_description_text = extraction::extract_text(job_description).map_err(|e| {
        AppError::UnprocessableEntity(format!(
            "could not read job description file {}: {e}",
            job_description.filename
        ))
    })?;

    let mut outcomes = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        info!("processing candidate document {}", candidate.filename);

        let candidate_text = match extraction::extract_text(candidate) {
            Ok(text) => text,
            Err(e) => {
                warn!("skipping evaluation for {}: {e}", candidate.filename);
                outcomes.push(ScreeningOutcome::Failed(CandidateFailure {
                    filename: candidate.filename.clone(),
                    error: format!("could not read file {}: {e}", candidate.filename),
                }));
                continue;
            }
        };

        match evaluator
            .evaluate(&job_description_text, &candidate_text)
            .await
        {
            Ok(result) => {
                outcomes.push(ScreeningOutcome::Evaluated(CandidateReport {
                    filename: candidate.filename.clone(),
                    result,
                }));
            }
            Err(e) => {
                warn!("evaluation failed for {}: {e}", candidate.filename);
                let error = match &e {
                    LlmError::MalformedResponse(source) => format!(
                        "model response for {} was not valid JSON: {source}",
                        candidate.filename
                    ),
                    other => format!("evaluation failed for {}: {other}", candidate.filename),
                };
                outcomes.push(ScreeningOutcome::Failed(CandidateFailure {
                    filename: candidate.filename.clone(),
                    error,
                }));
            }
        }
    }

    Ok(outcomes)
}
