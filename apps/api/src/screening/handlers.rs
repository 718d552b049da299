//! Axum route handlers for the Screening API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::UploadedDocument;
use crate::screening::pipeline::{screen_candidates, ScreeningOutcome};
use crate::state::AppState;

/// Multipart field carrying the single job description file.
const JOB_DESCRIPTION_FIELD: &str = "jobDescription";
/// Multipart field carrying candidate files. Repeatable.
const RESUMES_FIELD: &str = "resumes";

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screen
///
/// Accepts one job description file and one or more candidate resumes as
/// multipart form data. Returns a JSON array with exactly one record per
/// resume, in upload order: either an evaluation or an error record.
pub async fn handle_screen(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Vec<ScreeningOutcome>>, AppError> {
    let upload = read_screening_upload(multipart).await?;

    info!(
        "screening {} candidate document(s) against {}",
        upload.resumes.len(),
        upload.job_description.filename
    );

    let outcomes = screen_candidates(
        state.evaluator.as_ref(),
        &upload.job_description,
        &upload.resumes,
    )
    .await?;

    Ok(Json(outcomes))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart intake
// ────────────────────────────────────────────────────────────────────────────

struct ScreeningUpload {
    job_description: UploadedDocument,
    resumes: Vec<UploadedDocument>,
}

/// Collects the expected multipart fields. Unknown fields are ignored;
/// a missing job description or an empty resume list is a 400.
async fn read_screening_upload(mut multipart: Multipart) -> Result<ScreeningUpload, AppError> {
    let mut job_description = None;
    let mut resumes = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart payload: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let data = field.bytes().await.map_err(|e| {
            AppError::Validation(format!("failed to read uploaded file {filename}: {e}"))
        })?;

        match name.as_str() {
            JOB_DESCRIPTION_FIELD => {
                job_description = Some(UploadedDocument::new(filename, data));
            }
            RESUMES_FIELD => resumes.push(UploadedDocument::new(filename, data)),
            _ => {}
        }
    }

    let Some(job_description) = job_description else {
        return Err(AppError::Validation(
            "missing job description or resume files".to_string(),
        ));
    };
    if resumes.is_empty() {
        return Err(AppError::Validation(
            "missing job description or resume files".to_string(),
        ));
    }

    Ok(ScreeningUpload {
        job_description,
        resumes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm_client::LlmError;
    use crate::routes::build_router;
    use crate::screening::evaluator::{CandidateEvaluator, EvaluationResult};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use docx_rs::{Docx, Paragraph, Run};
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "shortlist-test-boundary";

    struct YesEvaluator;

    #[async_trait]
    impl CandidateEvaluator for YesEvaluator {
        async fn evaluate(
            &self,
            _job_description: &str,
            _candidate_text: &str,
        ) -> Result<EvaluationResult, LlmError> {
            Ok(serde_json::from_value(json!({
                "parsed_resume": {"Name": "Jane Doe"},
                "evaluation": {"Match": "Yes", "Reasoning": "fits the role"}
            }))
            .unwrap())
        }
    }

    fn make_state() -> AppState {
        AppState {
            evaluator: Arc::new(YesEvaluator),
            config: Config {
                gemini_api_key: "test-key".to_string(),
                gemini_model: "gemini-2.5-flash".to_string(),
                port: 8080,
                max_upload_mb: 25,
                rust_log: "info".to_string(),
            },
        }
    }

    fn make_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let mut buffer = Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).unwrap();
        buffer.into_inner()
    }

    fn multipart_body(parts: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, filename, bytes) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post_screen(body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/screen")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = build_router(make_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_screen_returns_one_record_per_resume_in_order() {
        let jd = make_docx(&["Seeking a Python backend engineer"]);
        let good = make_docx(&["Jane Doe", "Python, Django"]);
        let body = multipart_body(&[
            ("jobDescription", "jd.docx", jd),
            ("resumes", "jane.docx", good),
            ("resumes", "broken.pdf", b"not really a pdf".to_vec()),
        ]);

        let (status, value) = post_screen(body).await;

        assert_eq!(status, StatusCode::OK);
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["filename"], json!("jane.docx"));
        assert_eq!(records[0]["parsed_resume"]["Name"], json!("Jane Doe"));
        assert_eq!(records[0]["evaluation"]["Match"], json!("Yes"));
        assert_eq!(records[1]["filename"], json!("broken.pdf"));
        assert!(records[1]["error"].as_str().unwrap().contains("broken.pdf"));
    }

    #[tokio::test]
    async fn test_screen_without_job_description_is_bad_request() {
        let body = multipart_body(&[("resumes", "jane.docx", make_docx(&["Jane Doe"]))]);

        let (status, value) = post_screen(body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"]["code"], json!("VALIDATION_ERROR"));
        assert!(value["error"]["message"]
            .as_str()
            .unwrap()
            .contains("missing job description or resume files"));
    }

    #[tokio::test]
    async fn test_screen_without_resumes_is_bad_request() {
        let body = multipart_body(&[(
            "jobDescription",
            "jd.docx",
            make_docx(&["Seeking an engineer"]),
        )]);

        let (status, value) = post_screen(body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"]["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_screen_with_unreadable_job_description_is_unprocessable() {
        let body = multipart_body(&[
            ("jobDescription", "jd.pdf", b"garbage bytes".to_vec()),
            ("resumes", "jane.docx", make_docx(&["Jane Doe"])),
        ]);

        let (status, value) = post_screen(body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(value["error"]["code"], json!("UNPROCESSABLE_ENTITY"));
        assert!(value["error"]["message"].as_str().unwrap().contains("jd.pdf"));
    }

    #[tokio::test]
    async fn test_screen_ignores_unknown_fields() {
        let jd = make_docx(&["Seeking a Python backend engineer"]);
        let resume = make_docx(&["Jane Doe"]);
        let body = multipart_body(&[
            ("jobDescription", "jd.docx", jd),
            ("extraField", "extra.bin", b"ignored".to_vec()),
            ("resumes", "jane.docx", resume),
        ]);

        let (status, value) = post_screen(body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value.as_array().unwrap().len(), 1);
    }
}
