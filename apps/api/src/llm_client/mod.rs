//! LLM client — the single point of entry for all Gemini API calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! Callers build prompts; this module owns transport, response decoding,
//! and the cleanup applied to model output before JSON parsing.

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const JSON_MIME_TYPE: &str = "application/json";

/// Model used when GEMINI_MODEL is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned no text content")]
    EmptyContent,

    #[error("LLM response is not valid JSON: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Extracts the text of the first candidate's first text part.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// The single LLM client used by the screening service.
/// Wraps the Gemini generateContent API with structured output helpers.
/// Calls are made exactly once — no retry, no added deadline; a slow or
/// failing upstream surfaces as the transport's own error.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
}

impl LlmClient {
    /// The API key and model are fixed at construction; nothing in this
    /// module reads the environment at call time.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    /// Makes a raw call to the Gemini API, returning the full response object.
    /// `response_mime_type` is forwarded as the generationConfig output hint.
    pub async fn call(
        &self,
        prompt: &str,
        response_mime_type: Option<&str>,
    ) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: response_mime_type.map(|mime| GenerationConfig {
                response_mime_type: mime,
            }),
        };

        let url = format!("{GEMINI_API_URL}/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Surface the API's own message when the error envelope parses
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let gemini_response: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, response_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(gemini_response)
    }

    /// Calls the LLM with the JSON output hint and deserializes the text
    /// response. The prompt must still instruct the model to return valid
    /// JSON: the mime hint is advisory, so the reply is cleaned up first
    /// (fences stripped, then a balanced-object scan as a last resort).
    pub async fn call_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, LlmError> {
        let response = self.call(prompt, Some(JSON_MIME_TYPE)).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        // Strip markdown code fences if the model wraps JSON in them
        let cleaned = strip_json_fences(text);

        match serde_json::from_str(cleaned) {
            Ok(value) => Ok(value),
            Err(parse_err) => {
                // The model sometimes pads the object with prose; take the
                // first balanced object if one exists
                if let Some(object) = first_json_object(cleaned) {
                    if let Ok(value) = serde_json::from_str(object) {
                        return Ok(value);
                    }
                }
                error!("unparseable LLM response: {text}");
                Err(LlmError::MalformedResponse(parse_err))
            }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Finds the first balanced `{...}` object in `text`. Brace counting is
/// string-aware, so braces inside quoted values (escaped quotes included)
/// do not skew the depth.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_fenced_and_unfenced_payloads_parse_identically() {
        let unfenced = r#"{"parsed_resume": {"Name": "Jane"}, "evaluation": {"Match": "Yes"}}"#;
        let fenced = format!("```json\n{unfenced}\n```");
        let a: Value = serde_json::from_str(strip_json_fences(&fenced)).unwrap();
        let b: Value = serde_json::from_str(strip_json_fences(unfenced)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fence_stripping_is_idempotent_on_clean_json() {
        let clean = r#"{"evaluation": {"Match": "No", "Reasoning": "missing skills"}}"#;
        let once = strip_json_fences(clean);
        let twice = strip_json_fences(once);
        assert_eq!(once, twice);
        assert_eq!(twice, clean);
    }

    #[test]
    fn test_first_json_object_ignores_surrounding_prose() {
        let text = "Sure! Here is the result: {\"Match\": \"Yes\"} Hope this helps.";
        assert_eq!(first_json_object(text), Some("{\"Match\": \"Yes\"}"));
    }

    #[test]
    fn test_first_json_object_handles_braces_inside_strings() {
        let text = r#"{"Reasoning": "uses {braces} and a quote \" inside"}"#;
        assert_eq!(first_json_object(text), Some(text));
    }

    #[test]
    fn test_first_json_object_returns_outermost_object() {
        let text = r#"noise {"a": {"b": 1}, "c": 2} trailing {"d": 3}"#;
        assert_eq!(first_json_object(text), Some(r#"{"a": {"b": 1}, "c": 2}"#));
    }

    #[test]
    fn test_first_json_object_none_without_object() {
        assert_eq!(first_json_object("no json here"), None);
        assert_eq!(first_json_object(""), None);
    }

    #[test]
    fn test_response_text_reads_first_candidate_part() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"Match\": \"Yes\"}"}], "role": "model"}}
            ],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 48}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text(), Some("{\"Match\": \"Yes\"}"));
    }

    #[test]
    fn test_response_text_none_when_candidates_missing() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_response_text_none_when_parts_empty() {
        let raw = r#"{"candidates": [{"content": {"parts": []}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text(), None);
    }
}
