// Candidate screening: extraction-fed, LLM-backed evaluation of resumes
// against a job description, with per-candidate failure isolation.
// All LLM calls go through llm_client — no direct Gemini calls here.

pub mod evaluator;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
