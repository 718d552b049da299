// All LLM prompt constants for the Screening module.

/// Candidate screening prompt template. Replace `{job_description}` and
/// `{candidate_text}` before sending. The JSON-only directive lives in the
/// prompt itself because the generateContent call carries no system turn.
pub const SCREENING_PROMPT_TEMPLATE: &str = r#"You are an expert HR professional and resume analyst.

Your ONLY output must be a single JSON object. Do NOT include any text, notes,
or markdown code fences before or after the JSON object. Do NOT include
explanations or apologies.

Analyze the candidate document below against the job description.

Return a JSON object with this EXACT schema (no extra top-level fields):
{
  "parsed_resume": {
    "Name": "candidate name",
    "Contact": "email / phone if present",
    "Skills": ["skill", "..."],
    "Experience": "summary of relevant experience"
  },
  "evaluation": {
    "Match": "Yes",
    "Reasoning": "one concise paragraph explaining the verdict"
  }
}

Rules:
- "parsed_resume": extract the candidate's details from the document text.
  Add further keys (Education, Certifications, ...) when the document
  provides them; use "Not found" for listed keys the document omits.
- "Match" must be exactly "Yes" or "No".
- "Reasoning" must weigh the candidate's skills and experience against the
  job description's requirements.

Job Description:
---
{job_description}
---

Candidate Document:
---
{candidate_text}
---"#;
