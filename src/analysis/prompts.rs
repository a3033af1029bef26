//! Fixed prompt templates sent to the model.
//!
//! Each template instructs the model to answer with a complete JSON object
//! and nothing else. The instruction is repeated aggressively because the
//! model still wraps output in prose or fences often enough that the parser
//! keeps a recovery chain for it.

const ANALYSIS_TEMPLATE: &str = r#"You are a strict ATS expert and career coach.

Task: analyze the resume below and return STRICTLY valid, COMPLETE JSON (no markdown, no code fences, no comments).

CRITICAL:
- Return the FULL JSON object; do not cut it off.
- The object MUST be fully closed (every bracket matched).
- Do not stop midway; emit every field completely.

Requirements:
- invent nothing; rely only on the resume text
- keep wording short and practical
- strengths: 3-5 items (5-10 words each)
- improvements: 3 items, each = {"title", "why", "how"} (title: 3-5 words, why: one sentence, how: one sentence)
- missing_keywords: 10-15 keywords/phrases (no duplicates, short)

JSON schema (return the WHOLE object; every field is required):
{
  "ats_score": 0,
  "summary": "1-2 sentences",
  "strengths": ["...", "...", "..."],
  "improvements": [{"title":"...","why":"...","how":"..."}, {"title":"...","why":"...","how":"..."}, {"title":"...","why":"...","how":"..."}],
  "missing_keywords": ["...", "...", "..."]
}

Resume:
{resume_text}

Return ONLY the valid JSON object, with no text before or after it. Make sure the object is closed with the final brace."#;

const TAILOR_TEMPLATE: &str = r#"You are an ATS expert.

Task: match the resume against the job posting and return STRICTLY valid JSON (no markdown).

Requirements:
- invent nothing; do not add experience that is not in the resume
- missing_keywords: only what the resume clearly lacks but the job needs (10-25)
- quick_fixes: 5-8 fast edits (what to change in the text or structure)
- rewritten_bullets: 3 rewritten bullets as {"before", "after"} (before taken from the resume as closely as possible, after an improved version with metrics and strong verbs, without fabrication)

JSON schema:
{
  "fit_score": 0,
  "missing_keywords": ["..."],
  "quick_fixes": ["..."],
  "rewritten_bullets": [{"before":"...","after":"..."}]
}

Resume:
{resume_text}

Job posting:
{job_text}"#;

const REWRITE_TEMPLATE: &str = r#"You are a career editor and ATS specialist.

Rewrite the resume with better structure and wording, but:
- do not invent facts, companies, dates, or numbers
- keep the resume's language and tone
- make it ATS-friendly: plain text, clear sections, bullet points

Return ONLY the updated resume text (no preamble, no markdown).

Resume:
{resume_text}"#;

pub fn render_analysis(resume_text: &str) -> String {
    ANALYSIS_TEMPLATE.replace("{resume_text}", resume_text)
}

pub fn render_tailor(resume_text: &str, job_text: &str) -> String {
    TAILOR_TEMPLATE
        .replace("{resume_text}", resume_text)
        .replace("{job_text}", job_text)
}

pub fn render_rewrite(resume_text: &str) -> String {
    REWRITE_TEMPLATE.replace("{resume_text}", resume_text)
}
