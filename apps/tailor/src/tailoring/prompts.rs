// All LLM prompt constants for the tailoring module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for the tailoring call.
pub const TAILOR_SYSTEM: &str = "You are an expert resume editor and career writer. \
    You tailor an existing resume to a job posting by proposing minimal, literal text \
    replacements and you write a matching cover letter. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Tailoring prompt template.
/// Placeholders: {json_only}, {integrity_instruction}, {resume}, {job_posting}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"{json_only}

{integrity_instruction}

Return a JSON object with this EXACT schema (no extra fields):
{
  "company_name": "string, non-empty: the hiring company's name as written in the job posting",
  "cover_letter": "string, non-empty: a complete cover letter for this job, plain text, paragraphs separated by blank lines",
  "replacements": [
    {
      "original_fragment": "string, non-empty: text copied VERBATIM from the resume",
      "new_fragment": "string, non-empty: the text that replaces it"
    }
  ]
}

FIELD TYPES:
- company_name: string
- cover_letter: string
- replacements: array of objects, each with exactly two string fields, original_fragment and new_fragment

HARD RULES for replacements:
1. `original_fragment` MUST be copied character-for-character from the RESUME below: same spelling, casing and punctuation
2. `original_fragment` MUST be unique in the resume: include enough surrounding words to identify exactly one place
3. `original_fragment` MUST stay inside a single line of the resume; never span two lines
4. Keep each replacement small: a phrase, a job title, a skill list, or one sentence
5. `new_fragment` must keep the same language and tone as the resume
6. Prefer the job posting's own terminology where the resume already shows that experience
7. Return an empty array if the resume needs no change

HARD RULES for the cover letter:
1. Address it to the company named in the job posting
2. Use only facts that appear in the resume
3. Keep it under 400 words

RESUME:
{resume}

JOB POSTING:
{job_posting}"#;
