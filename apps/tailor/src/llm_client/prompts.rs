// Shared prompt constants.
// The tailoring module defines its own prompts.rs; this file holds the
// cross-cutting fragments every prompt must carry.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Content-integrity rule: the model may reword, never invent.
pub const INTEGRITY_INSTRUCTION: &str = "\
    CRITICAL: Do NOT fabricate experience, skills, tools, employers, dates, metrics or \
    qualifications that are not present in the original resume. No exaggeration, no false \
    claims. You may only rephrase, reorder emphasis, or surface wording that the resume \
    already supports. If the job asks for something the resume does not show, leave it out.";
