// Cross-cutting prompt fragments shared by every email-generation prompt.
// Each pipeline keeps its own templates in its own prompts.rs.

/// Output-shape instruction appended to all email prompts.
pub const EMAIL_FORMAT_INSTRUCTION: &str = "\
    Format the email with the subject line first, written as \"Subject: ...\", \
    then a blank line, then the body. Return plain text only: no markdown, \
    no placeholders in square brackets, no commentary before or after the email.";

/// Instruction that keeps the model from inventing candidate facts.
pub const FACTUALITY_INSTRUCTION: &str = "\
    Use only the candidate facts given above. Do NOT invent employers, degrees, \
    metrics or links. Where a field reads N/A, leave that topic out.";
