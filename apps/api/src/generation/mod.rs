// Application-email generation: prompt builder, remote generation through
// llm_client, and the deterministic fallback template.
// All remote calls go through the TextGenerator seam.

pub mod fallback;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod text;
