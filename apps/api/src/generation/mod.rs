// Worksheet generation
// Implements: prompt building, markdown cleanup, the ContentGenerator seam, worksheet CRUD
// handlers. All LLM calls go through llm_client; nothing here talks to the API directly.

pub mod generator;
pub mod handlers;
pub mod markdown;
pub mod prompts;
