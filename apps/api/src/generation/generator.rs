//! Content generation: the single seam between the worksheet flow and the language model.
//!
//! `AppState` holds an `Arc<dyn ContentGenerator>`; handlers never see the LLM client.
//! One model call per request, no retry. A failed call leaves stored worksheets untouched.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::markdown::clean_markdown;
use crate::generation::prompts::{build_worksheet_prompt, WORKSHEET_SYSTEM};
use crate::llm_client::{LlmClient, MODEL};

// ────────────────────────────────────────────────────────────────────────────
// Request / result types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub subject: String,
    pub topic: String,
    /// Accepts `"4"` or `4` from clients.
    #[serde(deserialize_with = "string_or_number")]
    pub grade: String,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("subject", &self.subject),
            ("topic", &self.topic),
            ("grade", &self.grade),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Grade {
        Text(String),
        Number(u32),
    }
    Ok(match Grade::deserialize(deserializer)? {
        Grade::Text(s) => s,
        Grade::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedContent {
    /// Cleaned, line-structured worksheet text.
    pub content: String,
    pub model: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedContent, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmContentGenerator
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmContentGenerator {
    llm: LlmClient,
}

impl LlmContentGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedContent, AppError> {
        let prompt = build_worksheet_prompt(&request.subject, &request.topic, &request.grade);
        let raw = self.llm.call_text(&prompt, WORKSHEET_SYSTEM).await?;
        let content = clean_markdown(&raw);
        if content.is_empty() {
            return Err(AppError::Llm(
                "Model returned no usable worksheet content".to_string(),
            ));
        }

        info!(
            subject = %request.subject,
            topic = %request.topic,
            grade = %request.grade,
            lines = content.lines().count(),
            "Generated worksheet content"
        );

        Ok(GeneratedContent {
            content,
            model: MODEL.to_string(),
        })
    }
}
