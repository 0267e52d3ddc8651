use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A generated worksheet and its saved page layout.
///
/// `page_states` holds one serialized page per entry, produced by the drawing surface.
/// It is stored and returned as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetState {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub topic: String,
    pub generated_content: String,
    #[serde(default)]
    pub page_states: Vec<Value>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl WorksheetState {
    pub fn new(subject: &str, topic: &str, grade: &str, generated_content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: format!("{subject} - {topic}"),
            subject: subject.to_string(),
            grade: grade.to_string(),
            topic: topic.to_string(),
            generated_content,
            page_states: Vec::new(),
            created_at: now,
            last_modified: now,
        }
    }

    /// Appends regenerated content below the existing text.
    pub fn append_content(&mut self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        if !self.generated_content.is_empty() && !self.generated_content.ends_with('\n') {
            self.generated_content.push('\n');
        }
        self.generated_content.push_str(content);
        self.touch();
    }

    pub fn set_page_states(&mut self, page_states: Vec<Value>) {
        self.page_states = page_states;
        self.touch();
    }

    fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}
