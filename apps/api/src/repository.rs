//! Worksheet storage.
//!
//! Handlers only see `Arc<dyn WorksheetRepository>`; the in-memory implementation keeps
//! worksheets newest first. Durability is not a concern of this service.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::WorksheetState;

#[async_trait]
pub trait WorksheetRepository: Send + Sync {
    /// Stores a new worksheet at the front of the list.
    async fn insert(&self, worksheet: WorksheetState);

    /// All worksheets, newest first.
    async fn list(&self) -> Vec<WorksheetState>;

    async fn get(&self, id: Uuid) -> Option<WorksheetState>;

    /// Appends to the stored content in place. Page states are left as stored.
    async fn append_content(&self, id: Uuid, content: &str) -> Option<WorksheetState>;

    /// Replaces the stored page states in place. Content is left as stored.
    async fn set_page_states(&self, id: Uuid, page_states: Vec<Value>) -> Option<WorksheetState>;
}

#[derive(Default)]
pub struct InMemoryWorksheetRepository {
    worksheets: RwLock<Vec<WorksheetState>>,
}

impl InMemoryWorksheetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorksheetRepository for InMemoryWorksheetRepository {
    async fn insert(&self, worksheet: WorksheetState) {
        self.worksheets.write().await.insert(0, worksheet);
    }

    async fn list(&self) -> Vec<WorksheetState> {
        self.worksheets.read().await.clone()
    }

    async fn get(&self, id: Uuid) -> Option<WorksheetState> {
        self.worksheets
            .read()
            .await
            .iter()
            .find(|w| w.id == id)
            .cloned()
    }

    async fn append_content(&self, id: Uuid, content: &str) -> Option<WorksheetState> {
        let mut worksheets = self.worksheets.write().await;
        let worksheet = worksheets.iter_mut().find(|w| w.id == id)?;
        worksheet.append_content(content);
        Some(worksheet.clone())
    }

    async fn set_page_states(&self, id: Uuid, page_states: Vec<Value>) -> Option<WorksheetState> {
        let mut worksheets = self.worksheets.write().await;
        let worksheet = worksheets.iter_mut().find(|w| w.id == id)?;
        worksheet.set_page_states(page_states);
        Some(worksheet.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worksheet(topic: &str) -> WorksheetState {
        WorksheetState::new("Science", topic, "5", format!("1. {topic}"))
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repo = InMemoryWorksheetRepository::new();
        repo.insert(worksheet("Plants")).await;
        repo.insert(worksheet("Rocks")).await;
        let topics: Vec<String> = repo.list().await.into_iter().map(|w| w.topic).collect();
        assert_eq!(topics, vec!["Rocks", "Plants"]);
    }

    #[tokio::test]
    async fn test_get_and_set_page_states() {
        let repo = InMemoryWorksheetRepository::new();
        let ws = worksheet("Plants");
        let id = ws.id;
        repo.insert(ws).await;

        let saved = repo
            .set_page_states(id, vec![serde_json::json!({"version": 1})])
            .await
            .unwrap();
        assert_eq!(saved.page_states.len(), 1);
        assert_eq!(repo.get(id).await.unwrap().page_states.len(), 1);
    }

    #[tokio::test]
    async fn test_append_keeps_states_saved_after_read() {
        let repo = InMemoryWorksheetRepository::new();
        let ws = worksheet("Plants");
        let id = ws.id;
        repo.insert(ws).await;

        // A regenerate reads the worksheet, then a save lands before the append.
        let read_before_save = repo.get(id).await.unwrap();
        repo.set_page_states(id, vec![serde_json::json!({"version": 1})])
            .await
            .unwrap();
        let appended = repo.append_content(id, "2. Roots").await.unwrap();

        assert!(read_before_save.page_states.is_empty());
        assert_eq!(appended.page_states.len(), 1);
        assert_eq!(appended.generated_content, "1. Plants\n2. Roots");
        assert_eq!(repo.get(id).await.unwrap(), appended);
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        let repo = InMemoryWorksheetRepository::new();
        assert!(repo.append_content(Uuid::new_v4(), "x").await.is_none());
        assert!(repo.set_page_states(Uuid::new_v4(), Vec::new()).await.is_none());
        assert!(repo.get(Uuid::new_v4()).await.is_none());
    }
}
