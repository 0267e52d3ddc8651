use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::editor::session::EditorSession;
use crate::errors::AppError;

/// Open editor sessions, keyed by session id.
///
/// Sessions are process-local and never persisted; saving writes page states back to the
/// worksheet repository instead.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, EditorSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: EditorSession) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.lock().await.insert(id, session);
        id
    }

    /// Runs `f` against the session while holding the store lock.
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut EditorSession) -> T,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Editor session {id} not found")))?;
        Ok(f(session))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }
}
