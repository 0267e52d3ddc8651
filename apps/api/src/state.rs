use std::sync::Arc;

use crate::config::Config;
use crate::editor::SessionStore;
use crate::generation::generator::ContentGenerator;
use crate::layout::LayoutConfig;
use crate::repository::WorksheetRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Worksheet storage. Default: InMemoryWorksheetRepository.
    pub worksheets: Arc<dyn WorksheetRepository>,
    /// Pluggable content generator. Default: LlmContentGenerator.
    pub generator: Arc<dyn ContentGenerator>,
    /// Open editor sessions, keyed by session id.
    pub sessions: SessionStore,
    /// Page geometry and spacing for auto-layout.
    pub layout_config: LayoutConfig,
}
