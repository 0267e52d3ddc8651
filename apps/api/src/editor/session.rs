//! One open worksheet: its pages, the active page, and a history per page.
//!
//! Every mutating operation ends with an explicit checkpoint of the page(s) it touched.
//! Manual operations always target the active page.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::content::{parse_content, ContentItem};
use crate::history::HistoryManager;
use crate::layout::{
    append_text, auto_layout, place_item_at, place_section, place_shape, place_text_at,
    LayoutConfig, LayoutCursor, LayoutReport, SectionKind, ShapeKind,
};
use crate::models::WorksheetState;
use crate::surface::{Canvas, DrawingSurface, ObjectId, Point, Size, SurfaceError};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Page {index} does not exist (session has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("Content item {index} does not exist (worksheet has {count} items)")]
    ItemOutOfRange { index: usize, count: usize },

    #[error("Object {0} is not on the active page")]
    UnknownObject(u64),

    #[error("Saved state for page {page} is invalid: {source}")]
    InvalidPageState {
        page: usize,
        #[source]
        source: SurfaceError,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub worksheet_id: Uuid,
    pub title: String,
    pub item_count: usize,
    pub page_count: usize,
    pub active_page: usize,
    /// Top-level object count per page.
    pub objects_per_page: Vec<usize>,
    pub selection: Vec<ObjectId>,
    pub cursor: LayoutCursor,
    /// Active page only.
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub struct EditorSession<S: DrawingSurface = Canvas> {
    worksheet_id: Uuid,
    title: String,
    items: Vec<ContentItem>,
    pages: Vec<S>,
    histories: Vec<HistoryManager>,
    active: usize,
    cursor: LayoutCursor,
    config: LayoutConfig,
}

impl<S: DrawingSurface> EditorSession<S> {
    /// Opens `worksheet`, restoring its saved pages or pre-allocating `initial_pages` blank ones.
    pub fn open(
        worksheet: &WorksheetState,
        initial_pages: usize,
        config: LayoutConfig,
    ) -> Result<Self, EditorError> {
        let size = Size::new(config.page_width, config.page_height);
        let pages: Vec<S> = if worksheet.page_states.is_empty() {
            (0..initial_pages.max(1)).map(|_| S::blank(size)).collect()
        } else {
            worksheet
                .page_states
                .iter()
                .enumerate()
                .map(|(page, state)| {
                    let mut surface = S::blank(size);
                    surface
                        .load_from_serializable(state)
                        .map_err(|source| EditorError::InvalidPageState { page, source })?;
                    Ok(surface)
                })
                .collect::<Result<_, EditorError>>()?
        };

        let mut session = Self {
            worksheet_id: worksheet.id,
            title: worksheet.title.clone(),
            items: parse_content(&worksheet.generated_content),
            histories: pages.iter().map(HistoryManager::new).collect(),
            pages,
            active: 0,
            cursor: LayoutCursor::start(&config),
            config,
        };
        session.cursor = session.cursor_after_content();
        for (index, page) in session.pages.iter_mut().enumerate() {
            page.set_interactive(index == 0);
        }
        info!(
            worksheet_id = %session.worksheet_id,
            pages = session.pages.len(),
            items = session.items.len(),
            "Editor session opened"
        );
        Ok(session)
    }

    pub fn worksheet_id(&self) -> Uuid {
        self.worksheet_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[S] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Result<&S, EditorError> {
        self.pages.get(index).ok_or(EditorError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.config
    }

    fn active_page(&mut self) -> &mut S {
        &mut self.pages[self.active]
    }

    fn checkpoint(&mut self, index: usize) {
        if let (Some(history), Some(page)) = (self.histories.get_mut(index), self.pages.get(index)) {
            history.checkpoint(page);
        }
    }

    /// Cursor just below the lowest object on the last page that has any.
    fn cursor_after_content(&self) -> LayoutCursor {
        let content = self.pages.iter().enumerate().rev().find_map(|(page_index, page)| {
            page.objects()
                .iter()
                .filter_map(|id| {
                    let object = page.object(*id)?;
                    Some(object.position.y + page.measure(*id)?.height)
                })
                .reduce(f32::max)
                .map(|bottom| (page_index, bottom))
        });
        match content {
            Some((page_index, bottom)) => LayoutCursor {
                page_index,
                top: (bottom + self.config.spacing).max(self.config.margin_top),
            },
            None => LayoutCursor::start(&self.config),
        }
    }

    /// Selects the newly placed object and checkpoints the active page.
    fn finish_placement(&mut self, id: ObjectId) -> ObjectId {
        self.active_page().select(&[id]);
        self.checkpoint(self.active);
        id
    }

    // ── Layout ───────────────────────────────────────────────────────────────

    /// Lays every parsed item out from `start` (or where the last pass stopped).
    pub fn auto_layout(&mut self, start: Option<LayoutCursor>) -> LayoutReport {
        let start = start.unwrap_or(self.cursor);
        let report = auto_layout(&self.items, &mut self.pages, start, &self.config);
        self.cursor = report.cursor;
        for index in report.touched_pages() {
            self.checkpoint(index);
        }
        report
    }

    pub fn place_item(&mut self, index: usize, at: Point) -> Result<ObjectId, EditorError> {
        let item = self
            .items
            .get(index)
            .cloned()
            .ok_or(EditorError::ItemOutOfRange {
                index,
                count: self.items.len(),
            })?;
        let config = self.config.clone();
        let id = place_item_at(self.active_page(), &item, at, &config);
        Ok(self.finish_placement(id))
    }

    pub fn add_text(&mut self, text: &str, at: Point) -> ObjectId {
        let config = self.config.clone();
        let id = place_text_at(self.active_page(), text, at, &config);
        self.finish_placement(id)
    }

    pub fn append_text(&mut self, text: &str) -> ObjectId {
        let config = self.config.clone();
        let id = append_text(self.active_page(), text, &config);
        self.finish_placement(id)
    }

    pub fn add_shape(&mut self, kind: ShapeKind, at: Option<Point>) -> ObjectId {
        let id = place_shape(self.active_page(), kind, at);
        self.finish_placement(id)
    }

    pub fn add_section(&mut self, kind: SectionKind, at: Option<Point>) -> ObjectId {
        let id = place_section(self.active_page(), kind, at);
        self.finish_placement(id)
    }

    pub fn move_object(&mut self, id: ObjectId, at: Point) -> Result<(), EditorError> {
        let page = self.active_page();
        if !page.objects().contains(&id) {
            return Err(EditorError::UnknownObject(id.0));
        }
        page.move_to(id, at);
        self.checkpoint(self.active);
        Ok(())
    }

    // ── Selection ────────────────────────────────────────────────────────────

    pub fn select(&mut self, ids: &[ObjectId]) {
        self.active_page().select(ids);
    }

    pub fn select_all(&mut self) {
        let page = self.active_page();
        let all = page.objects().to_vec();
        page.select(&all);
    }

    pub fn deselect(&mut self) {
        self.active_page().discard_selection();
    }

    /// Removes every selected object from the active page. Returns how many were removed.
    pub fn delete_selection(&mut self) -> usize {
        let page = self.active_page();
        let selected = page.selection().to_vec();
        let removed = selected.into_iter().filter(|id| page.remove(*id)).count();
        page.discard_selection();
        if removed > 0 {
            self.checkpoint(self.active);
        }
        removed
    }

    // ── Pages ────────────────────────────────────────────────────────────────

    /// Appends a blank, inactive page and returns its index.
    pub fn add_page(&mut self) -> usize {
        let mut page = S::blank(Size::new(self.config.page_width, self.config.page_height));
        page.set_interactive(false);
        self.histories.push(HistoryManager::new(&page));
        self.pages.push(page);
        debug!(page_count = self.pages.len(), "Page added");
        self.pages.len() - 1
    }

    /// Makes `index` the active page. The old page is deselected and made inert first.
    pub fn switch_page(&mut self, index: usize) -> Result<(), EditorError> {
        if index >= self.pages.len() {
            return Err(EditorError::PageOutOfRange {
                index,
                count: self.pages.len(),
            });
        }
        let previous = self.active_page();
        previous.discard_selection();
        previous.set_interactive(false);

        self.active = index;
        self.active_page().set_interactive(true);
        debug!(active_page = index, "Switched active page");
        Ok(())
    }

    // ── History ──────────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let active = self.active;
        let undone = self.histories[active].undo(&mut self.pages[active]);
        if undone {
            self.cursor = self.cursor_after_content();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let active = self.active;
        let redone = self.histories[active].redo(&mut self.pages[active]);
        if redone {
            self.cursor = self.cursor_after_content();
        }
        redone
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    pub fn page_states(&self) -> Vec<Value> {
        self.pages.iter().map(|p| p.to_serializable()).collect()
    }

    pub fn summary(&self) -> SessionSummary {
        let history = &self.histories[self.active];
        SessionSummary {
            worksheet_id: self.worksheet_id,
            title: self.title.clone(),
            item_count: self.items.len(),
            page_count: self.pages.len(),
            active_page: self.active,
            objects_per_page: self.pages.iter().map(|p| p.objects().len()).collect(),
            selection: self.pages[self.active].selection().to_vec(),
            cursor: self.cursor,
            undo_depth: history.undo_depth(),
            redo_depth: history.redo_depth(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::default_layout_config;

    const CONTENT: &str = "\
1. Warm-up: What is a plant?
2. Multiple Choice
Which part absorbs water?
a. Roots
b. Leaves
3. Matching
a. Stem
b. Leaf
AA. Makes food
BB. Holds the plant up
4. Long Answer
Describe photosynthesis.";

    fn worksheet() -> WorksheetState {
        WorksheetState::new("Science", "Plants", "4", CONTENT.to_string())
    }

    fn open() -> EditorSession {
        EditorSession::open(&worksheet(), 2, default_layout_config()).unwrap()
    }

    #[test]
    fn test_open_preallocates_pages_with_only_first_active() {
        let session = open();
        assert_eq!(session.pages().len(), 2);
        assert!(session.pages()[0].is_interactive());
        assert!(!session.pages()[1].is_interactive());
        assert_eq!(session.summary().item_count, 4);
    }

    #[test]
    fn test_auto_layout_checkpoints_once_and_can_be_undone() {
        let mut session = open();
        let report = session.auto_layout(None);
        assert_eq!(report.placements.len(), 4);
        assert_eq!(session.summary().undo_depth, 1);
        assert!(session.summary().can_undo);
        assert!(session.undo());
        assert!(session.summary().can_redo);
        assert!(!session.summary().can_undo);
        assert_eq!(session.pages()[0].objects().len(), 0);
        assert!(session.redo());
        assert!(!session.pages()[0].objects().is_empty());
    }

    #[test]
    fn test_second_layout_continues_from_cursor() {
        let mut session = open();
        let first = session.auto_layout(None);
        let second = session.auto_layout(None);
        assert!(second.placements[0].top >= first.cursor.top || second.placements[0].page_index > 0);
    }

    #[test]
    fn test_manual_operations_target_active_page() {
        let mut session = open();
        session.switch_page(1).unwrap();
        let id = session.place_item(1, Point::new(10.0, 20.0)).unwrap();
        assert_eq!(session.pages()[0].objects().len(), 0);
        assert_eq!(session.pages()[1].objects(), &[id]);
        assert_eq!(session.summary().selection, vec![id]);
    }

    #[test]
    fn test_place_unknown_item_fails() {
        let mut session = open();
        assert!(matches!(
            session.place_item(99, Point::default()),
            Err(EditorError::ItemOutOfRange { index: 99, count: 4 })
        ));
    }

    #[test]
    fn test_switch_page_deselects_and_disables_previous() {
        let mut session = open();
        session.add_shape(ShapeKind::Circle, None);
        session.select_all();
        assert_eq!(session.summary().selection.len(), 1);

        session.switch_page(1).unwrap();
        assert!(session.pages()[0].selection().is_empty());
        assert!(!session.pages()[0].is_interactive());
        assert!(session.pages()[1].is_interactive());
        assert!(session.switch_page(5).is_err());
    }

    #[test]
    fn test_delete_selection_is_undoable() {
        let mut session = open();
        session.add_text("note", Point::new(100.0, 100.0));
        session.add_shape(ShapeKind::Grid, None);
        session.select_all();
        assert_eq!(session.delete_selection(), 2);
        assert!(session.pages()[0].objects().is_empty());
        session.undo();
        assert_eq!(session.pages()[0].objects().len(), 2);
    }

    #[test]
    fn test_move_object_checks_active_page() {
        let mut session = open();
        let id = session.add_section(SectionKind::WarmUpQuestions, None);
        session.move_object(id, Point::new(70.0, 90.0)).unwrap();
        let moved = session.pages()[0].object(session.pages()[0].objects()[0]).unwrap();
        assert_eq!(moved.position, Point::new(70.0, 90.0));

        session.switch_page(1).unwrap();
        assert!(matches!(
            session.move_object(id, Point::default()),
            Err(EditorError::UnknownObject(_))
        ));
    }

    #[test]
    fn test_histories_are_per_page() {
        let mut session = open();
        session.add_text("page zero", Point::new(10.0, 10.0));
        session.switch_page(1).unwrap();
        assert!(!session.undo(), "page 1 has nothing to undo");
        session.switch_page(0).unwrap();
        assert!(session.undo());
    }

    #[test]
    fn test_page_states_round_trip_through_open() {
        let mut session = open();
        session.auto_layout(None);
        session.add_shape(ShapeKind::Star, Some(Point::new(600.0, 900.0)));
        let states = session.page_states();

        let mut saved = worksheet();
        saved.set_page_states(states.clone());
        let reopened: EditorSession = EditorSession::open(&saved, 5, default_layout_config()).unwrap();
        assert_eq!(reopened.pages().len(), 2);
        assert_eq!(reopened.page_states(), states);
    }

    #[test]
    fn test_invalid_saved_state_is_rejected() {
        let mut saved = worksheet();
        saved.set_page_states(vec![serde_json::json!({"version": 99, "width": 1.0, "height": 1.0, "objects": []})]);
        let result: Result<EditorSession, _> = EditorSession::open(&saved, 2, default_layout_config());
        assert!(matches!(
            result,
            Err(EditorError::InvalidPageState { page: 0, .. })
        ));
    }

    #[test]
    fn test_add_page_is_inactive() {
        let mut session = open();
        let index = session.add_page();
        assert_eq!(index, 2);
        assert!(!session.pages()[2].is_interactive());
        assert_eq!(session.summary().page_count, 3);
    }

    #[test]
    fn test_append_text_stacks_on_active_page() {
        let mut session = open();
        let first = session.append_text("first");
        let second = session.append_text("second");
        let page = &session.pages()[0];
        assert!(page.object(second).unwrap().position.y > page.object(first).unwrap().position.y);
    }

    #[test]
    fn test_layout_after_undo_starts_from_remaining_content() {
        let mut session = open();
        let config = default_layout_config();
        session.auto_layout(None);
        assert!(session.undo());
        assert_eq!(session.summary().cursor, LayoutCursor::start(&config));

        let report = session.auto_layout(None);
        assert_eq!(report.placements[0].page_index, 0);
        assert_eq!(report.placements[0].top, config.margin_top);
    }

    #[test]
    fn test_reopened_session_lays_out_below_saved_content() {
        let mut session = open();
        let report = session.auto_layout(None);
        let last = report.placements.last().unwrap().clone();

        let mut saved = worksheet();
        saved.set_page_states(session.page_states());
        let mut reopened: EditorSession = EditorSession::open(&saved, 2, default_layout_config()).unwrap();
        let cursor = reopened.summary().cursor;
        assert_eq!(cursor.page_index, last.page_index);
        assert!(cursor.top >= last.top + last.height, "cursor {cursor:?} overlaps {last:?}");

        let next = reopened.auto_layout(None);
        let first = &next.placements[0];
        assert!(first.page_index > last.page_index || first.top >= last.top + last.height);
    }
}
