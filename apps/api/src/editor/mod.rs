// Editor sessions
// One session per open worksheet: pages, the active page, per-page undo/redo history,
// manual placement and export. Sessions live in memory only; saving writes page states
// back to the worksheet.

pub mod handlers;
pub mod session;
pub mod store;

pub use session::EditorError;
pub use store::SessionStore;
