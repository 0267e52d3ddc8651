pub mod worksheet;

pub use worksheet::WorksheetState;
