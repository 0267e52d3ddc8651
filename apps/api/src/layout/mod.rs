// Layout Engine
// Cursor-driven auto-layout with page advance, manual placement, and shape generators.
// Pure over its inputs: never fails, never adds pages. Overflow on the last page is
// placed anyway and reported.

pub mod engine;
pub mod font_metrics;
pub mod placement;
pub mod shapes;

pub use engine::{auto_layout, default_layout_config, LayoutConfig, LayoutCursor, LayoutReport};
pub use placement::{append_text, place_item_at, place_text_at};
pub use shapes::{place_section, place_shape, SectionKind, ShapeKind};
