//! Cursor-driven auto-layout of parsed content items onto fixed-size pages.
//!
//! # Algorithm
//! One pass over the items with a `(page_index, top)` cursor:
//! 1. Measure the item's heading text at content width (no object is created).
//! 2. `required` = text height + answer box (text items) or rows (grouped items) + spacing.
//! 3. If `top + required` passes the bottom margin and a next page exists, move to the
//!    next page's top margin. An item that still does not fit (last page, or taller
//!    than a whole page) is placed anyway and flagged.
//! 4. Create the objects on the target page and advance the cursor.
//!
//! The pass never fails and never adds pages; callers that want room grow `pages` first.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::content::ContentItem;
use crate::layout::font_metrics::FontFamily;
use crate::layout::placement::{build_question_group, GroupGeometry};
use crate::surface::{DrawingSurface, ObjectId, Point, Primitive, Stroke, TextStyle};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Page geometry and spacing used by auto-layout. All values in canvas units (px).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Gap after every item.
    pub spacing: f32,
    /// Gap between a grouped item's question and its first row.
    pub question_gap: f32,
    pub choice_row_height: f32,
    pub choice_indent: f32,
    pub short_answer_height: f32,
    /// Used when the text mentions "long answer".
    pub long_answer_height: f32,
    pub font: FontFamily,
    pub font_size: f32,
}

/// 800×1100 canvas page with 50px margins.
pub fn default_layout_config() -> LayoutConfig {
    LayoutConfig {
        page_width: 800.0,
        page_height: 1100.0,
        margin_top: 50.0,
        margin_bottom: 50.0,
        margin_left: 50.0,
        margin_right: 50.0,
        spacing: 20.0,
        question_gap: 10.0,
        choice_row_height: 30.0,
        choice_indent: 20.0,
        short_answer_height: 60.0,
        long_answer_height: 150.0,
        font: FontFamily::Arial,
        font_size: 14.0,
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        default_layout_config()
    }
}

impl LayoutConfig {
    pub fn content_width(&self) -> f32 {
        (self.page_width - self.margin_left - self.margin_right).max(0.0)
    }

    /// Lowest y an item may reach without encroaching on the bottom margin.
    pub fn content_bottom(&self) -> f32 {
        self.page_height - self.margin_bottom
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font: self.font,
            ..TextStyle::sized(self.font_size)
        }
    }

    /// Two-tier answer box sizing.
    pub fn answer_box_height(&self, text: &str) -> f32 {
        if text.to_lowercase().contains("long answer") {
            self.long_answer_height
        } else {
            self.short_answer_height
        }
    }

    pub(crate) fn group_geometry(&self, width: f32, split: bool) -> GroupGeometry {
        GroupGeometry {
            width,
            indent: self.choice_indent,
            question_gap: self.question_gap,
            row_height: self.choice_row_height,
            split,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor and report
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutCursor {
    pub page_index: usize,
    pub top: f32,
}

impl LayoutCursor {
    pub fn start(config: &LayoutConfig) -> Self {
        Self {
            page_index: 0,
            top: config.margin_top,
        }
    }
}

/// Where one item ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub item_index: usize,
    pub page_index: usize,
    pub top: f32,
    /// Height consumed on the page, excluding trailing spacing.
    pub height: f32,
    /// True when the item runs past the bottom margin of the page it was placed on.
    pub overflowed: bool,
    pub objects: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub placements: Vec<Placement>,
    /// Cursor after the last item; pass it back in to continue laying out.
    pub cursor: LayoutCursor,
}

impl LayoutReport {
    /// Distinct page indices that received objects, ascending.
    pub fn touched_pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.placements.iter().map(|p| p.page_index).collect();
        pages.dedup();
        pages
    }

    pub fn overflow_count(&self) -> usize {
        self.placements.iter().filter(|p| p.overflowed).count()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Auto-layout
// ────────────────────────────────────────────────────────────────────────────

/// Lays `items` out on `pages` starting at `start`, mutating the pages in place.
pub fn auto_layout<S: DrawingSurface>(
    items: &[ContentItem],
    pages: &mut [S],
    start: LayoutCursor,
    config: &LayoutConfig,
) -> LayoutReport {
    let mut report = LayoutReport {
        placements: Vec::with_capacity(items.len()),
        cursor: start,
    };
    if pages.is_empty() {
        if !items.is_empty() {
            warn!(items = items.len(), "Auto-layout called with no pages; nothing placed");
        }
        return report;
    }

    let last_page = pages.len() - 1;
    let mut cursor = LayoutCursor {
        page_index: start.page_index.min(last_page),
        top: start.top,
    };
    let style = config.text_style();
    let width = config.content_width();

    for (item_index, item) in items.iter().enumerate() {
        let heading = item.heading();
        let text_height = pages[cursor.page_index]
            .measure_text(heading, &style, width)
            .height;
        let body_height = match item {
            ContentItem::Text { content } => config.answer_box_height(content),
            _ => config.question_gap + item.row_count() as f32 * config.choice_row_height,
        };
        let required = text_height + body_height + config.spacing;

        let bottom = config.content_bottom();
        if cursor.top + required > bottom && cursor.page_index < last_page {
            cursor.page_index += 1;
            cursor.top = config.margin_top;
            debug!(item_index, page_index = cursor.page_index, "Advanced to next page");
        }
        let overflowed = cursor.top + required > bottom;
        if overflowed {
            warn!(
                item_index,
                page_index = cursor.page_index,
                top = cursor.top,
                required,
                "Item runs past the bottom margin; placing it anyway"
            );
        }

        let page = &mut pages[cursor.page_index];
        let origin = Point::new(config.margin_left, cursor.top);
        let objects = match item {
            ContentItem::Text { content } => {
                let text_id = page.create_text(content, style.clone(), width, origin);
                page.add(text_id);
                let box_id = page.create_shape(
                    Primitive::Rect {
                        width,
                        height: body_height,
                        stroke: Stroke::default(),
                        fill: None,
                    },
                    Point::new(origin.x, origin.y + text_height),
                );
                page.add(box_id);
                vec![text_id, box_id]
            }
            ContentItem::MultipleChoice { .. } | ContentItem::Matching { .. } => {
                let split = matches!(item, ContentItem::Matching { .. });
                let geometry = config.group_geometry(width, split);
                let group_id = build_question_group(page, item, &style, &geometry, origin);
                page.add(group_id);
                vec![group_id]
            }
        };

        let height = text_height + body_height;
        report.placements.push(Placement {
            item_index,
            page_index: cursor.page_index,
            top: cursor.top,
            height,
            overflowed,
            objects,
        });
        cursor.top += height + config.spacing;
    }

    report.cursor = cursor;
    report
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
