//! Question groups and manual placement.
//!
//! Manual placement skips the cursor entirely: objects land at the requested point on
//! whichever surface the caller passes (the active page), with no overflow check.

use tracing::warn;

use crate::content::ContentItem;
use crate::layout::engine::LayoutConfig;
use crate::surface::{DrawingSurface, ObjectId, Point, TextStyle};

/// Width of a dropped text box.
pub const MANUAL_TEXT_WIDTH: f32 = 300.0;
/// Width of a dropped multiple-choice group; matching groups get twice this.
pub const MANUAL_GROUP_WIDTH: f32 = 300.0;

pub const APPEND_GAP: f32 = 20.0;
pub const APPEND_LEFT: f32 = 20.0;
pub const APPEND_FONT_SIZE: f32 = 16.0;

/// Child layout inside a question group, relative to the group origin.
#[derive(Debug, Clone, Copy)]
pub struct GroupGeometry {
    pub width: f32,
    pub indent: f32,
    pub question_gap: f32,
    pub row_height: f32,
    /// Choices take the left half and answers the right half.
    pub split: bool,
}

/// Builds a detached group: question on top, one row per choice/answer index below it.
pub fn build_question_group<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    item: &ContentItem,
    style: &TextStyle,
    geometry: &GroupGeometry,
    at: Point,
) -> ObjectId {
    let question = item.heading();
    let question_height = surface.measure_text(question, style, geometry.width).height;
    let question_id =
        surface.create_text(question, style.clone(), geometry.width, Point::new(0.0, 0.0));

    let half = geometry.width / 2.0;
    let choice_width = if geometry.split {
        half - geometry.indent
    } else {
        geometry.width - geometry.indent
    }
    .max(0.0);
    let row_top =
        |i: usize| question_height + geometry.question_gap + i as f32 * geometry.row_height;

    let mut children = vec![question_id];
    for (i, choice) in item.choices().iter().enumerate() {
        children.push(surface.create_text(
            choice,
            style.clone(),
            choice_width,
            Point::new(geometry.indent, row_top(i)),
        ));
    }
    for (i, answer) in item.answers().iter().enumerate() {
        children.push(surface.create_text(
            answer,
            style.clone(),
            half,
            Point::new(half, row_top(i)),
        ));
    }

    surface.group(&children, at)
}

/// Drops item `item` at `at` on the surface and returns the new top-level object.
pub fn place_item_at<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    item: &ContentItem,
    at: Point,
    config: &LayoutConfig,
) -> ObjectId {
    let style = config.text_style();
    let id = match item {
        ContentItem::Text { content } => {
            surface.create_text(content, style, MANUAL_TEXT_WIDTH, at)
        }
        ContentItem::MultipleChoice { .. } => {
            let geometry = config.group_geometry(MANUAL_GROUP_WIDTH, false);
            build_question_group(surface, item, &style, &geometry, at)
        }
        ContentItem::Matching { .. } => {
            let geometry = config.group_geometry(MANUAL_GROUP_WIDTH * 2.0, true);
            build_question_group(surface, item, &style, &geometry, at)
        }
    };
    surface.add(id);
    id
}

/// Free text box at an explicit point.
pub fn place_text_at<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    text: &str,
    at: Point,
    config: &LayoutConfig,
) -> ObjectId {
    let id = surface.create_text(text, config.text_style(), MANUAL_TEXT_WIDTH, at);
    surface.add(id);
    id
}

/// Stacks `text` below the topmost-in-z-order object.
///
/// Falls back to the last object's own top when the box would run off the page.
pub fn append_text<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    text: &str,
    config: &LayoutConfig,
) -> ObjectId {
    let style = TextStyle {
        font: config.font,
        ..TextStyle::sized(APPEND_FONT_SIZE)
    };
    let page = surface.size();
    let width = (page.width - APPEND_LEFT * 2.0).max(0.0);
    let text_height = surface.measure_text(text, &style, width).height;

    let last = surface.objects().last().and_then(|id| {
        let obj = surface.object(*id)?;
        let size = surface.measure(*id)?;
        Some((obj.position.y, size.height))
    });

    let mut top = match last {
        Some((last_top, last_height)) => last_top + last_height + APPEND_GAP,
        None => APPEND_GAP,
    };
    if top + text_height > page.height {
        warn!(top, text_height, "Appended text exceeds page height; stacking on last object");
        top = last.map(|(last_top, _)| last_top).unwrap_or(APPEND_GAP);
    }

    let id = surface.create_text(text, style, width, Point::new(APPEND_LEFT, top));
    surface.add(id);
    id
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
