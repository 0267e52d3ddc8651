//! Fixed-geometry shape generators and section headers.
//!
//! Generators are pure: each returns the parts of a shape relative to its origin.
//! `place_shape` turns the parts into surface objects (a group when there is more than one).

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{get_metrics, FontFamily, LINE_HEIGHT};
use crate::surface::{DrawingSurface, ObjectId, Point, Primitive, Stroke, TextStyle};

pub const DEFAULT_ORIGIN: Point = Point::new(50.0, 50.0);

const GRID_SIZE: f32 = 400.0;
const GRID_CELL: f32 = 20.0;
const GRID_COLOR: &str = "#ccc";

const NUMBER_LINE_LENGTH: f32 = 400.0;
const NUMBER_LINE_TICK_SPACING: f32 = 40.0;
const NUMBER_LINE_TICK: f32 = 5.0;
const NUMBER_LINE_LABEL_SIZE: f32 = 12.0;

const ANSWER_LINE_COUNT: usize = 4;
const ANSWER_LINE_WIDTH: f32 = 300.0;
const ANSWER_LINE_SPACING: f32 = 30.0;

const STAR_POINTS: usize = 5;
const STAR_OUTER: f32 = 50.0;
const STAR_INNER: f32 = 25.0;

const SECTION_FONT_SIZE: f32 = 18.0;
const SECTION_BACKGROUND: &str = "#f5f5f5";
const SECTION_ORIGIN: Point = Point::new(50.0, 20.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    AnswerBox,
    Grid,
    NumberLine,
    Circle,
    AnswerLines,
    NameDate,
    Star,
}

impl ShapeKind {
    #[cfg(test)]
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::AnswerBox,
        ShapeKind::Grid,
        ShapeKind::NumberLine,
        ShapeKind::Circle,
        ShapeKind::AnswerLines,
        ShapeKind::NameDate,
        ShapeKind::Star,
    ];

    pub fn parts(self) -> Vec<ShapePart> {
        match self {
            ShapeKind::AnswerBox => answer_box(),
            ShapeKind::Grid => grid(),
            ShapeKind::NumberLine => number_line(),
            ShapeKind::Circle => circle(),
            ShapeKind::AnswerLines => answer_lines(),
            ShapeKind::NameDate => name_date(),
            ShapeKind::Star => star(),
        }
    }
}

/// One piece of a generated shape, positioned relative to the shape origin.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapePart {
    Primitive {
        at: Point,
        primitive: Primitive,
    },
    Label {
        at: Point,
        text: String,
        width: f32,
        style: TextStyle,
    },
}

fn outline(primitive: Primitive) -> ShapePart {
    ShapePart::Primitive {
        at: Point::default(),
        primitive,
    }
}

fn label(text: &str, at: Point, font_size: f32) -> ShapePart {
    let style = TextStyle::sized(font_size);
    let width = get_metrics(&style.font).measure_str(text) * font_size;
    ShapePart::Label {
        at,
        text: text.to_string(),
        width: width.ceil(),
        style,
    }
}

fn line(from: Point, to: Point, stroke: Stroke) -> ShapePart {
    outline(Primitive::Line { from, to, stroke })
}

// ────────────────────────────────────────────────────────────────────────────
// Generators
// ────────────────────────────────────────────────────────────────────────────

fn answer_box() -> Vec<ShapePart> {
    vec![outline(Primitive::Rect {
        width: 200.0,
        height: 50.0,
        stroke: Stroke::default(),
        fill: None,
    })]
}

fn grid() -> Vec<ShapePart> {
    let cells = (GRID_SIZE / GRID_CELL).ceil() as usize;
    let stroke = Stroke::solid(GRID_COLOR, 1.0);
    let mut parts = Vec::with_capacity((cells + 1) * 2);
    for i in 0..=cells {
        let y = i as f32 * GRID_CELL;
        parts.push(line(Point::new(0.0, y), Point::new(GRID_SIZE, y), stroke.clone()));
    }
    for i in 0..=cells {
        let x = i as f32 * GRID_CELL;
        parts.push(line(Point::new(x, 0.0), Point::new(x, GRID_SIZE), stroke.clone()));
    }
    parts
}

/// Main line with labelled ticks. Shifted so no coordinate is negative.
fn number_line() -> Vec<ShapePart> {
    let ticks = (NUMBER_LINE_LENGTH / NUMBER_LINE_TICK_SPACING).ceil() as usize;
    let (dx, axis_y) = (5.0, NUMBER_LINE_TICK);
    let mut parts = vec![line(
        Point::new(dx, axis_y),
        Point::new(dx + NUMBER_LINE_LENGTH, axis_y),
        Stroke::default(),
    )];
    for i in 0..=ticks {
        let x = dx + i as f32 * NUMBER_LINE_TICK_SPACING;
        parts.push(line(
            Point::new(x, axis_y - NUMBER_LINE_TICK),
            Point::new(x, axis_y + NUMBER_LINE_TICK),
            Stroke::default(),
        ));
        parts.push(label(
            &i.to_string(),
            Point::new(x - 5.0, axis_y + 10.0),
            NUMBER_LINE_LABEL_SIZE,
        ));
    }
    parts
}

fn circle() -> Vec<ShapePart> {
    vec![outline(Primitive::Circle {
        radius: 50.0,
        stroke: Stroke::default(),
    })]
}

fn answer_lines() -> Vec<ShapePart> {
    (0..ANSWER_LINE_COUNT)
        .map(|i| {
            let y = i as f32 * ANSWER_LINE_SPACING;
            line(
                Point::new(0.0, y),
                Point::new(ANSWER_LINE_WIDTH, y),
                Stroke::default(),
            )
        })
        .collect()
}

fn name_date() -> Vec<ShapePart> {
    let metrics = get_metrics(&FontFamily::Arial);
    let size = 14.0;
    let name_w = metrics.measure_str("Name:") * size;
    let date_w = metrics.measure_str("Date:") * size;
    let baseline = size * LINE_HEIGHT - 5.0;
    vec![
        label("Name:", Point::default(), size),
        line(
            Point::new(name_w + 10.0, baseline),
            Point::new(name_w + 300.0, baseline),
            Stroke::default(),
        ),
        label("Date:", Point::new(name_w + 330.0, 0.0), size),
        line(
            Point::new(name_w + date_w + 340.0, baseline),
            Point::new(name_w + date_w + 550.0, baseline),
            Stroke::default(),
        ),
    ]
}

/// Alternating outer/inner vertices, translated into the positive quadrant.
fn star() -> Vec<ShapePart> {
    let points = (0..STAR_POINTS * 2)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::PI / STAR_POINTS as f32;
            let radius = if i % 2 == 0 { STAR_OUTER } else { STAR_INNER };
            Point::new(
                STAR_OUTER + angle.cos() * radius,
                STAR_OUTER + angle.sin() * radius,
            )
        })
        .collect();
    vec![outline(Primitive::Polygon {
        points,
        stroke: Stroke::default(),
    })]
}

// ────────────────────────────────────────────────────────────────────────────
// Placement
// ────────────────────────────────────────────────────────────────────────────

/// Adds a shape at `at` (default origin when `None`) and returns its top-level id.
pub fn place_shape<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    kind: ShapeKind,
    at: Option<Point>,
) -> ObjectId {
    let origin = at.unwrap_or(DEFAULT_ORIGIN);
    let mut parts = kind.parts();

    let id = if parts.len() == 1 {
        match parts.remove(0) {
            ShapePart::Primitive { at, primitive } => {
                surface.create_shape(primitive, origin.offset(at))
            }
            ShapePart::Label {
                at,
                text,
                width,
                style,
            } => surface.create_text(&text, style, width, origin.offset(at)),
        }
    } else {
        let children: Vec<ObjectId> = parts
            .into_iter()
            .map(|part| match part {
                ShapePart::Primitive { at, primitive } => surface.create_shape(primitive, at),
                ShapePart::Label {
                    at,
                    text,
                    width,
                    style,
                } => surface.create_text(&text, style, width, at),
            })
            .collect();
        surface.group(&children, origin)
    };
    surface.add(id);
    id
}

/// Template text blocks: worksheet section titles and page headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    LearningObjectives,
    WarmUpQuestions,
    MainExercises,
    ChallengeQuestion,
    ClassicHeader,
    ModernHeader,
}

impl SectionKind {
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::LearningObjectives => "Learning Objectives:",
            SectionKind::WarmUpQuestions => "Warm-Up Questions:",
            SectionKind::MainExercises => "Main Exercises:",
            SectionKind::ChallengeQuestion => "Challenge Question:",
            SectionKind::ClassicHeader => "Classic Header",
            SectionKind::ModernHeader => "Modern Header",
        }
    }
}

pub fn section_style() -> TextStyle {
    TextStyle {
        bold: true,
        background: Some(SECTION_BACKGROUND.to_string()),
        ..TextStyle::sized(SECTION_FONT_SIZE)
    }
}

/// Adds a bold section title spanning the page width minus 100px.
pub fn place_section<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    kind: SectionKind,
    at: Option<Point>,
) -> ObjectId {
    let width = (surface.size().width - 100.0).max(0.0);
    let id = surface.create_text(
        kind.title(),
        section_style(),
        width,
        at.unwrap_or(SECTION_ORIGIN),
    );
    surface.add(id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::object::ObjectKind;
    use crate::surface::{Canvas, Size};

    fn min_coord(parts: &[ShapePart]) -> f32 {
        parts
            .iter()
            .flat_map(|p| match p {
                ShapePart::Label { at, .. } => vec![at.x, at.y],
                ShapePart::Primitive { at, primitive } => {
                    let mut coords = vec![at.x, at.y];
                    match primitive {
                        Primitive::Line { from, to, .. } => {
                            coords.extend([from.x, from.y, to.x, to.y])
                        }
                        Primitive::Polygon { points, .. } => {
                            coords.extend(points.iter().flat_map(|p| [p.x, p.y]))
                        }
                        _ => {}
                    }
                    coords
                }
            })
            .fold(f32::MAX, f32::min)
    }

    #[test]
    fn test_every_shape_has_non_negative_geometry() {
        for kind in ShapeKind::ALL {
            let parts = kind.parts();
            assert!(!parts.is_empty(), "{kind:?}");
            assert!(min_coord(&parts) >= -1e-3, "{kind:?} has negative coordinates");
        }
    }

    #[test]
    fn test_grid_has_21_lines_each_way() {
        assert_eq!(ShapeKind::Grid.parts().len(), 42);
    }

    #[test]
    fn test_number_line_labels_zero_to_ten() {
        let labels: Vec<String> = ShapeKind::NumberLine
            .parts()
            .into_iter()
            .filter_map(|p| match p {
                ShapePart::Label { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        let expected: Vec<String> = (0..=10).map(|i| i.to_string()).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_star_has_ten_vertices() {
        match &ShapeKind::Star.parts()[0] {
            ShapePart::Primitive {
                primitive: Primitive::Polygon { points, .. },
                ..
            } => assert_eq!(points.len(), 10),
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn test_single_part_shape_is_not_grouped() {
        let mut page = Canvas::new(800.0, 1100.0);
        let id = place_shape(&mut page, ShapeKind::AnswerBox, None);
        let obj = page.object(id).unwrap();
        assert!(matches!(obj.kind, ObjectKind::Shape(_)));
        assert_eq!(obj.position, DEFAULT_ORIGIN);
        assert_eq!(page.measure(id), Some(Size::new(200.0, 50.0)));
    }

    #[test]
    fn test_multi_part_shape_is_one_group() {
        let mut page = Canvas::new(800.0, 1100.0);
        let id = place_shape(&mut page, ShapeKind::AnswerLines, Some(Point::new(10.0, 20.0)));
        assert_eq!(page.object_count(), 1);
        let obj = page.object(id).unwrap();
        assert_eq!(obj.position, Point::new(10.0, 20.0));
        let ObjectKind::Group { children } = &obj.kind else {
            panic!("expected group");
        };
        assert_eq!(children.len(), 4);
        assert_eq!(page.measure(id).unwrap().width, 300.0);
    }

    #[test]
    fn test_section_header_style() {
        let mut page = Canvas::new(800.0, 1100.0);
        let id = place_section(&mut page, SectionKind::MainExercises, None);
        let obj = page.object(id).unwrap();
        assert_eq!(obj.position, Point::new(50.0, 20.0));
        match &obj.kind {
            ObjectKind::Text { text, width, style } => {
                assert_eq!(text, "Main Exercises:");
                assert_eq!(*width, 700.0);
                assert!(style.bold);
                assert_eq!(style.font_size, 18.0);
                assert_eq!(style.background.as_deref(), Some("#f5f5f5"));
            }
            other => panic!("expected text, got {other:?}"),
        }
    }
}
