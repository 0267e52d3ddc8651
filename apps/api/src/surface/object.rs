//! Placed-object model for a page canvas.
//!
//! Objects live in an arena owned by the surface and are addressed by `ObjectId`.
//! Groups refer to their children by id; child positions are relative to the group origin.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f32,
}

impl Stroke {
    pub fn solid(color: &str, width: f32) -> Self {
        Self {
            color: color.to_string(),
            width,
        }
    }
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke::solid("#000000", 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font: FontFamily,
    pub font_size: f32,
    #[serde(default)]
    pub bold: bool,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl TextStyle {
    pub fn sized(font_size: f32) -> Self {
        Self {
            font_size,
            ..Self::default()
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: FontFamily::Arial,
            font_size: 14.0,
            bold: false,
            color: "#000000".to_string(),
            background: None,
        }
    }
}

/// Geometry of a non-text leaf object, relative to the object's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Rect {
        width: f32,
        height: f32,
        stroke: Stroke,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    /// Circle inscribed in the square `[0, 2r] x [0, 2r]`.
    Circle { radius: f32, stroke: Stroke },
    /// Closed outline through `points`.
    Polygon { points: Vec<Point>, stroke: Stroke },
}

impl Primitive {
    /// Extent from the object origin to the far edge of the geometry.
    pub fn extent(&self) -> Size {
        match self {
            Primitive::Rect { width, height, .. } => Size::new(*width, *height),
            Primitive::Line { from, to, .. } => {
                Size::new(from.x.max(to.x).max(0.0), from.y.max(to.y).max(0.0))
            }
            Primitive::Circle { radius, .. } => Size::new(radius * 2.0, radius * 2.0),
            Primitive::Polygon { points, .. } => points.iter().fold(Size::default(), |acc, p| {
                Size::new(acc.width.max(p.x), acc.height.max(p.y))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// Wrapping text box of fixed `width`.
    Text {
        text: String,
        width: f32,
        style: TextStyle,
    },
    Shape(Primitive),
    Group { children: Vec<ObjectId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub position: Point,
    pub kind: ObjectKind,
}

impl PlacedObject {
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Text { .. } => "text",
            ObjectKind::Shape(_) => "shape",
            ObjectKind::Group { .. } => "group",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Serialized form
// ────────────────────────────────────────────────────────────────────────────

/// Id-free tree form of an object, used for page state and history snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SerializedObject {
    Text {
        left: f32,
        top: f32,
        width: f32,
        text: String,
        style: TextStyle,
    },
    Shape {
        left: f32,
        top: f32,
        primitive: Primitive,
    },
    Group {
        left: f32,
        top: f32,
        children: Vec<SerializedObject>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedPage {
    pub version: u32,
    pub width: f32,
    pub height: f32,
    pub objects: Vec<SerializedObject>,
}

pub const PAGE_STATE_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_extent() {
        let line = Primitive::Line {
            from: Point::new(0.0, 10.0),
            to: Point::new(300.0, 10.0),
            stroke: Stroke::default(),
        };
        assert_eq!(line.extent(), Size::new(300.0, 10.0));

        let circle = Primitive::Circle {
            radius: 50.0,
            stroke: Stroke::default(),
        };
        assert_eq!(circle.extent(), Size::new(100.0, 100.0));
    }

    #[test]
    fn test_serialized_object_tagging() {
        let obj = SerializedObject::Shape {
            left: 50.0,
            top: 50.0,
            primitive: Primitive::Circle {
                radius: 50.0,
                stroke: Stroke::default(),
            },
        };
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["type"], "shape");
        assert_eq!(json["primitive"]["kind"], "circle");
    }
}
