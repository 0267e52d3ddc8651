//! In-memory page canvas: an arena of placed objects plus page-level interaction state.

use std::collections::{HashMap, HashSet};

use image::RgbaImage;
use serde_json::Value;
use tracing::debug;

use crate::layout::font_metrics::{get_metrics, LINE_HEIGHT};
use crate::surface::object::{
    ObjectId, ObjectKind, PlacedObject, Point, Primitive, SerializedObject, SerializedPage, Size,
    TextStyle, PAGE_STATE_VERSION,
};
use crate::surface::raster::{self, RasterOptions};
use crate::surface::{DrawingSurface, SurfaceError};

#[derive(Debug, Clone)]
pub struct Canvas {
    size: Size,
    arena: HashMap<ObjectId, PlacedObject>,
    order: Vec<ObjectId>,
    /// Ids adopted by a group; never attached to the page directly.
    owned: HashSet<ObjectId>,
    selection: Vec<ObjectId>,
    interactive: bool,
    next_id: u64,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            arena: HashMap::new(),
            order: Vec::new(),
            owned: HashSet::new(),
            selection: Vec::new(),
            interactive: true,
            next_id: 1,
        }
    }

    pub fn object_count(&self) -> usize {
        self.order.len()
    }

    fn alloc(&mut self, position: Point, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.arena.insert(id, PlacedObject { id, position, kind });
        id
    }

    fn is_detached(&self, id: ObjectId) -> bool {
        self.arena.contains_key(&id) && !self.order.contains(&id) && !self.owned.contains(&id)
    }

    fn drop_recursive(&mut self, id: ObjectId) {
        self.owned.remove(&id);
        if let Some(obj) = self.arena.remove(&id) {
            if let ObjectKind::Group { children } = obj.kind {
                for child in children {
                    self.drop_recursive(child);
                }
            }
        }
    }

    fn serialize_object(&self, id: ObjectId) -> Option<SerializedObject> {
        let obj = self.arena.get(&id)?;
        let Point { x: left, y: top } = obj.position;
        Some(match &obj.kind {
            ObjectKind::Text { text, width, style } => SerializedObject::Text {
                left,
                top,
                width: *width,
                text: text.clone(),
                style: style.clone(),
            },
            ObjectKind::Shape(primitive) => SerializedObject::Shape {
                left,
                top,
                primitive: primitive.clone(),
            },
            ObjectKind::Group { children } => SerializedObject::Group {
                left,
                top,
                children: children
                    .iter()
                    .filter_map(|c| self.serialize_object(*c))
                    .collect(),
            },
        })
    }

    fn restore_object(&mut self, obj: &SerializedObject) -> ObjectId {
        match obj {
            SerializedObject::Text {
                left,
                top,
                width,
                text,
                style,
            } => self.create_text(text, style.clone(), *width, Point::new(*left, *top)),
            SerializedObject::Shape {
                left,
                top,
                primitive,
            } => self.create_shape(primitive.clone(), Point::new(*left, *top)),
            SerializedObject::Group {
                left,
                top,
                children,
            } => {
                let ids: Vec<ObjectId> = children.iter().map(|c| self.restore_object(c)).collect();
                self.group(&ids, Point::new(*left, *top))
            }
        }
    }
}

impl DrawingSurface for Canvas {
    fn blank(size: Size) -> Self {
        Canvas::new(size.width, size.height)
    }

    fn size(&self) -> Size {
        self.size
    }

    fn measure_text(&self, text: &str, style: &TextStyle, width: f32) -> Size {
        let metrics = get_metrics(&style.font);
        let width_em = width / style.font_size.max(1.0);
        let lines = metrics.line_count(text, width_em);
        Size::new(width, lines as f32 * style.font_size * LINE_HEIGHT)
    }

    fn create_text(&mut self, text: &str, style: TextStyle, width: f32, at: Point) -> ObjectId {
        self.alloc(
            at,
            ObjectKind::Text {
                text: text.to_string(),
                width,
                style,
            },
        )
    }

    fn create_shape(&mut self, primitive: Primitive, at: Point) -> ObjectId {
        self.alloc(at, ObjectKind::Shape(primitive))
    }

    fn group(&mut self, children: &[ObjectId], at: Point) -> ObjectId {
        let mut adopted = Vec::with_capacity(children.len());
        for &child in children {
            if self.is_detached(child) && !adopted.contains(&child) {
                self.owned.insert(child);
                adopted.push(child);
            } else {
                debug!(child = child.0, "Skipping child that cannot be grouped");
            }
        }
        self.alloc(at, ObjectKind::Group { children: adopted })
    }

    fn measure(&self, id: ObjectId) -> Option<Size> {
        let obj = self.arena.get(&id)?;
        Some(match &obj.kind {
            ObjectKind::Text { text, width, style } => self.measure_text(text, style, *width),
            ObjectKind::Shape(primitive) => primitive.extent(),
            ObjectKind::Group { children } => {
                children.iter().fold(Size::default(), |acc, child| {
                    match (self.arena.get(child), self.measure(*child)) {
                        (Some(c), Some(size)) => Size::new(
                            acc.width.max(c.position.x + size.width),
                            acc.height.max(c.position.y + size.height),
                        ),
                        _ => acc,
                    }
                })
            }
        })
    }

    fn object(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.arena.get(&id)
    }

    fn add(&mut self, id: ObjectId) -> bool {
        if !self.is_detached(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    fn remove(&mut self, id: ObjectId) -> bool {
        let Some(pos) = self.order.iter().position(|o| *o == id) else {
            return false;
        };
        self.order.remove(pos);
        self.selection.retain(|s| *s != id);
        if let Some(obj) = self.arena.get(&id) {
            debug!(id = id.0, kind = obj.type_name(), "Object removed");
        }
        self.drop_recursive(id);
        true
    }

    fn move_to(&mut self, id: ObjectId, at: Point) -> bool {
        match self.arena.get_mut(&id) {
            Some(obj) => {
                obj.position = at;
                true
            }
            None => false,
        }
    }

    fn objects(&self) -> &[ObjectId] {
        &self.order
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
        self.owned.clear();
        self.selection.clear();
    }

    fn select(&mut self, ids: &[ObjectId]) {
        if !self.interactive {
            debug!("Ignoring selection on a non-interactive page");
            return;
        }
        self.selection = ids
            .iter()
            .copied()
            .filter(|id| self.order.contains(id))
            .collect();
    }

    fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    fn discard_selection(&mut self) {
        self.selection.clear();
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn to_serializable(&self) -> Value {
        let page = SerializedPage {
            version: PAGE_STATE_VERSION,
            width: self.size.width,
            height: self.size.height,
            objects: self
                .order
                .iter()
                .filter_map(|id| self.serialize_object(*id))
                .collect(),
        };
        serde_json::to_value(&page).unwrap_or(Value::Null)
    }

    fn load_from_serializable(&mut self, state: &Value) -> Result<(), SurfaceError> {
        let objects = if state.is_null() {
            Vec::new()
        } else {
            let page: SerializedPage = serde_json::from_value(state.clone())?;
            if page.version != PAGE_STATE_VERSION {
                return Err(SurfaceError::UnsupportedVersion(page.version));
            }
            page.objects
        };

        self.clear();
        for obj in &objects {
            let id = self.restore_object(obj);
            self.order.push(id);
        }
        Ok(())
    }

    fn rasterize(&self, options: &RasterOptions) -> Result<RgbaImage, SurfaceError> {
        raster::render(self, options)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
