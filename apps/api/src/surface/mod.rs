// Drawing-Surface Adapter
// A page is one stateful drawing surface. The layout engine, editor and history manager
// only talk to pages through `DrawingSurface`; `Canvas` is the in-memory implementation.

pub mod canvas;
pub mod glyphs;
pub mod object;
pub mod raster;

use image::RgbaImage;
use serde_json::Value;
use thiserror::Error;

pub use canvas::Canvas;
pub use object::{ObjectId, PlacedObject, Point, Primitive, Size, Stroke, TextStyle};
pub use raster::RasterOptions;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Invalid page state: {0}")]
    InvalidState(#[from] serde_json::Error),

    #[error("Unsupported page state version {0}")]
    UnsupportedVersion(u32),

    #[error("Cannot rasterize a {width}x{height} page at scale {scale}")]
    InvalidDimensions { width: f32, height: f32, scale: f32 },
}

/// Capability wrapper around one page's drawing surface.
///
/// Objects are created detached, then either attached to the page with `add` or adopted
/// by a `group`. Operations on unknown ids are ignored and reported through the return
/// value, never by panicking.
pub trait DrawingSurface {
    /// A new empty page of the given size.
    fn blank(size: Size) -> Self
    where
        Self: Sized;

    fn size(&self) -> Size;

    /// Extent of `text` wrapped in a box of `width`, without creating an object.
    fn measure_text(&self, text: &str, style: &TextStyle, width: f32) -> Size;

    fn create_text(&mut self, text: &str, style: TextStyle, width: f32, at: Point) -> ObjectId;

    fn create_shape(&mut self, primitive: Primitive, at: Point) -> ObjectId;

    /// Adopts detached `children` (positions relative to `at`) into a new detached group.
    /// Unknown or already attached children are skipped.
    fn group(&mut self, children: &[ObjectId], at: Point) -> ObjectId;

    fn measure(&self, id: ObjectId) -> Option<Size>;

    fn object(&self, id: ObjectId) -> Option<&PlacedObject>;

    /// Attaches a detached object to the page, on top. Returns false if it can't be attached.
    fn add(&mut self, id: ObjectId) -> bool;

    /// Removes a top-level object and everything it owns.
    fn remove(&mut self, id: ObjectId) -> bool;

    fn move_to(&mut self, id: ObjectId, at: Point) -> bool;

    /// Top-level objects in z-order (bottom first).
    fn objects(&self) -> &[ObjectId];

    fn clear(&mut self);

    fn select(&mut self, ids: &[ObjectId]);

    fn selection(&self) -> &[ObjectId];

    fn discard_selection(&mut self);

    fn set_interactive(&mut self, interactive: bool);

    fn is_interactive(&self) -> bool;

    /// Opaque, id-free state of the page's objects.
    fn to_serializable(&self) -> Value;

    /// Replaces every object on the page with the ones described by `state`.
    fn load_from_serializable(&mut self, state: &Value) -> Result<(), SurfaceError>;

    fn rasterize(&self, options: &RasterOptions) -> Result<RgbaImage, SurfaceError>;
}
