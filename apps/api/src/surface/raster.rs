//! Software rasterizer for page previews and export.
//!
//! Shapes are stroked by stamping square pens along their outline. Text is wrapped with
//! the same metric tables layout measures with, then each line is painted glyph by glyph
//! from the embedded faces, shrunk when needed so it never runs wider than measured.

use image::{Rgba, RgbaImage};

use crate::layout::font_metrics::{get_metrics, LINE_HEIGHT};
use crate::surface::glyphs::{Face, GlyphCache};
use crate::surface::object::{ObjectId, ObjectKind, Point, Primitive, Stroke, TextStyle};
use crate::surface::{DrawingSurface, SurfaceError};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    /// Output pixels per canvas unit.
    pub scale: f32,
    pub background: Rgba<u8>,
}

impl RasterOptions {
    pub fn scaled(scale: f32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: WHITE,
        }
    }
}

/// Parses `#rgb` / `#rrggbb` and a couple of names. `None` means nothing is painted.
pub fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "" | "transparent" | "none" => return None,
        "black" => return Some(BLACK),
        "white" => return Some(WHITE),
        _ => {}
    }
    let hex = value.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(hex.chars()) {
                let v = c.to_digit(16)? as u8;
                *slot = v * 17;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 => Some(Rgba([
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
            255,
        ])),
        _ => None,
    }
}

/// Renders every top-level object of `surface` into a new image.
pub fn render<S: DrawingSurface + ?Sized>(
    surface: &S,
    options: &RasterOptions,
) -> Result<RgbaImage, SurfaceError> {
    let size = surface.size();
    let invalid = SurfaceError::InvalidDimensions {
        width: size.width,
        height: size.height,
        scale: options.scale,
    };
    if !options.scale.is_finite() || options.scale <= 0.0 {
        return Err(invalid);
    }
    let width = (size.width * options.scale).round();
    let height = (size.height * options.scale).round();
    if !width.is_finite() || !height.is_finite() || width < 1.0 || height < 1.0 {
        return Err(invalid);
    }

    let mut painter = Painter {
        image: RgbaImage::from_pixel(width as u32, height as u32, options.background),
        scale: options.scale,
        glyphs: GlyphCache::default(),
    };
    for id in surface.objects() {
        draw_object(surface, &mut painter, *id, Point::default());
    }
    Ok(painter.image)
}

fn draw_object<S: DrawingSurface + ?Sized>(
    surface: &S,
    painter: &mut Painter,
    id: ObjectId,
    origin: Point,
) {
    let Some(obj) = surface.object(id) else {
        return;
    };
    let at = origin.offset(obj.position);
    match &obj.kind {
        ObjectKind::Text { text, width, style } => {
            let box_height = surface.measure_text(text, style, *width).height;
            painter.text(at, text, *width, box_height, style);
        }
        ObjectKind::Shape(primitive) => painter.primitive(at, primitive),
        ObjectKind::Group { children } => {
            for child in children {
                draw_object(surface, painter, *child, at);
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Painter
// ────────────────────────────────────────────────────────────────────────────

struct Painter {
    image: RgbaImage,
    scale: f32,
    glyphs: GlyphCache,
}

impl Painter {
    /// Fills a rectangle given in canvas units, clipped to the image.
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let s = self.scale;
        self.fill_px(x * s, y * s, (x + w) * s, (y + h) * s, color);
    }

    fn fill_px(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba<u8>) {
        let (iw, ih) = (self.image.width() as f32, self.image.height() as f32);
        let x0 = x0.floor().clamp(0.0, iw) as u32;
        let y0 = y0.floor().clamp(0.0, ih) as u32;
        let x1 = x1.ceil().clamp(0.0, iw) as u32;
        let y1 = y1.ceil().clamp(0.0, ih) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, color);
            }
        }
    }

    fn stroke_segment(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let Some(color) = parse_color(&stroke.color) else {
            return;
        };
        let s = self.scale;
        let half = (stroke.width * s / 2.0).max(0.5);
        let (x0, y0) = (from.x * s, from.y * s);
        let (dx, dy) = (to.x * s - x0, to.y * s - y0);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let (cx, cy) = (x0 + dx * t, y0 + dy * t);
            self.fill_px(cx - half, cy - half, cx + half, cy + half, color);
        }
    }

    fn polyline(&mut self, at: Point, points: &[Point], stroke: &Stroke, closed: bool) {
        for pair in points.windows(2) {
            self.stroke_segment(at.offset(pair[0]), at.offset(pair[1]), stroke);
        }
        if closed && points.len() > 2 {
            if let (Some(last), Some(first)) = (points.last(), points.first()) {
                self.stroke_segment(at.offset(*last), at.offset(*first), stroke);
            }
        }
    }

    fn primitive(&mut self, at: Point, primitive: &Primitive) {
        match primitive {
            Primitive::Rect {
                width,
                height,
                stroke,
                fill,
            } => {
                if let Some(color) = fill.as_deref().and_then(parse_color) {
                    self.fill_rect(at.x, at.y, *width, *height, color);
                }
                let corners = [
                    Point::new(0.0, 0.0),
                    Point::new(*width, 0.0),
                    Point::new(*width, *height),
                    Point::new(0.0, *height),
                ];
                self.polyline(at, &corners, stroke, true);
            }
            Primitive::Line { from, to, stroke } => {
                self.stroke_segment(at.offset(*from), at.offset(*to), stroke);
            }
            Primitive::Circle { radius, stroke } => {
                let center = Point::new(at.x + radius, at.y + radius);
                let circumference = std::f32::consts::TAU * radius * self.scale;
                let steps = circumference.ceil().max(16.0) as u32;
                let points: Vec<Point> = (0..steps)
                    .map(|i| {
                        let angle = std::f32::consts::TAU * i as f32 / steps as f32;
                        Point::new(radius * angle.cos(), radius * angle.sin())
                    })
                    .collect();
                self.polyline(center, &points, stroke, true);
            }
            Primitive::Polygon { points, stroke } => self.polyline(at, points, stroke, true),
        }
    }

    fn text(&mut self, at: Point, text: &str, width: f32, box_height: f32, style: &TextStyle) {
        if let Some(bg) = style.background.as_deref().and_then(parse_color) {
            self.fill_rect(at.x, at.y, width, box_height, bg);
        }
        let color = parse_color(&style.color).unwrap_or(BLACK);
        let size = style.font_size;
        let line_box = size * LINE_HEIGHT;
        let metrics = get_metrics(&style.font);
        let (face, embolden) = Face::for_style(style.font, style.bold);

        for (index, line) in metrics.wrap_lines(text, width / size.max(1.0)).iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let measured = metrics.measure_str(line) * size * self.scale;
            let natural = self.glyphs.advance(face, line, size * self.scale);
            let px = if natural > measured && natural > 0.0 {
                size * self.scale * measured / natural
            } else {
                size * self.scale
            };
            let line_top = (at.y + index as f32 * line_box) * self.scale;
            self.glyph_run(face, line, at.x * self.scale, line_top, line_box * self.scale, px, color, embolden);
        }
    }

    /// Paints one line. Coordinates are in output pixels; the line is centred in `line_box`.
    #[allow(clippy::too_many_arguments)]
    fn glyph_run(
        &mut self,
        face: Face,
        line: &str,
        left: f32,
        top: f32,
        line_box: f32,
        px: f32,
        color: Rgba<u8>,
        embolden: bool,
    ) {
        let (ascent, descent) = face
            .font()
            .horizontal_line_metrics(px)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((px * 0.8, -px * 0.2));
        let baseline = top + (line_box - (ascent - descent)) / 2.0 + ascent;
        let bold_offset = (px / 24.0).max(1.0);

        let mut pen = left;
        for ch in line.chars() {
            let glyph = self.glyphs.glyph(face, ch, px).clone();
            let m = glyph.metrics;
            let x = pen + m.xmin as f32;
            let y = baseline - (m.ymin as f32 + m.height as f32);
            self.blend(x, y, m.width, &glyph.coverage, color);
            if embolden {
                self.blend(x + bold_offset, y, m.width, &glyph.coverage, color);
            }
            pen += m.advance_width;
        }
    }

    /// Alpha-blends a coverage bitmap whose top-left pixel lands at `(x, y)`.
    fn blend(&mut self, x: f32, y: f32, width: usize, coverage: &[u8], color: Rgba<u8>) {
        if width == 0 {
            return;
        }
        let (iw, ih) = (i64::from(self.image.width()), i64::from(self.image.height()));
        let (x0, y0) = (x.round() as i64, y.round() as i64);
        for (i, &alpha) in coverage.iter().enumerate() {
            if alpha == 0 {
                continue;
            }
            let px = x0 + (i % width) as i64;
            let py = y0 + (i / width) as i64;
            if px < 0 || py < 0 || px >= iw || py >= ih {
                continue;
            }
            let a = f32::from(alpha) / 255.0;
            let dst = self.image.get_pixel_mut(px as u32, py as u32);
            for c in 0..3 {
                let mixed = f32::from(color.0[c]) * a + f32::from(dst.0[c]) * (1.0 - a);
                dst.0[c] = mixed.round() as u8;
            }
            dst.0[3] = 255;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Canvas;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#000"), Some(BLACK));
        assert_eq!(parse_color("#ccc"), Some(Rgba([204, 204, 204, 255])));
        assert_eq!(parse_color("#f5f5f5"), Some(Rgba([245, 245, 245, 255])));
        assert_eq!(parse_color("transparent"), None);
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("tomato"), None);
    }

    #[test]
    fn test_empty_page_is_background_only() {
        let canvas = Canvas::new(80.0, 110.0);
        let image = render(&canvas, &RasterOptions::scaled(2.0)).unwrap();
        assert_eq!(image.dimensions(), (160, 220));
        assert!(image.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_rect_stroke_is_painted() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let id = canvas.create_shape(
            Primitive::Rect {
                width: 50.0,
                height: 20.0,
                stroke: Stroke::default(),
                fill: None,
            },
            Point::new(10.0, 10.0),
        );
        canvas.add(id);
        let image = render(&canvas, &RasterOptions::default()).unwrap();
        assert_eq!(*image.get_pixel(30, 10), BLACK);
        assert_eq!(*image.get_pixel(30, 20), WHITE, "interior stays unfilled");
    }

    fn ink_bbox(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let mut bbox: Option<(u32, u32, u32, u32)> = None;
        for (x, y, p) in image.enumerate_pixels() {
            if p.0[0] < 128 {
                bbox = Some(match bbox {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bbox
    }

    #[test]
    fn test_text_is_drawn_as_glyphs_not_bars() {
        let mut canvas = Canvas::new(200.0, 50.0);
        let id = canvas.create_text("Hello world", TextStyle::default(), 180.0, Point::new(0.0, 0.0));
        canvas.add(id);
        let image = render(&canvas, &RasterOptions::scaled(2.0)).unwrap();

        let (x0, y0, x1, y1) = ink_bbox(&image).expect("text leaves ink");
        let area = (x1 - x0 + 1) * (y1 - y0 + 1);
        let inked = (x0..=x1)
            .flat_map(|x| (y0..=y1).map(move |y| (x, y)))
            .filter(|(x, y)| image.get_pixel(*x, *y).0[0] < 128)
            .count() as u32;
        assert!(inked * 2 < area, "glyph strokes, not a filled block: {inked}/{area}");

        // The space between the two words leaves an ink-free column inside the box.
        let blank_column = (x0..=x1).any(|x| (y0..=y1).all(|y| image.get_pixel(x, y).0[0] >= 128));
        assert!(blank_column);
    }

    #[test]
    fn test_text_stays_within_measured_width() {
        let mut canvas = Canvas::new(400.0, 100.0);
        let style = TextStyle::sized(20.0);
        let text = "Which planet is the largest?";
        let measured = get_metrics(&style.font).measure_str(text) * 20.0;
        let id = canvas.create_text(text, style, 380.0, Point::new(10.0, 10.0));
        canvas.add(id);
        let image = render(&canvas, &RasterOptions::default()).unwrap();

        let (x0, _, x1, _) = ink_bbox(&image).unwrap();
        assert!(x0 >= 9);
        assert!((x1 as f32) <= 10.0 + measured + 2.0, "ink ends at {x1}, measured {measured}");
    }

    #[test]
    fn test_section_background_is_filled_behind_text() {
        let mut canvas = Canvas::new(300.0, 60.0);
        let style = TextStyle {
            bold: true,
            background: Some("#f5f5f5".to_string()),
            ..TextStyle::sized(18.0)
        };
        let id = canvas.create_text("Warm-Up Questions:", style, 280.0, Point::new(0.0, 0.0));
        canvas.add(id);
        let image = render(&canvas, &RasterOptions::default()).unwrap();
        assert_eq!(*image.get_pixel(279, 1), Rgba([245, 245, 245, 255]));
        assert!(ink_bbox(&image).is_some());
        assert_eq!(*image.get_pixel(290, 50), WHITE);
    }

    #[test]
    fn test_group_children_are_offset_by_group_origin() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let line = canvas.create_shape(
            Primitive::Line {
                from: Point::new(0.0, 0.0),
                to: Point::new(10.0, 0.0),
                stroke: Stroke::default(),
            },
            Point::new(0.0, 0.0),
        );
        let group = canvas.group(&[line], Point::new(40.0, 60.0));
        canvas.add(group);
        let image = render(&canvas, &RasterOptions::default()).unwrap();
        assert_eq!(*image.get_pixel(45, 60), BLACK);
        assert_eq!(*image.get_pixel(5, 0), WHITE);
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        let canvas = Canvas::new(100.0, 100.0);
        assert!(matches!(
            render(&canvas, &RasterOptions::scaled(0.0)),
            Err(SurfaceError::InvalidDimensions { .. })
        ));
        let empty = Canvas::new(0.0, 100.0);
        assert!(render(&empty, &RasterOptions::default()).is_err());
    }
}
