//! Multi-page PDF composition.
//!
//! Every page is rasterized, JPEG-encoded, and embedded as one image XObject on its own
//! Letter-size PDF page, scaled to fit inside a uniform margin and anchored top-left.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

use crate::export::ExportError;
use crate::surface::{DrawingSurface, RasterOptions};

const PT_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Rasterization multiplier applied to the canvas size.
    pub scale: f32,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub jpeg_quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            page_width_mm: 215.9,
            page_height_mm: 279.4,
            margin_mm: 10.0,
            jpeg_quality: 90,
        }
    }
}

impl ExportOptions {
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    fn page_size_pt(&self) -> (f32, f32) {
        (self.page_width_mm * PT_PER_MM, self.page_height_mm * PT_PER_MM)
    }

    /// Width and height (pt) of an image of `aspect` (w/h) fitted inside the margins.
    fn fitted_size_pt(&self, aspect: f32) -> (f32, f32) {
        let (page_w, page_h) = self.page_size_pt();
        let margin = self.margin_mm * PT_PER_MM;
        let (box_w, box_h) = ((page_w - 2.0 * margin).max(1.0), (page_h - 2.0 * margin).max(1.0));
        if box_w / box_h > aspect {
            (box_h * aspect, box_h)
        } else {
            (box_w, box_w / aspect)
        }
    }
}

/// Composes all `pages`, in order, into one PDF document.
pub fn export_pdf<S: DrawingSurface>(
    pages: &[S],
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    if pages.is_empty() {
        return Err(ExportError::NoPages);
    }

    let mut composer = PdfComposer::new(options);
    for (index, page) in pages.iter().enumerate() {
        let image = page.rasterize(&RasterOptions::scaled(options.scale))?;
        debug!(page = index, width = image.width(), height = image.height(), "Rasterized page");
        composer.add_image_page(&image)?;
    }
    let bytes = composer.finish()?;
    info!(pages = pages.len(), bytes = bytes.len(), "Exported worksheet PDF");
    Ok(bytes)
}

/// Encodes one rasterized page as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

// ────────────────────────────────────────────────────────────────────────────
// Document assembly
// ────────────────────────────────────────────────────────────────────────────

struct PdfComposer<'a> {
    document: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    options: &'a ExportOptions,
}

impl<'a> PdfComposer<'a> {
    fn new(options: &'a ExportOptions) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
            options,
        }
    }

    fn add_image_page(&mut self, image: &RgbaImage) -> Result<(), ExportError> {
        let (px_w, px_h) = image.dimensions();
        let jpeg = encode_jpeg(image, self.options.jpeg_quality)?;
        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => px_w as i64,
                "Height" => px_h as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);
        let image_id = self.document.add_object(image_stream);

        let (page_w, page_h) = self.options.page_size_pt();
        let margin = self.options.margin_mm * PT_PER_MM;
        let (draw_w, draw_h) = self.options.fitted_size_pt(px_w as f32 / px_h as f32);
        // PDF origin is bottom-left; anchor the image to the top margin.
        let x = margin;
        let y = page_h - margin - draw_h;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        draw_w.into(),
                        0.into(),
                        0.into(),
                        draw_h.into(),
                        x.into(),
                        y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        };
        let page_id = self.document.add_object(page_dict);
        self.page_ids.push(page_id);
        Ok(())
    }

    fn into_document(mut self) -> Document {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self
            .document
            .add_object(dictionary! { "Type" => "Catalog", "Pages" => self.pages_id });
        self.document.trailer.set("Root", catalog_id);
        self.document
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut document = self.into_document();
        let mut buf = Vec::new();
        document.save_to(&mut buf)?;
        Ok(buf)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
