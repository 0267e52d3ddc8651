// Page/Export Controller
// Rasterizes pages through the drawing surface and composes them into a paginated PDF.
// CPU-bound: handlers must run it inside tokio::task::spawn_blocking.

pub mod pdf;

use thiserror::Error;

use crate::surface::SurfaceError;

pub use pdf::{encode_png, export_pdf, ExportOptions};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Worksheet has no pages to export")]
    NoPages,

    #[error("Rasterization failed: {0}")]
    Raster(#[from] SurfaceError),

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("PDF assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download name for an exported worksheet: whitespace runs become `_`.
pub fn export_filename(title: &str) -> String {
    let stem = title.split_whitespace().collect::<Vec<_>>().join("_");
    if stem.is_empty() {
        "worksheet.pdf".to_string()
    } else {
        format!("{stem}.pdf")
    }
}
