//! Embedded glyph faces for text rasterization.
//!
//! Uses fontdue for glyph coverage. Faces are parsed once and shared. Layout keeps
//! measuring with the static tables in `layout::font_metrics`; these faces only paint.
//!
//! | Canvas font     | Face            |
//! |-----------------|-----------------|
//! | Arial           | DejaVu Sans     |
//! | Times New Roman | DejaVu Serif    |
//! | Courier New     | DejaVu Sans Mono|
//!
//! Only Arial has a real bold face; the others are emboldened by the painter.

use std::collections::HashMap;
use std::sync::OnceLock;

use fontdue::{Font, FontSettings, Metrics};

use crate::layout::font_metrics::FontFamily;

static SANS: OnceLock<Font> = OnceLock::new();
static SANS_BOLD: OnceLock<Font> = OnceLock::new();
static SERIF: OnceLock<Font> = OnceLock::new();
static MONO: OnceLock<Font> = OnceLock::new();

fn load(cell: &'static OnceLock<Font>, bytes: &'static [u8]) -> &'static Font {
    cell.get_or_init(|| {
        Font::from_bytes(bytes, FontSettings::default()).expect("Failed to load embedded font")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Sans,
    SansBold,
    Serif,
    Mono,
}

impl Face {
    /// Face for a canvas font. The flag is true when bold has to be synthesized.
    pub fn for_style(font: FontFamily, bold: bool) -> (Face, bool) {
        match (font, bold) {
            (FontFamily::Arial, true) => (Face::SansBold, false),
            (FontFamily::Arial, false) => (Face::Sans, false),
            (FontFamily::TimesNewRoman, bold) => (Face::Serif, bold),
            (FontFamily::CourierNew, bold) => (Face::Mono, bold),
        }
    }

    pub fn font(self) -> &'static Font {
        match self {
            Face::Sans => load(&SANS, include_bytes!("../../fonts/DejaVuSans.ttf")),
            Face::SansBold => load(&SANS_BOLD, include_bytes!("../../fonts/DejaVuSans-Bold.ttf")),
            Face::Serif => load(&SERIF, include_bytes!("../../fonts/DejaVuSerif.ttf")),
            Face::Mono => load(&MONO, include_bytes!("../../fonts/DejaVuSansMono.ttf")),
        }
    }
}

/// A rasterized glyph: placement metrics plus one coverage byte per pixel, row-major.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub metrics: Metrics,
    pub coverage: Vec<u8>,
}

/// Per-render glyph cache keyed by face, character and pixel size.
#[derive(Default)]
pub struct GlyphCache {
    glyphs: HashMap<(Face, char, u32), Glyph>,
}

impl GlyphCache {
    pub fn glyph(&mut self, face: Face, ch: char, px: f32) -> &Glyph {
        self.glyphs
            .entry((face, ch, px.to_bits()))
            .or_insert_with(|| {
                let (metrics, coverage) = face.font().rasterize(ch, px);
                Glyph { metrics, coverage }
            })
    }

    /// Natural advance of `text` at `px`, in pixels.
    pub fn advance(&self, face: Face, text: &str, px: f32) -> f32 {
        let font = face.font();
        text.chars().map(|ch| font.metrics(ch, px).advance_width).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_face_loads_and_has_ascii() {
        for face in [Face::Sans, Face::SansBold, Face::Serif, Face::Mono] {
            let font = face.font();
            assert!(font.lookup_glyph_index('A') != 0, "{face:?} lacks 'A'");
            assert!(font.horizontal_line_metrics(14.0).is_some());
        }
    }

    #[test]
    fn test_style_mapping() {
        assert_eq!(Face::for_style(FontFamily::Arial, true), (Face::SansBold, false));
        assert_eq!(Face::for_style(FontFamily::TimesNewRoman, true), (Face::Serif, true));
        assert_eq!(Face::for_style(FontFamily::CourierNew, false), (Face::Mono, false));
    }

    #[test]
    fn test_cache_returns_inked_glyph() {
        let mut cache = GlyphCache::default();
        let glyph = cache.glyph(Face::Sans, 'H', 20.0);
        assert!(glyph.metrics.width > 0 && glyph.metrics.height > 0);
        assert!(glyph.coverage.iter().any(|c| *c > 128));
        assert!(cache.advance(Face::Sans, "HH", 20.0) > 0.0);
    }
}
