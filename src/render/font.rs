use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use font8x8::{
    UnicodeFonts, BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS,
    MISC_FONTS,
};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use unicode_width::UnicodeWidthChar;

/// Native cell size of the built-in bitmap face
const BITMAP_CELL: u32 = 8;

/// A resolved type face: an outline font loaded from disk, or the built-in
/// 8x8 bitmap face when no font file is available.
pub enum FontFace {
    Outline(FontVec),
    Bitmap,
}

impl FontFace {
    /// Resolve a face from the configured font paths.
    ///
    /// Tries `preferred` then `fallback`; each is an existence check followed
    /// by a load, and either failing moves on to the next candidate. The
    /// bitmap face is the terminal fallback, so resolution itself never
    /// fails.
    pub fn resolve(preferred: &Path, fallback: &Path) -> FontFace {
        for path in [preferred, fallback] {
            if !path.exists() {
                log::debug!("Font not found: {:?}", path);
                continue;
            }
            match fs::read(path) {
                Ok(bytes) => match FontVec::try_from_vec(bytes) {
                    Ok(font) => {
                        log::info!("Loaded font {:?}", path);
                        return FontFace::Outline(font);
                    }
                    Err(e) => log::warn!("Failed to parse font {:?}: {}", path, e),
                },
                Err(e) => log::warn!("Failed to read font {:?}: {}", path, e),
            }
        }

        log::info!("No outline font available, using built-in bitmap face");
        FontFace::Bitmap
    }

    /// Face name for logging
    pub fn name(&self) -> &'static str {
        match self {
            FontFace::Outline(_) => "outline",
            FontFace::Bitmap => "bitmap",
        }
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, FontFace::Bitmap)
    }

    /// Pixel width of `text` laid out at `size`
    pub fn measure(&self, text: &str, size: f32) -> u32 {
        match self {
            FontFace::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                let width: f32 = text
                    .chars()
                    .map(|ch| scaled.h_advance(font.glyph_id(ch)))
                    .sum();
                width.ceil() as u32
            }
            FontFace::Bitmap => {
                let cells: usize = text.chars().map(|ch| ch.width().unwrap_or(0)).sum();
                cells as u32 * BITMAP_CELL * bitmap_scale(size)
            }
        }
    }

    /// Vertical advance between consecutive baselines at `size`
    pub fn line_height(&self, size: f32) -> u32 {
        match self {
            FontFace::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                (scaled.height() + scaled.line_gap()).ceil() as u32
            }
            FontFace::Bitmap => BITMAP_CELL * bitmap_scale(size),
        }
    }

    /// Draw one line of text with its top-left corner at (x, y).
    ///
    /// Coordinates are in canvas pixels, already multiplied by `oversample`
    /// when the caller renders at a higher resolution for downsampling. The
    /// outline path rasterizes with per-pixel coverage; the bitmap path
    /// blits opaque scaled cells.
    pub fn draw_line(
        &self,
        canvas: &mut RgbaImage,
        x: u32,
        y: u32,
        text: &str,
        size: f32,
        oversample: u32,
        color: Rgba<u8>,
    ) {
        match self {
            FontFace::Outline(font) => {
                let px = PxScale::from(size * oversample as f32);
                let scaled = font.as_scaled(px);
                let mut pen_x = x as f32;
                let baseline = y as f32 + scaled.ascent();
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    let glyph = id.with_scale_and_position(px, ab_glyph::point(pen_x, baseline));
                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|gx, gy, coverage| {
                            blend_px(
                                canvas,
                                bounds.min.x as i32 + gx as i32,
                                bounds.min.y as i32 + gy as i32,
                                color,
                                coverage,
                            );
                        });
                    }
                    pen_x += scaled.h_advance(id);
                }
            }
            FontFace::Bitmap => {
                let scale = (bitmap_scale(size) * oversample.max(1)) as i32;
                let mut cursor_x = x as i32;
                for ch in text.chars() {
                    let cells = ch.width().unwrap_or(0) as i32;
                    if cells == 0 {
                        continue;
                    }
                    if let Some(glyph) = bitmap_glyph(ch) {
                        for (row_idx, row) in glyph.iter().enumerate() {
                            for col_idx in 0..8 {
                                if (row >> col_idx) & 1 == 0 {
                                    continue;
                                }
                                let px = cursor_x + col_idx * scale;
                                let py = y as i32 + row_idx as i32 * scale;
                                for sy in 0..scale {
                                    for sx in 0..scale {
                                        blend_px(canvas, px + sx, py + sy, color, 1.0);
                                    }
                                }
                            }
                        }
                    }
                    cursor_x += cells * BITMAP_CELL as i32 * scale;
                }
            }
        }
    }
}

/// Integer cell scale approximating `size` with 8-pixel glyphs
fn bitmap_scale(size: f32) -> u32 {
    ((size / BITMAP_CELL as f32).round() as u32).max(1)
}

/// Look up an 8x8 glyph across the built-in Unicode blocks, substituting
/// '?' for anything uncovered
fn bitmap_glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| HIRAGANA_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BLOCK_FONTS.get(ch))
        .or_else(|| MISC_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

/// Blend `color` into the canvas at (x, y) with the given coverage,
/// ignoring out-of-bounds coordinates
fn blend_px(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if coverage <= 0.0 || x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32
    {
        return;
    }
    let a = coverage.min(1.0);
    let inv = 1.0 - a;
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        dst[i] = (f32::from(dst[i]) * inv + f32::from(color[i]) * a).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_glyph_blocks() {
        assert!(bitmap_glyph('A').is_some());
        assert!(bitmap_glyph('é').is_some());
        assert!(bitmap_glyph('λ').is_some());
        assert!(bitmap_glyph('あ').is_some());
        // Uncovered scripts substitute the replacement glyph
        assert_eq!(bitmap_glyph('汉'), BASIC_FONTS.get('?'));
    }

    #[test]
    fn test_bitmap_scale_rounds_to_cell() {
        assert_eq!(bitmap_scale(8.0), 1);
        assert_eq!(bitmap_scale(16.0), 2);
        assert_eq!(bitmap_scale(28.0), 4);
        // Tiny sizes never collapse to zero
        assert_eq!(bitmap_scale(2.0), 1);
    }

    #[test]
    fn test_bitmap_measure_counts_cells() {
        let face = FontFace::Bitmap;
        assert_eq!(face.measure("ab", 8.0), 16);
        // East-Asian characters occupy two cells
        assert_eq!(face.measure("あ", 8.0), 16);
        assert_eq!(face.measure("aあ", 8.0), 24);
        assert_eq!(face.measure("", 8.0), 0);
    }

    #[test]
    fn test_bitmap_line_height() {
        let face = FontFace::Bitmap;
        assert_eq!(face.line_height(8.0), 8);
        assert_eq!(face.line_height(16.0), 16);
    }

    #[test]
    fn test_resolve_missing_paths_falls_back_to_bitmap() {
        let face = FontFace::resolve(
            Path::new("/nonexistent/preferred.ttf"),
            Path::new("/nonexistent/fallback.ttf"),
        );
        assert!(face.is_bitmap());
    }

    #[test]
    fn test_draw_line_marks_pixels() {
        let paper = Rgba([245u8, 245, 245, 255]);
        let ink = Rgba([32u8, 32, 32, 255]);
        let mut canvas = RgbaImage::from_pixel(64, 16, paper);
        FontFace::Bitmap.draw_line(&mut canvas, 0, 0, "A", 8.0, 1, ink);
        let touched = canvas.pixels().filter(|p| p[0] != paper[0]).count();
        assert!(touched > 0);
    }

    #[test]
    fn test_draw_line_ignores_out_of_bounds() {
        let paper = Rgba([245u8, 245, 245, 255]);
        let ink = Rgba([32u8, 32, 32, 255]);
        // Canvas far too small for the text; must not panic
        let mut canvas = RgbaImage::from_pixel(4, 4, paper);
        FontFace::Bitmap.draw_line(&mut canvas, 0, 0, "wide text", 16.0, 2, ink);
    }
}
