pub mod font;
pub mod wrap;

pub use font::FontFace;

use crate::config::RenderConfig;
use anyhow::Context;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Padding around the text block, in output pixels
const PAD: u32 = 16;
/// Minimum wrap budget so a degenerate maxWidth still fits a glyph column
const MIN_INNER: u32 = 16;
/// The bitmap face is drawn doubled and downsampled to soften its edges
const BITMAP_OVERSAMPLE: u32 = 2;

const PAPER: Rgba<u8> = Rgba([245, 245, 245, 255]);
const INK: Rgba<u8> = Rgba([32, 32, 32, 255]);

/// A rendered text block, kept as raw pixels until an encoding is chosen
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    image: RgbaImage,
}

impl RenderedImage {
    pub fn to_png_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .context("Failed to encode PNG")?;
        Ok(buf)
    }

    /// Encode as a 24-bit BMP, the interchange form clipboard consumers
    /// accept most widely
    pub fn to_bmp_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let rgb = image::DynamicImage::ImageRgba8(self.image.clone()).into_rgb8();
        let mut buf = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp)
            .context("Failed to encode BMP")?;
        Ok(buf)
    }
}

/// Pure text-to-image renderer: wraps, lays out, and rasterizes a text
/// block on a light canvas. No clipboard or window access happens here.
pub struct TextRenderer {
    face: FontFace,
    font_size: f32,
}

impl TextRenderer {
    /// Build a renderer from configuration, resolving the configured font
    /// files down to the built-in face when neither loads
    pub fn new(config: &RenderConfig) -> TextRenderer {
        let face = FontFace::resolve(
            Path::new(&config.preferred_font),
            Path::new(&config.fallback_font),
        );
        log::info!("Text renderer using {} face", face.name());
        TextRenderer {
            face,
            font_size: config.font_size,
        }
    }

    /// Renderer over the built-in bitmap face, independent of any font
    /// files on disk
    pub fn builtin(font_size: f32) -> TextRenderer {
        TextRenderer {
            face: FontFace::Bitmap,
            font_size,
        }
    }

    pub fn face_name(&self) -> &'static str {
        self.face.name()
    }

    /// Render `text` into an image no wider than `max_width` pixels.
    ///
    /// Rendering is deterministic for a given face, size, and input, and
    /// total: any input produces a valid canvas, blank for empty text.
    pub fn render(&self, text: &str, max_width: u32) -> RenderedImage {
        let size = self.font_size;
        let line_height = self.face.line_height(size).max(1);
        let inner = max_width.saturating_sub(2 * PAD).max(MIN_INNER);
        let lines = wrap::wrap_text(text, inner, |s| self.face.measure(s, size));

        let text_width = lines
            .iter()
            .map(|line| self.face.measure(line, size))
            .max()
            .unwrap_or(0);
        let width = (text_width + 2 * PAD).min(max_width).max(2 * PAD);
        let height = lines.len().max(1) as u32 * line_height + 2 * PAD;

        let oversample = if self.face.is_bitmap() {
            BITMAP_OVERSAMPLE
        } else {
            1
        };
        let mut canvas = RgbaImage::from_pixel(width * oversample, height * oversample, PAPER);
        for (i, line) in lines.iter().enumerate() {
            let y = (PAD + i as u32 * line_height) * oversample;
            self.face
                .draw_line(&mut canvas, PAD * oversample, y, line, size, oversample, INK);
        }

        let image = if oversample == 1 {
            canvas
        } else {
            imageops::resize(&canvas, width, height, FilterType::Triangle)
        };
        RenderedImage {
            width,
            height,
            image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> TextRenderer {
        TextRenderer::builtin(16.0)
    }

    #[test]
    fn test_render_is_deterministic() {
        let r = renderer();
        let a = r.render("hello world", 400);
        let b = r.render("hello world", 400);
        assert_eq!((a.width, a.height), (b.width, b.height));
        assert_eq!(a.to_png_bytes().unwrap(), b.to_png_bytes().unwrap());
    }

    #[test]
    fn test_render_respects_max_width() {
        let r = renderer();
        let img = r.render(&"word ".repeat(200), 300);
        assert!(img.width <= 300);
        assert!(img.height > 0);
    }

    #[test]
    fn test_render_long_word_stays_within_budget() {
        let r = renderer();
        let img = r.render(&"x".repeat(500), 240);
        assert!(img.width <= 240);
    }

    #[test]
    fn test_render_empty_text_gives_padded_canvas() {
        let img = renderer().render("", 400);
        assert_eq!(img.width, 32);
        assert_eq!(img.height, 48);
    }

    #[test]
    fn test_render_multiline_taller_than_single() {
        let r = renderer();
        let one = r.render("alpha", 400);
        let two = r.render("alpha\nbeta", 400);
        assert!(two.height > one.height);
    }

    #[test]
    fn test_render_preserves_blank_lines() {
        let r = renderer();
        let with_gap = r.render("alpha\n\nbeta", 400);
        let without = r.render("alpha\nbeta", 400);
        // One extra line height for the blank line
        assert_eq!(with_gap.height, without.height + 16);
    }

    #[test]
    fn test_png_encoding_magic() {
        let bytes = renderer().render("hi", 200).to_png_bytes().unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn test_bmp_encoding_magic() {
        let bytes = renderer().render("hi", 200).to_bmp_bytes().unwrap();
        assert_eq!(&bytes[..2], b"BM");
    }
}
