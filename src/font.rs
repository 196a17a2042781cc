use crate::error::{AppError, Result};
use ab_glyph::{Font, FontRef, GlyphId, PxScale, ScaleFont, point};
use image::{Rgb, RgbImage};

static REGULAR: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
static BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Sans-serif faces compiled into the crate
///
/// Text is laid out and rasterized here on every target, so exports look the
/// same natively and in the browser and never depend on installed fonts.
#[derive(Clone, Debug)]
pub struct Typeface {
    regular: FontRef<'static>,
    bold: FontRef<'static>,
}

impl Typeface {
    pub fn embedded() -> Result<Self> {
        Ok(Typeface {
            regular: FontRef::try_from_slice(REGULAR).map_err(AppError::raster)?,
            bold: FontRef::try_from_slice(BOLD).map_err(AppError::raster)?,
        })
    }

    fn face(&self, weight: Weight) -> &FontRef<'static> {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    /// Advance width and line height of `text` at `px` pixels
    pub fn measure(&self, text: &str, px: f32, weight: Weight) -> (u32, u32) {
        let font = self.face(weight).as_scaled(PxScale::from(px));

        let mut width = 0f32;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = font.glyph_id(c);
            if let Some(p) = prev {
                width += font.kern(p, id);
            }
            width += font.h_advance(id);
            prev = Some(id);
        }

        (width.ceil().max(0.0) as u32, font.height().ceil() as u32)
    }

    /// Draws one line of `text` centered on `center`, blending into `canvas`
    ///
    /// Glyphs falling outside the canvas are clipped.
    pub fn draw_centered(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        center: (i32, i32),
        px: f32,
        weight: Weight,
        color: Rgb<u8>,
    ) {
        let scale = PxScale::from(px);
        let font = self.face(weight).as_scaled(scale);
        let (width, _) = self.measure(text, px, weight);

        let mut caret = center.0 as f32 - width as f32 / 2.0;
        let baseline = center.1 as f32 + (font.ascent() + font.descent()) / 2.0;
        let (canvas_w, canvas_h) = canvas.dimensions();

        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = font.glyph_id(c);
            if let Some(p) = prev {
                caret += font.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += font.h_advance(id);
            prev = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x < 0 || y < 0 || x as u32 >= canvas_w || y as u32 >= canvas_h {
                    return;
                }
                let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                let coverage = coverage.clamp(0.0, 1.0);
                for (dst, src) in pixel.0.iter_mut().zip(color.0) {
                    let mixed = *dst as f32 * (1.0 - coverage) + src as f32 * coverage;
                    *dst = mixed.round() as u8;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink(image: &RgbImage) -> usize {
        image.pixels().filter(|p| p.0[0] < 0x80).count()
    }

    #[test]
    fn embedded_faces_load() {
        assert!(Typeface::embedded().is_ok());
    }

    #[test]
    fn longer_text_is_wider() {
        let face = Typeface::embedded().unwrap();
        let (short, h) = face.measure("ID", 14.0, Weight::Regular);
        let (long, _) = face.measure("Identifier", 14.0, Weight::Regular);

        assert!(short > 0);
        assert!(long > short);
        assert!(h >= 14);
        assert_eq!(face.measure("", 14.0, Weight::Bold).0, 0);
    }

    #[test]
    fn bold_is_at_least_as_wide() {
        let face = Typeface::embedded().unwrap();
        let (regular, _) = face.measure("Name", 14.0, Weight::Regular);
        let (bold, _) = face.measure("Name", 14.0, Weight::Bold);
        assert!(bold >= regular);
    }

    #[test]
    fn drawing_puts_ink_around_the_center() {
        let face = Typeface::embedded().unwrap();
        let mut canvas = RgbImage::from_pixel(120, 40, Rgb([255, 255, 255]));

        face.draw_centered(&mut canvas, "A1", (60, 20), 28.0, Weight::Regular, Rgb([0, 0, 0]));

        assert!(ink(&canvas) > 0);
        assert_eq!(canvas.get_pixel(2, 2).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(117, 37).0, [255, 255, 255]);
    }

    #[test]
    fn text_past_the_edge_is_clipped() {
        let face = Typeface::embedded().unwrap();
        let mut canvas = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        face.draw_centered(&mut canvas, "WWWW", (0, 0), 40.0, Weight::Bold, Rgb([0, 0, 0]));
        assert_eq!(canvas.dimensions(), (10, 10));
    }
}
