use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use log::warn;
use qrcode::QrCode;
use qrcode::render::svg;

const PLACEHOLDER_BORDER: u8 = 0xE0;

/// Renders text payloads as QR codes of one fixed pixel size
///
/// Rendering never fails: a payload that does not fit into any QR version
/// produces a blank placeholder square instead.
#[derive(Clone, Copy, Debug)]
pub struct CodeRenderer {
    size: u32,
}

impl CodeRenderer {
    /// Creates a renderer producing `size` x `size` codes
    pub fn new(size: u32) -> Self {
        CodeRenderer { size: size.max(1) }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Same renderer with its edge length multiplied by `factor`
    pub fn scaled(&self, factor: u32) -> Self {
        CodeRenderer::new(self.size.saturating_mul(factor.max(1)))
    }

    /// Encodes `payload` and draws it as a grayscale image
    ///
    /// # Arguments
    /// * `payload` - Text to encode; may be empty
    ///
    /// # Returns
    /// * `GrayImage` - Exactly `size` x `size` pixels, no quiet zone
    pub fn render(&self, payload: &str) -> GrayImage {
        let Some(code) = self.encode(payload) else {
            return self.placeholder();
        };

        let image = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .min_dimensions(self.size, self.size)
            .build();

        if image.width() == self.size && image.height() == self.size {
            image
        } else {
            imageops::resize(&image, self.size, self.size, FilterType::Nearest)
        }
    }

    /// Encodes `payload` as an inline SVG element of `size` x `size` pixels
    ///
    /// The code is drawn in module units and stretched to `size` through its
    /// view box, so the element size does not depend on the QR version.
    pub fn render_svg(&self, payload: &str) -> String {
        let Some(code) = self.encode(payload) else {
            return format!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="{0}" height="{0}" viewBox="0 0 {0} {0}"><rect x="0.5" y="0.5" width="{1}" height="{1}" fill="#ffffff" stroke="#e0e0e0"/></svg>"##,
                self.size,
                self.size.saturating_sub(1)
            );
        };

        let modules = code.width();
        let document = code
            .render::<svg::Color>()
            .quiet_zone(false)
            .module_dimensions(1, 1)
            .build();

        // inline markup must not carry the XML declaration
        let element = document
            .find("<svg")
            .map_or(document.as_str(), |start| &document[start..]);
        element.replacen(
            &format!(r#"width="{modules}" height="{modules}""#),
            &format!(r#"width="{0}" height="{0}""#, self.size),
            1,
        )
    }

    fn encode(&self, payload: &str) -> Option<QrCode> {
        match QrCode::new(payload.as_bytes()) {
            Ok(code) => Some(code),
            Err(e) => {
                warn!(
                    "cannot encode payload of {} bytes as QR code ({}); drawing placeholder",
                    payload.len(),
                    e
                );
                None
            }
        }
    }

    fn placeholder(&self) -> GrayImage {
        let last = self.size - 1;
        GrayImage::from_fn(self.size, self.size, |x, y| {
            if x == 0 || y == 0 || x == last || y == last {
                Luma([PLACEHOLDER_BORDER])
            } else {
                Luma([0xFF])
            }
        })
    }
}

impl Default for CodeRenderer {
    fn default() -> Self {
        CodeRenderer::new(100)
    }
}
