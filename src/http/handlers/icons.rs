//! `/icons/<name>`: the device icons listed in the root description.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::imaging::Picture;

const SMALL: u32 = 48;
const LARGE: u32 = 120;

/// Icons rendered once at startup, PNG and JPEG in two sizes.
#[derive(Debug, Clone, Default)]
pub struct Icons {
    sm_png: Vec<u8>,
    lrg_png: Vec<u8>,
    sm_jpg: Vec<u8>,
    lrg_jpg: Vec<u8>,
}

fn draw(size: u32) -> RgbImage {
    let c = size as f32 / 2.0;
    let r = size as f32 * 0.32;
    RgbImage::from_fn(size, size, |x, y| {
        let (dx, dy) = (x as f32 + 0.5 - c, y as f32 + 0.5 - c);
        let d = (dx * dx + dy * dy).sqrt();
        if d < r * 0.3 {
            Rgb([24, 38, 64])
        } else if d < r {
            Rgb([236, 240, 245])
        } else {
            Rgb([24, 38, 64])
        }
    })
}

fn png(img: &RgbImage) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone()).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

impl Icons {
    pub fn generate() -> image::ImageResult<Self> {
        let small = draw(SMALL);
        let large = draw(LARGE);
        Ok(Self {
            sm_png: png(&small)?,
            lrg_png: png(&large)?,
            sm_jpg: Picture::from_rgb(small).to_jpeg()?,
            lrg_jpg: Picture::from_rgb(large).to_jpeg()?,
        })
    }

    /// MIME type and bytes for `name`.
    pub fn get(&self, name: &str) -> Option<(&'static str, &[u8])> {
        let (mime, data) = match name {
            "sm.png" => ("image/png", &self.sm_png),
            "lrg.png" => ("image/png", &self.lrg_png),
            "sm.jpg" => ("image/jpeg", &self.sm_jpg),
            "lrg.jpg" => ("image/jpeg", &self.lrg_jpg),
            _ => return None,
        };
        (!data.is_empty()).then_some((mime, data.as_slice()))
    }

    pub fn serve(&self, name: &str) -> Response {
        match self.get(name) {
            Some((mime, data)) => {
                tracing::debug!(icon = %name, "Sending icon");
                ResponseBuilder::new(StatusCode::Ok)
                    .header("Content-Type", mime)
                    .body(data.to_vec())
                    .build()
            }
            None => {
                tracing::warn!(icon = %name, "Invalid icon request");
                Response::not_found()
            }
        }
    }
}
