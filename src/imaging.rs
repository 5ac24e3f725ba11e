//! Thin wrapper over the `image` crate: decode, resize, rotate, JPEG encode.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageResult, RgbImage};
use std::io::BufWriter;
use std::path::Path;

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone)]
pub struct Picture {
    inner: DynamicImage,
}

impl Picture {
    pub fn open(path: &Path) -> ImageResult<Self> {
        Ok(Self {
            inner: image::open(path)?,
        })
    }

    pub fn from_bytes(data: &[u8]) -> ImageResult<Self> {
        Ok(Self {
            inner: image::load_from_memory(data)?,
        })
    }

    pub fn from_rgb(img: RgbImage) -> Self {
        Self {
            inner: DynamicImage::ImageRgb8(img),
        }
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Resizes to exactly `width` x `height`; the caller owns the aspect ratio.
    pub fn resize(&self, width: u32, height: u32) -> Self {
        Self {
            inner: self
                .inner
                .resize_exact(width.max(1), height.max(1), FilterType::Triangle),
        }
    }

    /// Rotates clockwise by 90, 180 or 270 degrees; other angles are a no-op.
    pub fn rotate(self, degrees: u32) -> Self {
        let inner = match degrees % 360 {
            90 => self.inner.rotate90(),
            180 => self.inner.rotate180(),
            270 => self.inner.rotate270(),
            _ => self.inner,
        };
        Self { inner }
    }

    pub fn save_jpeg(&self, path: &Path) -> ImageResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(image::ImageError::IoError)?;
        }
        let file = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
        let mut writer = BufWriter::new(file);
        self.encode_into(&mut writer)
    }

    pub fn to_jpeg(&self) -> ImageResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    fn encode_into<W: std::io::Write>(&self, writer: &mut W) -> ImageResult<()> {
        // JPEG has no alpha channel
        let rgb = self.inner.to_rgb8();
        JpegEncoder::new_with_quality(writer, JPEG_QUALITY).encode_image(&rgb)
    }
}
