//! Resize-and-cache policy for album art.

use std::path::{Path, PathBuf};

use crate::art::cache::{ArtCache, JPEG_POSTFIX};
use crate::art::error::{ArtError, Result};
use crate::art::size::ImageSize;
use crate::imaging::Picture;

/// Destination dimensions for `size`, keeping the source aspect ratio.
///
/// The longer side is pinned to the class bound and the other side follows
/// from an 8-bit fixed-point ratio. `None` when the ratio degenerates
/// (source far smaller than the bound), which callers treat as "no resize".
pub fn fit_dimensions(src_w: u32, src_h: u32, size: ImageSize) -> Option<(u32, u32)> {
    let spec = size.spec();
    let (w, h) = (src_w as u64, src_h as u64);

    if w > h {
        let dst_w = spec.width as u64;
        let ratio = (w << 8).checked_div(dst_w)?;
        let dst_h = (h << 8).checked_div(ratio)?;
        Some((dst_w as u32, dst_h as u32))
    } else {
        let dst_h = spec.height as u64;
        let ratio = (h << 8).checked_div(dst_h)?;
        let dst_w = (w << 8).checked_div(ratio)?;
        Some((dst_w as u32, dst_h as u32))
    }
}

/// Writes `picture` (decoded from `src_file`) into `dst_file` at `size`.
///
/// Never upsizes: when the target box exceeds the source on both axes the
/// source file is hard-linked, or re-encoded unchanged if linking fails.
pub fn save_resized_to(
    picture: &Picture,
    src_file: &Path,
    dst_file: &Path,
    size: ImageSize,
) -> Result<()> {
    if !size.is_valid() {
        return Err(ArtError::InvalidSize);
    }

    let (w, h) = (picture.width(), picture.height());
    let result = match fit_dimensions(w, h, size) {
        Some((dst_w, dst_h)) if dst_w <= w || dst_h <= h => picture
            .resize(dst_w, dst_h)
            .save_jpeg(dst_file),
        _ => link_or_copy(picture, src_file, dst_file),
    };

    result.map_err(|source| {
        tracing::warn!(
            src = %src_file.display(),
            dst = %dst_file.display(),
            error = %source,
            "Failed to create album art cache"
        );
        ArtError::Encode {
            path: dst_file.to_path_buf(),
            source,
        }
    })
}

fn link_or_copy(picture: &Picture, src_file: &Path, dst_file: &Path) -> image::ImageResult<()> {
    if let Some(parent) = dst_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::hard_link(src_file, dst_file) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(
                src = %src_file.display(),
                dst = %dst_file.display(),
                error = %e,
                "Link failed, saving a copy"
            );
            picture.save_jpeg(dst_file)
        }
    }
}

/// Resizes into the cache slot of `src_file` for `size` and returns it.
pub fn save_resized_to_cache(
    cache: &ArtCache,
    picture: &Picture,
    src_file: &Path,
    size: ImageSize,
) -> Result<PathBuf> {
    if !size.is_valid() {
        return Err(ArtError::InvalidSize);
    }
    let cache_file = cache.cache_path(Some(size), JPEG_POSTFIX, src_file);
    save_resized_to(picture, src_file, &cache_file, size)?;
    Ok(cache_file)
}

/// Decodes `src_file` and writes its `size` variant to `dst_file`.
pub fn save_resized_file(src_file: &Path, dst_file: &Path, size: ImageSize) -> Result<()> {
    let picture = Picture::open(src_file).map_err(|source| ArtError::Decode {
        path: src_file.to_path_buf(),
        source,
    })?;
    save_resized_to(&picture, src_file, dst_file, size)
}
