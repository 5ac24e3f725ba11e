//! `/Resized/<id>?width=&height=&rotation=&pixelshape=`: an image scaled to
//! fit a box, encoded in memory.

use std::path::Path;

use crate::db::Database;
use crate::exif;
use crate::http::handlers::{JPEG_TN_FEATURES, object_id};
use crate::http::request::{Request, TransferMode};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::imaging::Picture;

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;

/// Boxes at most this large are cut from the EXIF thumbnail when there is one.
const THUMB_MAX_WIDTH: u32 = 160;
const THUMB_MAX_HEIGHT: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub rotation: u32,
    pub pixelshape: Option<String>,
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            rotation: 0,
            pixelshape: None,
        }
    }
}

impl ResizeParams {
    /// Reads the query string; keys are case-insensitive, unknown keys and
    /// unparsable numbers are ignored or read as 0.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, val) in url::form_urlencoded::parse(query.as_bytes()) {
            let number = || val.trim().parse::<u32>().unwrap_or(0);
            if key.eq_ignore_ascii_case("width") {
                params.width = number();
            } else if key.eq_ignore_ascii_case("height") {
                params.height = number();
            } else if key.eq_ignore_ascii_case("rotation") {
                params.rotation = number();
            } else if key.eq_ignore_ascii_case("pixelshape") {
                params.pixelshape = Some(val.to_string());
            }
        }
        params
    }
}

/// Largest size with the source's aspect ratio inside `box_w` x `box_h`,
/// computed with 10-bit fixed point. The box is clipped to the source, so
/// the result is never larger than the picture it came from.
pub fn fit_within(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    let (sw, sh) = (src_w.max(1) as u64, src_h.max(1) as u64);
    let (bw, bh) = ((box_w as u64).min(sw), (box_h as u64).min(sh));

    let mut dst_w = bw;
    let mut dst_h = (((bw << 10) / sw) * sh) >> 10;
    if dst_h > bh {
        dst_h = bh;
        dst_w = (((bh << 10) / sh) * sw) >> 10;
    }
    (dst_w.max(1) as u32, dst_h.max(1) as u32)
}

struct Source {
    path: String,
    has_thumbnail: bool,
}

fn lookup(db: &Database, id: i64) -> Option<Source> {
    let rows = db
        .query_rows(
            "SELECT PATH, RESOLUTION, THUMBNAIL FROM DETAILS WHERE ID = ?1",
            &[&id],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            },
        )
        .ok()?;
    let (path, resolution, thumb) = rows.into_iter().next()?;
    tracing::debug!(id, resolution = ?resolution, "Resize source");
    Some(Source {
        path: path?,
        has_thumbnail: thumb.unwrap_or(0) != 0,
    })
}

pub fn serve_resized(db: &Database, object: &str, req: &Request) -> Response {
    let (id_part, query) = object.split_once('?').unwrap_or((object, ""));
    let params = ResizeParams::from_query(query);
    tracing::debug!(object = %id_part, ?params, "Resize request");

    if req.fields.transfer_mode == TransferMode::Streaming || req.fields.range.is_some() {
        tracing::warn!("Client asked for Streaming transfer of a resized image");
        return Response::not_acceptable();
    }
    if params.width == 0 || params.height == 0 {
        tracing::warn!(width = params.width, height = params.height, "Invalid resize box");
        return Response::bad_request();
    }

    let source = object_id(id_part).and_then(|id| lookup(db, id));
    let Some(source) = source.filter(|s| Path::new(&s.path).exists()) else {
        tracing::error!(object = %id_part, "Didn't find valid file to resize");
        return Response::not_found();
    };
    tracing::info!(object = %id_part, path = %source.path, "Serving resized image");

    let Some(picture) = decode_source(&source, &params) else {
        return Response::not_found();
    };
    let picture = picture.rotate(params.rotation);

    let (dst_w, dst_h) = fit_within(picture.width(), picture.height(), params.width, params.height);
    let jpeg = match picture.resize(dst_w, dst_h).to_jpeg() {
        Ok(jpeg) => jpeg,
        Err(e) => {
            tracing::error!(path = %source.path, error = %e, "Failed to encode resized image");
            return Response::internal_error();
        }
    };
    tracing::info!(path = %source.path, size = jpeg.len(), "Done serving resized image");

    let mut builder = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "image/jpeg")
        .header("EXT", "")
        .header("contentFeatures.dlna.org", JPEG_TN_FEATURES);
    match req.fields.transfer_mode {
        TransferMode::Interactive | TransferMode::Background => {
            builder = builder.header("transferMode.dlna.org", req.fields.transfer_mode.as_str());
        }
        _ => {}
    }
    builder.body(jpeg).build()
}

/// The EXIF thumbnail is much faster to decode than a full photo.
fn decode_source(source: &Source, params: &ResizeParams) -> Option<Picture> {
    let path = Path::new(&source.path);
    let small_box = params.width <= THUMB_MAX_WIDTH && params.height <= THUMB_MAX_HEIGHT;

    let decoded = if small_box && source.has_thumbnail {
        let thumb = exif::thumbnail_from_file(path)?;
        Picture::from_bytes(&thumb)
    } else {
        Picture::open(path)
    };

    decoded
        .inspect_err(|e| tracing::warn!(path = %path.display(), error = %e, "Cannot decode image"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parsing() {
        let p = ResizeParams::from_query("Width=160&height=120&rotation=90&pixelshape=1:1");
        assert_eq!((p.width, p.height, p.rotation), (160, 120, 90));
        assert_eq!(p.pixelshape.as_deref(), Some("1:1"));

        let d = ResizeParams::from_query("");
        assert_eq!((d.width, d.height), (640, 480));
    }

    #[test]
    fn fit_keeps_aspect() {
        assert_eq!(fit_within(1600, 1200, 640, 480), (640, 479));
        assert_eq!(fit_within(1200, 1600, 640, 480), (359, 480));
        assert_eq!(fit_within(2000, 500, 640, 480), (640, 159));
    }

    #[test]
    fn fit_never_grows_the_source() {
        assert_eq!(fit_within(16, 16, 200_000, 200_000), (16, 16));
        assert_eq!(fit_within(16, 8, u32::MAX, u32::MAX), (16, 8));
        assert_eq!(fit_within(100, 50, 640, 40), (79, 40));
    }
}
