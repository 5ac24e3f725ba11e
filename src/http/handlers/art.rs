//! `/AlbumArt/<id>` and `/Thumbnails/<id>`.

use std::fs::File;
use std::path::Path;

use crate::db::Database;
use crate::exif;
use crate::http::handlers::{JPEG_TN_FEATURES, image_transfer_mode, object_id};
use crate::http::request::{Request, TransferMode};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Images are never streamed and never served in pieces.
fn reject_streaming(req: &Request) -> Option<Response> {
    if req.fields.transfer_mode == TransferMode::Streaming || req.fields.range.is_some() {
        tracing::warn!(path = %req.path, "Client asked for Streaming transfer of an image");
        return Some(Response::not_acceptable());
    }
    None
}

fn image_builder(req: &Request) -> ResponseBuilder {
    ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "image/jpeg")
        .header("EXT", "")
        .header("contentFeatures.dlna.org", JPEG_TN_FEATURES)
        .header(
            "transferMode.dlna.org",
            image_transfer_mode(req.fields.transfer_mode).as_str(),
        )
}

/// Streams a cached cover from the `ALBUM_ART` table.
pub fn serve_album_art(db: &Database, object: &str, req: &Request) -> Response {
    if let Some(resp) = reject_streaming(req) {
        return resp;
    }

    let path = object_id(object).and_then(|id| {
        db.query_text("SELECT PATH FROM ALBUM_ART WHERE ID = ?1", &[&id])
            .ok()
            .flatten()
    });
    let Some(path) = path else {
        tracing::warn!(object = %object, "ALBUM_ART id not found, responding 404");
        return Response::not_found();
    };
    tracing::info!(object = %object, path = %path, "Serving album art");

    let (file, size) = match open_with_size(Path::new(&path)) {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Error opening album art");
            return Response::not_found();
        }
    };

    image_builder(req).file(file, 0, size).build()
}

/// Sends the EXIF thumbnail embedded in an item's image file.
pub fn serve_thumbnail(db: &Database, object: &str, req: &Request) -> Response {
    if let Some(resp) = reject_streaming(req) {
        return resp;
    }

    let path = object_id(object).and_then(|id| {
        db.query_text("SELECT PATH FROM DETAILS WHERE ID = ?1", &[&id])
            .ok()
            .flatten()
    });
    let Some(path) = path else {
        tracing::warn!(object = %object, "Thumbnail object not found, responding 404");
        return Response::not_found();
    };
    tracing::info!(object = %object, path = %path, "Serving thumbnail");

    match exif::thumbnail_from_file(Path::new(&path)) {
        Some(thumb) => image_builder(req).body(thumb).build(),
        None => {
            tracing::debug!(path = %path, "No embedded thumbnail");
            Response::not_found()
        }
    }
}

fn open_with_size(path: &Path) -> std::io::Result<(File, u64)> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}
