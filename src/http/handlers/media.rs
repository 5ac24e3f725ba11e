//! `/MediaItems/<id>`: the media file itself, with byte ranges.

use std::fs::File;

use crate::db::Database;
use crate::http::handlers::object_id;
use crate::http::request::{ByteRange, Request, TransferMode};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

#[derive(Debug)]
struct Item {
    path: String,
    mime: String,
    dlna_pn: Option<String>,
}

fn lookup(db: &Database, id: i64) -> Option<Item> {
    let rows = db
        .query_rows(
            "SELECT PATH, MIME, DLNA_PN FROM DETAILS WHERE ID = ?1",
            &[&id],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .ok()?;

    let (path, mime, dlna_pn) = rows.into_iter().next()?;
    Some(Item {
        path: path?,
        mime: mime.unwrap_or_else(|| "application/octet-stream".to_string()),
        dlna_pn: dlna_pn.filter(|p| !p.is_empty()),
    })
}

/// Inclusive byte span picked out of a file of `size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Validates `range` against the file size.
///
/// Start after end is a 400, a start at or past the end of the file a 416;
/// an end beyond the file is clamped.
pub fn resolve_range(range: ByteRange, size: u64) -> Result<Span, Response> {
    if let Some(end) = range.end {
        if range.start > end {
            tracing::warn!(start = range.start, end, "Specified range was invalid");
            return Err(Response::bad_request());
        }
    }
    if range.start >= size {
        tracing::warn!(start = range.start, size, "Specified range was outside file boundaries");
        return Err(Response::range_not_satisfiable());
    }

    let last = size - 1;
    let end = range.end.map_or(last, |e| e.min(last));
    Ok(Span {
        start: range.start,
        end,
    })
}

/// Streaming for audio/video unless the client asked otherwise; Background
/// is only honoured for images.
fn transfer_mode(requested: TransferMode, mime: &str) -> Option<TransferMode> {
    let is_image = mime.starts_with("image");
    match requested {
        TransferMode::Streaming => Some(TransferMode::Streaming),
        TransferMode::Background => is_image.then_some(TransferMode::Background),
        _ if mime.starts_with("video") || mime.starts_with("audio") => Some(TransferMode::Streaming),
        _ => Some(TransferMode::Interactive),
    }
}

pub fn serve_item(db: &Database, object: &str, req: &Request) -> Response {
    let Some(item) = object_id(object).and_then(|id| lookup(db, id)) else {
        tracing::warn!(object = %object, "Media item not found, responding 404");
        return Response::not_found();
    };
    tracing::info!(object = %object, path = %item.path, "Serving media item");

    let fields = &req.fields;
    let is_image = item.mime.starts_with("image");

    if fields.transfer_mode == TransferMode::Streaming && is_image {
        tracing::warn!("Client asked for Streaming transfer of an image");
        return Response::not_acceptable();
    }
    if fields.transfer_mode == TransferMode::Interactive {
        if fields.real_time_info {
            tracing::warn!("realTimeInfo flag on an Interactive request");
            return Response::bad_request();
        }
        if !is_image {
            tracing::warn!("Client asked for Interactive transfer of a non-image");
            return Response::not_acceptable();
        }
    }

    let file = match File::open(&item.path) {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(path = %item.path, error = %e, "Error opening media file");
            return Response::not_found();
        }
    };
    let size = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::error!(path = %item.path, error = %e, "Cannot stat media file");
            return Response::internal_error();
        }
    };

    let mut builder = match fields.range {
        Some(range) => {
            let span = match resolve_range(range, size) {
                Ok(span) => span,
                Err(resp) => return resp,
            };
            ResponseBuilder::new(StatusCode::PartialContent)
                .header("Content-Range", format!("bytes {}-{}/{}", span.start, span.end, size))
                .file(file, span.start, span.len())
        }
        None => ResponseBuilder::new(StatusCode::Ok).file(file, 0, size),
    };

    builder = builder
        .header("Content-Type", item.mime.as_str())
        .header("Accept-Ranges", "bytes")
        .header("EXT", "");
    if let Some(mode) = transfer_mode(fields.transfer_mode, &item.mime) {
        builder = builder.header("transferMode.dlna.org", mode.as_str());
    }
    if let Some(pn) = &item.dlna_pn {
        builder = builder.header("contentFeatures.dlna.org", format!("DLNA.ORG_PN={pn}"));
    }

    builder.build()
}
