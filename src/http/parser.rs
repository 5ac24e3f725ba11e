use std::collections::HashMap;

use crate::http::cursor::Cursor;
use crate::http::request::{HeaderFields, Method, Request, origin_form};

/// Largest header block accepted before the blank line shows up.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Largest request body, declared or chunked, that is buffered.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidContentLength,
    InvalidChunk,
    HeadersTooLarge,
    BodyTooLarge,
    Incomplete,
}

/// How far a buffer got towards a complete request.
#[derive(Debug)]
pub enum Progress {
    /// No CRLFCRLF yet.
    NeedHeaders,
    /// Headers parsed, POST body shorter than Content-Length.
    NeedBody,
    /// Chunked body missing its terminating zero-size chunk.
    NeedChunks,
    /// Request plus the number of bytes it used.
    Complete(Request, usize),
}

/// Parses a whole request from `buf`, failing with `Incomplete` when more
/// bytes are needed.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    match parse_request(buf)? {
        Progress::Complete(request, consumed) => Ok((request, consumed)),
        _ => Err(ParseError::Incomplete),
    }
}

/// Parses everything received so far.
///
/// Stateless: callers keep appending to the same buffer and call this again,
/// so chunk boundaries are walked from the start of the body every time.
pub fn parse_request(buf: &[u8]) -> Result<Progress, ParseError> {
    let Some(headers_end) = find_headers_end(buf) else {
        if buf.len() > MAX_HEADER_BYTES {
            return Err(ParseError::HeadersTooLarge);
        }
        return Ok(Progress::NeedHeaders);
    };

    // keep the CRLF ending the last header so every line is terminated
    let mut cur = Cursor::new(&buf[..headers_end + 2]);

    let request_line = cur.next_line().ok_or(ParseError::InvalidRequest)?;
    let request_line = std::str::from_utf8(request_line).map_err(|_| ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method = parts.next().ok_or(ParseError::InvalidRequest)?;
    let target = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    let mut headers = HashMap::new();
    let mut fields = HeaderFields::default();

    while let Some(line) = cur.next_line() {
        if line.is_empty() {
            continue;
        }
        let line = String::from_utf8_lossy(line);
        let Some((key, value)) = line.split_once(':') else {
            tracing::debug!(line = %line, "Skipping header line without a colon");
            continue;
        };

        if key.trim().eq_ignore_ascii_case("Content-Length")
            && value.trim().parse::<usize>().is_err()
        {
            return Err(ParseError::InvalidContentLength);
        }

        fields.apply(key, value);
        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    let method = Method::from_str(method);
    let body_start = headers_end + 4;
    let available = &buf[body_start..];

    let (body, consumed) = if fields.chunked {
        if available.len() > MAX_BODY_BYTES {
            return Err(ParseError::BodyTooLarge);
        }
        match decode_chunked(available)? {
            Some((body, used)) => (body, body_start + used),
            None => return Ok(Progress::NeedChunks),
        }
    } else {
        let declared = fields.content_length.unwrap_or(0);
        if method == Method::POST && declared > MAX_BODY_BYTES {
            return Err(ParseError::BodyTooLarge);
        }
        if method == Method::POST && available.len() < declared {
            return Ok(Progress::NeedBody);
        }
        let len = declared.min(available.len());
        (available[..len].to_vec(), body_start + len)
    };

    let request = Request {
        method,
        path: origin_form(target).to_string(),
        version: version.to_string(),
        headers,
        body,
        fields,
    };

    Ok(Progress::Complete(request, consumed))
}

/// Reassembles a chunked body.
///
/// `Ok(None)` while the zero-size chunk has not arrived. The size line may
/// carry `;extensions`; trailers after the last chunk are not waited for.
/// A body growing past [`MAX_BODY_BYTES`] fails with `BodyTooLarge`.
pub fn decode_chunked(data: &[u8]) -> Result<Option<(Vec<u8>, usize)>, ParseError> {
    let mut cur = Cursor::new(data);
    let mut body = Vec::new();

    loop {
        let Some(size_line) = cur.next_line() else {
            return Ok(None);
        };
        let size_line = std::str::from_utf8(size_line).map_err(|_| ParseError::InvalidChunk)?;
        let size_str = size_line
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        let size = usize::from_str_radix(size_str, 16).map_err(|_| ParseError::InvalidChunk)?;

        if size > MAX_BODY_BYTES - body.len() {
            return Err(ParseError::BodyTooLarge);
        }
        if size == 0 {
            cur.expect_crlf();
            return Ok(Some((body, cur.position())));
        }

        let Some(chunk) = cur.take(size) else {
            return Ok(None);
        };
        body.extend_from_slice(chunk);

        if cur.remaining().len() < 2 {
            return Ok(None);
        }
        if !cur.expect_crlf() {
            return Err(ParseError::InvalidChunk);
        }
    }
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}
