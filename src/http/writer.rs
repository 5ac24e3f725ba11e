use std::io::{ErrorKind, SeekFrom};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Room reserved for the status line and headers.
const HEADER_ESTIMATE: usize = 512;

/// Largest slice of a file moved per read/write round.
pub const TRANSFER_CHUNK: usize = 64 * 1024;

/// Transient write errors tolerated in a row before giving up.
const SEND_RETRIES: usize = 8;

fn serialize_head(resp: &Response, buf: &mut Vec<u8>) {
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
}

/// Serializes the head and, unless `include_body` is false, an in-memory
/// body. File bodies are never inlined.
pub fn serialize_response(resp: &Response, include_body: bool) -> Vec<u8> {
    let inline = match (&resp.body, include_body) {
        (Body::Bytes(b), true) => b.as_slice(),
        _ => &[][..],
    };
    let mut buf = Vec::with_capacity(HEADER_ESTIMATE + inline.len());
    serialize_head(resp, &mut buf);
    buf.extend_from_slice(inline);
    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
    file: Option<(std::fs::File, u64, u64)>,
}

impl ResponseWriter {
    /// `include_body` is false for HEAD: headers (with the real
    /// Content-Length) go out, the payload does not.
    pub fn new(response: Response, include_body: bool) -> Self {
        let buffer = serialize_response(&response, include_body);
        let file = match response.body {
            Body::File { file, offset, len } if include_body => Some((file, offset, len)),
            _ => None,
        };
        Self {
            buffer,
            written: 0,
            file,
        }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = write_retrying(stream, &self.buffer[self.written..]).await?;
            self.written += n;
        }

        if let Some((file, offset, len)) = self.file.take() {
            let sent = send_file(stream, file, offset, len).await?;
            tracing::debug!(sent, expected = len, "File body sent");
        }

        stream.flush().await?;
        Ok(())
    }
}

/// Copies `len` bytes of `file` from `offset` in bounded rounds.
async fn send_file<W>(stream: &mut W, file: std::fs::File, offset: u64, len: u64) -> anyhow::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut file = tokio::fs::File::from_std(file);
    file.seek(SeekFrom::Start(offset)).await?;

    let mut chunk = vec![0u8; TRANSFER_CHUNK.min(len.max(1) as usize)];
    let mut remaining = len;
    let mut sent = 0u64;

    while remaining > 0 {
        let want = chunk.len().min(remaining as usize);
        let n = file.read(&mut chunk[..want]).await?;
        if n == 0 {
            tracing::warn!(sent, expected = len, "File ended before the announced length");
            break;
        }

        let mut off = 0;
        while off < n {
            off += write_retrying(stream, &chunk[off..n]).await?;
        }

        remaining -= n as u64;
        sent += n as u64;
    }

    Ok(sent)
}

async fn write_retrying<W>(stream: &mut W, buf: &[u8]) -> anyhow::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut attempts = 0;
    loop {
        match stream.write(buf).await {
            Ok(0) => return Err(anyhow::anyhow!("connection closed while writing")),
            Ok(n) => return Ok(n),
            Err(e) if is_transient(&e) && attempts < SEND_RETRIES => {
                attempts += 1;
                tracing::debug!(attempts, error = %e, "Retrying send");
                tokio::task::yield_now().await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock)
}
