use bytes::BytesMut;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::parser::{Progress, parse_request};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::router::Router;
use crate::http::writer::ResponseWriter;

/// Bytes pulled from the socket per read.
pub const READ_CHUNK: usize = 2048;

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    router: Arc<Router>,
}

#[derive(Debug)]
pub enum ConnectionState {
    ReadingHeaders,
    /// POST body shorter than its Content-Length so far.
    ReadingBody,
    ReadingChunkedBody,
    Dispatched(Request),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::ReadingHeaders,
            router,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Serves exactly one request, then closes.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);
            self.state = match state {
                ConnectionState::ReadingHeaders
                | ConnectionState::ReadingBody
                | ConnectionState::ReadingChunkedBody => self.read_more(state).await?,

                ConnectionState::Dispatched(request) => {
                    self.dispatch(request).await?;
                    ConnectionState::Closed
                }

                ConnectionState::Closed => break,
            };
        }

        let _ = self.stream.shutdown().await;
        Ok(())
    }

    /// Reads one chunk and re-parses everything buffered so far.
    async fn read_more(&mut self, current: ConnectionState) -> anyhow::Result<ConnectionState> {
        let mut temp = [0u8; READ_CHUNK];
        let n = match self.stream.read(&mut temp).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(state = ?current, error = %e, "recv failed");
                return Ok(ConnectionState::Closed);
            }
        };

        if n == 0 {
            if !self.buffer.is_empty() {
                tracing::warn!(state = ?current, "HTTP connection closed unexpectedly");
            }
            return Ok(ConnectionState::Closed);
        }

        self.buffer.extend_from_slice(&temp[..n]);

        match parse_request(&self.buffer) {
            Ok(Progress::NeedHeaders) => Ok(ConnectionState::ReadingHeaders),
            Ok(Progress::NeedBody) => Ok(ConnectionState::ReadingBody),
            Ok(Progress::NeedChunks) => {
                tracing::debug!("Chunked request needs more input");
                Ok(ConnectionState::ReadingChunkedBody)
            }
            Ok(Progress::Complete(request, _)) => Ok(ConnectionState::Dispatched(request)),
            Err(e) => {
                tracing::warn!(error = ?e, "Malformed request, responding 400");
                self.send(Response::bad_request(), true).await?;
                Ok(ConnectionState::Closed)
            }
        }
    }

    async fn dispatch(&mut self, request: Request) -> anyhow::Result<()> {
        tracing::debug!(method = %request.method.as_str(), path = %request.path, "HTTP request");

        let include_body = request.method != Method::HEAD;
        let router = Arc::clone(&self.router);

        // handlers touch the database and decode images; keep them off the reactor
        let response = tokio::task::spawn_blocking(move || router.respond(&request))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Request handler panicked");
                Response::internal_error()
            });

        self.send(response, include_body).await
    }

    async fn send(&mut self, response: Response, include_body: bool) -> anyhow::Result<()> {
        tracing::debug!(status = response.status.as_u16(), "HTTP response");
        let mut writer = ResponseWriter::new(response, include_body);
        writer.write_to_stream(&mut self.stream).await
    }
}
