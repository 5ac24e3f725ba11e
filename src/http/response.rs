use std::collections::HashMap;
use std::fs::File;

/// Banner sent in every `Server:` header.
pub const SERVER_STRING: &str = "mediaserve/0.1, UPnP/1.0, DLNADOC/1.50";

/// HTTP status codes the server answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 206 Partial Content
    PartialContent,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 406 Not Acceptable
    NotAcceptable,
    /// 412 Precondition Failed
    PreconditionFailed,
    /// 416 Requested Range Not Satisfiable
    RangeNotSatisfiable,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use mediaserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::PartialContent.as_u16(), 206);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::PartialContent => 206,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::NotAcceptable => 406,
            StatusCode::PreconditionFailed => 412,
            StatusCode::RangeNotSatisfiable => 416,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::PartialContent => "Partial Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::NotAcceptable => "Not Acceptable",
            StatusCode::PreconditionFailed => "Precondition Failed",
            StatusCode::RangeNotSatisfiable => "Requested Range Not Satisfiable",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// Response payload.
#[derive(Debug)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    /// `len` bytes of `file` starting at `offset`, streamed by the writer.
    File { file: File, offset: u64, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Empty => 0,
            Body::Bytes(b) => b.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// In-memory bytes; `None` for file bodies.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Empty => Some(&[][..]),
            Body::Bytes(b) => Some(b.as_slice()),
            Body::File { .. } => None,
        }
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/xml; charset=\"utf-8\"")
///     .body(xml.into_bytes())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Body,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Body::Empty,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Body::Bytes(body);
        self
    }

    pub fn file(mut self, file: File, offset: u64, len: u64) -> Self {
        self.body = Body::File { file, offset, len };
        self
    }

    /// Builds the final Response.
    ///
    /// Fills in `Content-Length` from the body, plus `Connection: close`,
    /// `Date` and `Server`, unless already set.
    pub fn build(mut self) -> Response {
        let len = self.body.len();
        self.headers
            .entry("Content-Length".to_string())
            .or_insert_with(|| len.to_string());
        self.headers
            .entry("Connection".to_string())
            .or_insert_with(|| "close".to_string());
        self.headers
            .entry("Date".to_string())
            .or_insert_with(http_date);
        self.headers
            .entry("Server".to_string())
            .or_insert_with(|| SERVER_STRING.to_string());

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Current time in RFC 1123 form.
pub fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

const BODY_400: &str = "<HTML><HEAD><TITLE>400 Bad Request</TITLE></HEAD>\
    <BODY><H1>Bad Request</H1>The request is invalid for this HTTP version.</BODY></HTML>\r\n";
const BODY_404: &str = "<HTML><HEAD><TITLE>404 Not Found</TITLE></HEAD>\
    <BODY><H1>Not Found</H1>The requested URL was not found on this server.</BODY></HTML>\r\n";
const BODY_406: &str = "<HTML><HEAD><TITLE>406 Not Acceptable</TITLE></HEAD>\
    <BODY><H1>Not Acceptable</H1>An unsupported operation was requested.</BODY></HTML>\r\n";
const BODY_416: &str = "<HTML><HEAD><TITLE>416 Requested Range Not Satisfiable</TITLE></HEAD>\
    <BODY><H1>Requested Range Not Satisfiable</H1>The requested range was outside the file's size.</BODY></HTML>\r\n";
const BODY_500: &str = "<HTML><HEAD><TITLE>Error 500</TITLE></HEAD><BODY>Internal Server Error</BODY></HTML>\r\n";
const BODY_501: &str = "<HTML><HEAD><TITLE>501 Not Implemented</TITLE></HEAD>\
    <BODY><H1>Not Implemented</H1>The HTTP Method is not implemented by this server.</BODY></HTML>\r\n";

pub const XML_CONTENT_TYPE: &str = "text/xml; charset=\"utf-8\"";

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .body(body.into())
            .build()
    }

    /// 200 with a UTF-8 XML body.
    pub fn xml(body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", XML_CONTENT_TYPE)
            .body(body.into())
            .build()
    }

    fn html(status: StatusCode, body: &str) -> Self {
        ResponseBuilder::new(status)
            .header("Content-Type", "text/html")
            .body(body.as_bytes().to_vec())
            .build()
    }

    pub fn bad_request() -> Self {
        Self::html(StatusCode::BadRequest, BODY_400)
    }

    pub fn not_found() -> Self {
        Self::html(StatusCode::NotFound, BODY_404)
    }

    pub fn not_acceptable() -> Self {
        Self::html(StatusCode::NotAcceptable, BODY_406)
    }

    pub fn range_not_satisfiable() -> Self {
        Self::html(StatusCode::RangeNotSatisfiable, BODY_416)
    }

    pub fn internal_error() -> Self {
        Self::html(StatusCode::InternalServerError, BODY_500)
    }

    pub fn not_implemented() -> Self {
        Self::html(StatusCode::NotImplemented, BODY_501)
    }

    pub fn precondition_failed() -> Self {
        ResponseBuilder::new(StatusCode::PreconditionFailed)
            .header("Content-Type", XML_CONTENT_TYPE)
            .build()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
