use std::collections::HashMap;

/// HTTP request methods.
///
/// The server answers GET, HEAD, POST (SOAP control) and the GENA
/// SUBSCRIBE/UNSUBSCRIBE pair. Anything else is kept verbatim so the router
/// can reply 501.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    HEAD,
    SUBSCRIBE,
    UNSUBSCRIBE,
    Other(String),
}

impl Method {
    /// Parses an HTTP method (case-sensitive).
    ///
    /// ```
    /// # use mediaserve::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Method::GET);
    /// assert_eq!(Method::from_str("get"), Method::Other("get".into()));
    /// ```
    pub fn from_str(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "HEAD" => Method::HEAD,
            "SUBSCRIBE" => Method::SUBSCRIBE,
            "UNSUBSCRIBE" => Method::UNSUBSCRIBE,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::HEAD => "HEAD",
            Method::SUBSCRIBE => "SUBSCRIBE",
            Method::UNSUBSCRIBE => "UNSUBSCRIBE",
            Method::Other(s) => s,
        }
    }
}

/// `Range: bytes=start-end`. A missing end means "to the end of the file".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

/// Client families that need special treatment, detected from User-Agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Client {
    #[default]
    Unknown,
    Xbox,
}

/// Value of the `transferMode.dlna.org` request header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferMode {
    #[default]
    Unspecified,
    Streaming,
    Interactive,
    Background,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Unspecified => "",
            TransferMode::Streaming => "Streaming",
            TransferMode::Interactive => "Interactive",
            TransferMode::Background => "Background",
        }
    }
}

/// Header values the server acts on, pulled out of the raw header map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub content_length: Option<usize>,
    /// Quotes stripped.
    pub soap_action: Option<String>,
    /// Contents of the angle brackets.
    pub callback: Option<String>,
    pub sid: Option<String>,
    /// `Second-<n>`; zero when absent or `infinite`.
    pub timeout: u32,
    pub range: Option<ByteRange>,
    pub client: Client,
    pub transfer_mode: TransferMode,
    pub host: bool,
    pub chunked: bool,
    /// Set by a malformed `getcontentFeatures.dlna.org`.
    pub invalid: bool,
    pub time_seek: bool,
    pub real_time_info: bool,
}

impl HeaderFields {
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        let mut fields = Self::default();
        for (name, value) in headers {
            fields.apply(name, value);
        }
        fields
    }

    /// Interprets one header line. Names compare case-insensitively and
    /// unknown headers are ignored.
    pub fn apply(&mut self, name: &str, value: &str) {
        let value = value.trim();
        let is = |h: &str| name.trim().eq_ignore_ascii_case(h);

        if is("Content-Length") {
            self.content_length = value.parse().ok();
        } else if is("SOAPAction") {
            self.soap_action = Some(strip_quotes(value).to_string());
        } else if is("Callback") {
            self.callback = parse_callback(value);
        } else if is("SID") {
            self.sid = value
                .split_whitespace()
                .next()
                .map(str::to_string);
        } else if is("Timeout") {
            if let Some(secs) = strip_prefix_ignore_case(value, "Second-") {
                self.timeout = leading_number(secs) as u32;
            }
        } else if is("Range") {
            if let Some(spec) = strip_prefix_ignore_case(value, "bytes=") {
                self.range = Some(parse_range(spec));
            }
        } else if is("Host") {
            self.host = true;
        } else if is("User-Agent") {
            if strip_prefix_ignore_case(value, "Xbox/").is_some() {
                self.client = Client::Xbox;
            }
        } else if is("Transfer-Encoding") {
            if strip_prefix_ignore_case(value, "chunked").is_some() {
                self.chunked = true;
            }
        } else if is("getcontentFeatures.dlna.org") {
            if value != "1" {
                self.invalid = true;
            }
        } else if is("TimeSeekRange.dlna.org") {
            self.time_seek = true;
        } else if is("realTimeInfo.dlna.org") {
            self.real_time_info = true;
        } else if is("transferMode.dlna.org") {
            for mode in [
                TransferMode::Streaming,
                TransferMode::Interactive,
                TransferMode::Background,
            ] {
                if strip_prefix_ignore_case(value, mode.as_str()).is_some() {
                    self.transfer_mode = mode;
                }
            }
        }
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn parse_callback(value: &str) -> Option<String> {
    let open = value.find('<')?;
    let inner = &value[open + 1..];
    let inner = match inner.find('>') {
        Some(close) => &inner[..close],
        None => inner,
    };
    Some(inner.to_string())
}

/// Digits at the start of `s`, 0 if there are none.
fn leading_number(s: &str) -> u64 {
    let digits = s
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    s[..digits].parse().unwrap_or(0)
}

fn parse_range(spec: &str) -> ByteRange {
    let start = leading_number(spec);
    let end = spec
        .split_once('-')
        .map(|(_, end)| end.trim())
        .filter(|end| end.starts_with(|c: char| c.is_ascii_digit()))
        .map(leading_number);
    ByteRange { start, end }
}

/// Reduces an absolute-form target (`http://host/path`) to its path.
pub fn origin_form(target: &str) -> &str {
    match strip_prefix_ignore_case(target, "http://") {
        Some(rest) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => target,
    }
}

/// Represents a parsed HTTP request from a client.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path and query, always in origin form.
    pub path: String,
    pub version: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub fields: HeaderFields,
}

/// Builder for constructing Request objects.
#[derive(Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let path = self.path.ok_or("path missing")?;
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: origin_form(&path).to_string(),
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            fields: HeaderFields::from_headers(&self.headers),
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring ASCII case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Declared body length; 0 when missing or not a number.
    pub fn content_length(&self) -> usize {
        self.fields.content_length.unwrap_or(0)
    }

    /// Path without the query string.
    pub fn path_only(&self) -> &str {
        self.path
            .split_once('?')
            .map(|(p, _)| p)
            .unwrap_or(&self.path)
    }

    /// HTTP/1.1 requests must name a host, and the DLNA content-features
    /// request must be well formed.
    pub fn is_valid(&self) -> bool {
        !((self.version == "HTTP/1.1" && !self.fields.host) || self.fields.invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, value: &str) -> HeaderFields {
        let mut f = HeaderFields::default();
        f.apply(name, value);
        f
    }

    #[test]
    fn range_forms() {
        assert_eq!(
            fields("Range", "bytes=0-99").range,
            Some(ByteRange { start: 0, end: Some(99) })
        );
        assert_eq!(
            fields("range", "bytes=500-").range,
            Some(ByteRange { start: 500, end: None })
        );
        assert_eq!(fields("Range", "items=1-2").range, None);
    }

    #[test]
    fn upnp_fields() {
        assert_eq!(fields("SOAPAction", "\"urn:x#Browse\"").soap_action.as_deref(), Some("urn:x#Browse"));
        assert_eq!(
            fields("CALLBACK", "<http://10.0.0.2:4000/ev>").callback.as_deref(),
            Some("http://10.0.0.2:4000/ev")
        );
        assert_eq!(fields("Timeout", "Second-1800").timeout, 1800);
        assert_eq!(fields("Timeout", "Second-infinite").timeout, 0);
        assert_eq!(fields("SID", " uuid:abc ").sid.as_deref(), Some("uuid:abc"));
    }

    #[test]
    fn dlna_flags() {
        assert!(fields("getcontentFeatures.dlna.org", "0").invalid);
        assert!(!fields("getcontentFeatures.dlna.org", "1").invalid);
        assert_eq!(fields("transferMode.dlna.org", "Interactive").transfer_mode, TransferMode::Interactive);
        assert_eq!(fields("User-Agent", "Xbox/2.0.4548.0 UPnP/1.0").client, Client::Xbox);
        assert!(fields("Transfer-Encoding", "chunked").chunked);
    }

    #[test]
    fn absolute_target_reduced_to_path() {
        assert_eq!(origin_form("http://192.168.1.2:8200/MediaItems/1.mp3"), "/MediaItems/1.mp3");
        assert_eq!(origin_form("http://host"), "/");
        assert_eq!(origin_form("/rootDesc.xml"), "/rootDesc.xml");
    }
}
