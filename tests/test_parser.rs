use mediaserve::http::parser::{MAX_BODY_BYTES, MAX_HEADER_BYTES, ParseError, Progress, parse_http_request, parse_request};
use mediaserve::http::request::{Method, TransferMode};

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_soap_post_with_body() {
    let req = b"POST /ctl/ContentDir HTTP/1.1\r\nHost: localhost\r\n\
        SOAPAction: \"urn:schemas-upnp-org:service:ContentDirectory:1#Browse\"\r\n\
        Content-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(
        parsed.fields.soap_action.as_deref(),
        Some("urn:schemas-upnp-org:service:ContentDirectory:1#Browse")
    );
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_dlna_headers() {
    let req = b"GET /MediaItems/7.mp3 HTTP/1.1\r\nHost: 10.0.0.2:8200\r\n\
        User-Agent: Xbox/2.0.4548.0 UPnP/1.0 Xbox/2.0.4548.0\r\n\
        Range: bytes=100-\r\ntransferMode.dlna.org: Streaming\r\n\
        getcontentFeatures.dlna.org: 1\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    let range = parsed.fields.range.unwrap();
    assert_eq!(range.start, 100);
    assert_eq!(range.end, None);
    assert_eq!(parsed.fields.transfer_mode, TransferMode::Streaming);
    assert!(parsed.is_valid());
}

#[test]
fn test_parse_absolute_target_is_reduced_to_path() {
    let req = b"GET http://10.0.0.2:8200/AlbumArt/3-7.jpg HTTP/1.1\r\nHost: x\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/AlbumArt/3-7.jpg");
}

#[test]
fn test_parse_request_with_query_string() {
    let req = b"GET /Resized/5.jpg?width=160&height=120 HTTP/1.1\r\nHost: x\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/Resized/5.jpg?width=160&height=120");
    assert_eq!(parsed.path_only(), "/Resized/5.jpg");
}

#[test]
fn test_parse_incomplete_headers() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";

    assert!(matches!(parse_request(req), Ok(Progress::NeedHeaders)));
    assert!(matches!(parse_http_request(req), Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_post_waits_for_body() {
    let req = b"POST /ctl HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";

    assert!(matches!(parse_request(req), Ok(Progress::NeedBody)));
}

#[test]
fn test_parse_get_does_not_wait_for_body() {
    let req = b"GET / HTTP/1.1\r\nHost: x\r\nContent-Length: 10\r\n\r\nhel";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, b"hel".to_vec());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_chunked_body_in_pieces() {
    let head = b"POST /ctl HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();

    let mut buf = head.clone();
    buf.extend_from_slice(b"5\r\nhello\r\n");
    assert!(matches!(parse_request(&buf), Ok(Progress::NeedChunks)));

    buf.extend_from_slice(b"6\r\n world\r\n0\r\n\r\n");
    let (parsed, consumed) = parse_http_request(&buf).unwrap();
    assert_eq!(parsed.body, b"hello world".to_vec());
    assert_eq!(consumed, buf.len());
}

#[test]
fn test_parse_unknown_method_is_kept() {
    let req = b"PROPFIND / HTTP/1.1\r\nHost: x\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::Other("PROPFIND".to_string()));
}

#[test]
fn test_parse_gena_methods() {
    for (name, expected) in [("SUBSCRIBE", Method::SUBSCRIBE), ("UNSUBSCRIBE", Method::UNSUBSCRIBE)] {
        let req = format!("{name} /evt/ContentDir HTTP/1.1\r\nHost: x\r\n\r\n");
        let (parsed, _) = parse_http_request(req.as_bytes()).unwrap();
        assert_eq!(parsed.method, expected);
    }
}

#[test]
fn test_parse_skips_header_without_colon() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.len(), 1);
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert!(parsed.fields.host);
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_invalid_content_length() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidContentLength);
}

#[test]
fn test_parse_short_request_line() {
    let req = b"GET /\r\nHost: x\r\n\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidRequest);
}

#[test]
fn test_parse_bad_chunk() {
    let req = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nxyz\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidChunk);
}

#[test]
fn test_parse_oversized_headers() {
    let mut req = b"GET / HTTP/1.1\r\nX-Filler: ".to_vec();
    req.resize(MAX_HEADER_BYTES + 1, b'a');

    assert_eq!(parse_http_request(&req).unwrap_err(), ParseError::HeadersTooLarge);
}

#[test]
fn test_parse_oversized_post_body() {
    let req = format!("POST /ctl HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_BODY_BYTES + 1);

    assert_eq!(parse_http_request(req.as_bytes()).unwrap_err(), ParseError::BodyTooLarge);
}

#[test]
fn test_parse_oversized_chunked_body() {
    let mut req = b"POST /ctl HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    for _ in 0..=MAX_BODY_BYTES / 1024 {
        req.extend_from_slice(b"400\r\n");
        req.extend(std::iter::repeat_n(b'x', 1024));
        req.extend_from_slice(b"\r\n");
    }

    assert_eq!(parse_http_request(&req).unwrap_err(), ParseError::BodyTooLarge);
}

#[test]
fn test_parse_body_at_limit_waits() {
    let req = format!("POST /ctl HTTP/1.1\r\nContent-Length: {MAX_BODY_BYTES}\r\n\r\n");

    assert!(matches!(parse_request(req.as_bytes()).unwrap(), Progress::NeedBody));
}
