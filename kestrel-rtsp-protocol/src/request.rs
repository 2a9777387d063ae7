use std::fmt;

use super::{
    error::{Error, Result},
    header::{Range, Session, Transport},
    line::LineSource,
    message::{Bytes, CSeq, Headers, Message, Method, Uri, Version},
    parse::RequestParser,
};

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub uri: String,
    pub version: Version,
    pub headers: Headers,
    pub cseq: CSeq,
    pub body: Option<Bytes>,
}

impl Message for Request {
    type Metadata = RequestMetadata;

    fn new(metadata: RequestMetadata, headers: Headers, body: Option<Bytes>) -> Result<Self> {
        let cseq = headers.get("CSeq").ok_or(Error::CSeqMissing)?;
        let cseq = cseq
            .trim()
            .parse::<CSeq>()
            .map_err(|_| Error::CSeqInvalid {
                value: cseq.to_string(),
            })?;

        Ok(Self {
            method: metadata.method,
            uri: metadata.uri,
            version: metadata.version,
            headers,
            cseq,
            body,
        })
    }
}

impl Request {
    /// Read a single request from a line source: the request line, then
    /// header lines up to the first empty line, then the body if there is a
    /// `Content-Length` header.
    pub fn parse(source: &mut impl LineSource) -> Result<Request> {
        RequestParser::new().read_from(source)
    }

    /// Create a request with only the CSeq header set.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>, cseq: CSeq) -> Self {
        let mut headers = Headers::new();
        headers.insert("CSeq", cseq.to_string());
        Self {
            method,
            uri: uri.into(),
            version: Version::default(),
            headers,
            cseq,
            body: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, var: impl Into<String>, val: impl ToString) -> Self {
        self.headers.insert(var, val.to_string());
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Path part of the Request-URI without trailing slash, if the URI is an
    /// absolute URI or a path.
    #[must_use]
    pub fn path(&self) -> Option<String> {
        self.uri
            .parse::<Uri>()
            .ok()
            .map(|uri| uri.path().trim_end_matches('/').to_string())
    }

    #[must_use]
    pub fn require(&self) -> Option<&str> {
        self.header("Require")
    }

    #[must_use]
    pub fn accept(&self) -> Vec<&str> {
        self.header("Accept")
            .map(|val| val.split(',').map(str::trim).collect::<Vec<_>>())
            .unwrap_or_default()
    }

    pub fn session(&self) -> Option<Result<Session>> {
        self.header("Session").map(str::parse)
    }

    pub fn transport(&self) -> Option<Result<Transport>> {
        self.header("Transport").map(str::parse)
    }

    pub fn range(&self) -> Option<Result<Range>> {
        self.header("Range").map(str::parse)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Version: {}, Method: {}, Uri: {}, CSeq: {}",
            self.version, self.method, self.uri, self.cseq
        )?;

        if let Some(body) = &self.body {
            write!(f, " [{} bytes]", body.len())?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct RequestMetadata {
    method: Method,
    uri: String,
    version: Version,
}

impl RequestMetadata {
    pub(super) const fn new(method: Method, uri: String, version: Version) -> Self {
        Self {
            method,
            uri,
            version,
        }
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub const fn version(&self) -> Version {
        self.version
    }
}

#[cfg(test)]
mod tests {

    use super::{Error, Method, Request, Version};
    use crate::line::Lines;

    #[test]
    fn parse_options_request_without_blank_line() {
        let request = "OPTIONS rtsp://127.0.0.1:7776 RTSP/1.0\nCSeq: 1\nUser-Agent: Lavf57.83.100\n";
        let request = Request::parse(&mut Lines::new(request.as_bytes())).unwrap();
        assert_eq!(request.method, Method::Options);
        assert_eq!(request.uri, "rtsp://127.0.0.1:7776");
        assert_eq!(request.version, Version::V1);
        assert_eq!(request.cseq, 1);
        assert_eq!(request.header("User-Agent"), Some("Lavf57.83.100"));
    }

    #[test]
    fn parse_options_request_any() {
        let request = b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\nRequire: implicit-play\r\n\r\n";
        let request = Request::parse(&mut Lines::new(request.as_slice())).unwrap();
        assert_eq!(request.uri, "*");
        assert_eq!(request.require(), Some("implicit-play"));
        assert!(request.body.is_none());
    }

    #[test]
    fn parse_duplicate_header_last_wins() {
        let request = b"DESCRIBE rtsp://example.com/media.mp4 RTSP/1.0\nCSeq: 2\nAccept: text/plain\nAccept: application/sdp, text/plain\n\n";
        let request = Request::parse(&mut Lines::new(request.as_slice())).unwrap();
        assert_eq!(request.method, Method::Describe);
        assert_eq!(request.accept(), vec!["application/sdp", "text/plain"]);
    }

    #[test]
    fn parse_missing_cseq() {
        let request = b"OPTIONS * RTSP/1.0\nUser-Agent: test\n\n";
        assert!(matches!(
            Request::parse(&mut Lines::new(request.as_slice())),
            Err(Error::CSeqMissing),
        ));
    }

    #[test]
    fn parse_invalid_cseq() {
        let request = b"OPTIONS * RTSP/1.0\nCSeq: one\n\n";
        assert!(matches!(
            Request::parse(&mut Lines::new(request.as_slice())),
            Err(Error::CSeqInvalid { value }) if value == "one",
        ));
    }

    #[test]
    fn parse_malformed_header() {
        let request = b"OPTIONS * RTSP/1.0\nCSeq: 1\nBroken\n\n";
        assert!(matches!(
            Request::parse(&mut Lines::new(request.as_slice())),
            Err(Error::HeaderMalformed { .. }),
        ));
    }

    #[test]
    fn path_of_absolute_uri() {
        let request = Request::new(Method::Setup, "rtsp://example.com:554/live/front/trackID=0/", 3);
        assert_eq!(request.path().as_deref(), Some("/live/front/trackID=0"));
    }

    #[test]
    fn typed_headers() {
        let request = Request::new(Method::Setup, "rtsp://example.com/live", 3)
            .with_header("Transport", "RTP/AVP;unicast;client_port=4588-4589")
            .with_header("Session", "12345678;timeout=60")
            .with_header("Range", "npt=now-");

        let transport = request.transport().unwrap().unwrap();
        assert_eq!(transport.items()[0].client_port.unwrap().rtp, 4588);
        assert_eq!(request.session().unwrap().unwrap().id, "12345678");
        assert!(request.range().unwrap().is_ok());
    }
}
