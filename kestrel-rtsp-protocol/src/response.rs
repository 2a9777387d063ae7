use std::fmt;

use super::{
    error::{Error, Result},
    message::{Bytes, CSeq, Headers, Message, Status, StatusCategory, StatusCode, Version},
    request::Request,
    serialize::{LineEnding, Serialize},
};

#[derive(Clone, Debug)]
pub struct Response {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
    pub cseq: Option<CSeq>,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl Message for Response {
    type Metadata = ResponseMetadata;

    fn new(metadata: ResponseMetadata, mut headers: Headers, body: Option<Bytes>) -> Result<Self> {
        let cseq = headers
            .remove("CSeq")
            .map(|cseq| {
                cseq.trim()
                    .parse::<CSeq>()
                    .map_err(|_| Error::CSeqInvalid { value: cseq.clone() })
            })
            .transpose()?;

        Ok(Self {
            version: metadata.version,
            status: metadata.status,
            reason: metadata.reason,
            cseq,
            headers,
            body,
        })
    }
}

impl Response {
    #[must_use]
    pub fn ok() -> ResponseBuilder {
        ResponseBuilder::new(Status::Ok.code(), Status::Ok.reason())
    }

    #[must_use]
    pub fn error(status: Status) -> ResponseBuilder {
        ResponseBuilder::new(status.code(), status.reason())
    }

    /// Start a response with an arbitrary status code and reason phrase.
    #[must_use]
    pub fn with_status(status: StatusCode, reason: &str) -> ResponseBuilder {
        ResponseBuilder::new(status, reason)
    }

    #[must_use]
    pub const fn category(&self) -> StatusCategory {
        StatusCategory::of(self.status)
    }

    /// Produce the wire form: status line, `CSeq`, remaining headers in
    /// insertion order, an empty line, and then the body as is. Lines are
    /// terminated by a single LF.
    #[must_use]
    pub fn generate(&self) -> Bytes {
        self.to_bytes(LineEnding::Lf)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Version: {}, Status Code: {}, Reason Phrase: {}",
            self.version, self.status, &self.reason
        )?;

        if let Some(cseq) = self.cseq {
            write!(f, ", CSeq: {cseq}")?;
        }

        if let Some(body) = &self.body {
            write!(f, " [{} bytes]", body.len())?;
        }

        Ok(())
    }
}

pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    fn new(status: StatusCode, reason: &str) -> Self {
        Self {
            response: Response {
                version: Version::default(),
                status,
                reason: reason.to_string(),
                cseq: None,
                headers: Headers::new(),
                body: None,
            },
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.response.version = version;
        self
    }

    /// Echo the CSeq of the request this is a response to.
    #[must_use]
    pub fn with_cseq_of(self, request: &Request) -> Self {
        self.with_cseq(request.cseq)
    }

    #[must_use]
    pub fn with_cseq(mut self, cseq: CSeq) -> Self {
        self.response.cseq = Some(cseq);
        self
    }

    #[must_use]
    pub fn with_header(mut self, var: impl Into<String>, val: impl ToString) -> Self {
        self.response.headers.insert(var, val.to_string());
        self
    }

    /// Attach a body. Sets `Content-Type` and a matching `Content-Length`.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>, content_type: &str) -> Self {
        let body = body.into();
        self.response.headers.insert("Content-Type", content_type);
        self.response
            .headers
            .insert("Content-Length", body.len().to_string());
        self.response.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_sdp(self, sdp_contents: String) -> Self {
        self.with_body(sdp_contents, "application/sdp")
    }

    #[must_use]
    pub fn build(self) -> Response {
        self.response
    }
}

#[derive(Clone, Debug)]
pub struct ResponseMetadata {
    version: Version,
    status: StatusCode,
    reason: String,
}

impl ResponseMetadata {
    pub(super) const fn new(version: Version, status: StatusCode, reason: String) -> Self {
        Self {
            version,
            status,
            reason,
        }
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
