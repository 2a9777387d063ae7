use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::{
    error::{Error, Result},
    parse::Parse,
    serialize::Serialize,
};

pub use bytes::Bytes;
pub use http::uri::Uri;

pub trait Message: Serialize + Sized {
    type Metadata: Parse;

    fn new(metadata: Self::Metadata, headers: Headers, body: Option<Bytes>) -> Result<Self>;
}

pub type CSeq = i64;

/// Header mapping that keeps headers in the order they were first inserted.
///
/// Names are compared case-insensitively. Inserting a name that is already
/// present replaces its value in place, so the last value wins while the
/// position of the first occurrence is kept.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .map(|index| self.entries[index].1.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .map(|index| self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(var, _)| var.eq_ignore_ascii_case(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Method {
    Describe,
    Announce,
    Setup,
    Play,
    Pause,
    Record,
    Options,
    Redirect,
    Teardown,
    GetParameter,
    SetParameter,
    /// Any other method token. RTSP allows extension methods, so these are
    /// accepted by the parser and left to the handler to refuse.
    Extension(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::Describe => write!(f, "DESCRIBE"),
            Method::Announce => write!(f, "ANNOUNCE"),
            Method::Setup => write!(f, "SETUP"),
            Method::Play => write!(f, "PLAY"),
            Method::Pause => write!(f, "PAUSE"),
            Method::Record => write!(f, "RECORD"),
            Method::Options => write!(f, "OPTIONS"),
            Method::Redirect => write!(f, "REDIRECT"),
            Method::Teardown => write!(f, "TEARDOWN"),
            Method::GetParameter => write!(f, "GET_PARAMETER"),
            Method::SetParameter => write!(f, "SET_PARAMETER"),
            Method::Extension(method) => write!(f, "{method}"),
        }
    }
}

impl FromStr for Method {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "DESCRIBE" => Method::Describe,
            "ANNOUNCE" => Method::Announce,
            "SETUP" => Method::Setup,
            "PLAY" => Method::Play,
            "PAUSE" => Method::Pause,
            "RECORD" => Method::Record,
            "OPTIONS" => Method::Options,
            "REDIRECT" => Method::Redirect,
            "TEARDOWN" => Method::Teardown,
            "GET_PARAMETER" => Method::GetParameter,
            "SET_PARAMETER" => Method::SetParameter,
            other => Method::Extension(other.to_string()),
        })
    }
}

/// Protocol version, `RTSP/<major>.<minor>`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const V1: Version = Version { major: 1, minor: 0 };
    pub const V2: Version = Version { major: 2, minor: 0 };

    /// Parse a version token. `line` is only used for error reporting.
    pub(crate) fn parse(part: &str, line: &str) -> Result<Version> {
        let err = || Error::VersionUnsupported {
            line: line.to_string(),
            version: part.to_string(),
        };
        match part.strip_prefix("RTSP/").map(str::as_bytes) {
            Some(&[major, b'.', minor]) if major.is_ascii_digit() && minor.is_ascii_digit() => {
                Ok(Version {
                    major: major - b'0',
                    minor: minor - b'0',
                })
            }
            _ => Err(err()),
        }
    }
}

impl Default for Version {
    #[inline]
    fn default() -> Version {
        Version::V1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RTSP/{}.{}", self.major, self.minor)
    }
}

pub type StatusCode = u16;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StatusCategory {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
    Unknown,
}

impl StatusCategory {
    /// Classify a status code by its leading digit.
    #[must_use]
    pub const fn of(status: StatusCode) -> StatusCategory {
        match status / 100 {
            1 => StatusCategory::Informational,
            2 => StatusCategory::Success,
            3 => StatusCategory::Redirection,
            4 => StatusCategory::ClientError,
            5 => StatusCategory::ServerError,
            _ => StatusCategory::Unknown,
        }
    }
}

/// Status codes defined by RFC 2326 section 7.1.1.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Status {
    Continue,
    Ok,
    Created,
    LowOnStorageSpace,
    MultipleChoices,
    MovedPermanently,
    MovedTemporarily,
    SeeOther,
    UseProxy,
    BadRequest,
    Unauthorized,
    PaymentRequired,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    ProxyAuthenticationRequired,
    RequestTimeout,
    Gone,
    LengthRequired,
    PreconditionFailed,
    RequestEntityTooLarge,
    RequestUriTooLong,
    UnsupportedMediaType,
    ParameterNotUnderstood,
    ConferenceNotFound,
    NotEnoughBandwidth,
    SessionNotFound,
    MethodNotValidInThisState,
    HeaderFieldNotValidForResource,
    InvalidRange,
    ParameterIsReadOnly,
    AggregateOperationNotAllowed,
    OnlyAggregateOperationAllowed,
    UnsupportedTransport,
    DestinationUnreachable,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    RtspVersionNotSupported,
    OptionNotSupported,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> StatusCode {
        match self {
            Status::Continue => 100,
            Status::Ok => 200,
            Status::Created => 201,
            Status::LowOnStorageSpace => 250,
            Status::MultipleChoices => 300,
            Status::MovedPermanently => 301,
            Status::MovedTemporarily => 302,
            Status::SeeOther => 303,
            Status::UseProxy => 305,
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::PaymentRequired => 402,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::NotAcceptable => 406,
            Status::ProxyAuthenticationRequired => 407,
            Status::RequestTimeout => 408,
            Status::Gone => 410,
            Status::LengthRequired => 411,
            Status::PreconditionFailed => 412,
            Status::RequestEntityTooLarge => 413,
            Status::RequestUriTooLong => 414,
            Status::UnsupportedMediaType => 415,
            Status::ParameterNotUnderstood => 451,
            Status::ConferenceNotFound => 452,
            Status::NotEnoughBandwidth => 453,
            Status::SessionNotFound => 454,
            Status::MethodNotValidInThisState => 455,
            Status::HeaderFieldNotValidForResource => 456,
            Status::InvalidRange => 457,
            Status::ParameterIsReadOnly => 458,
            Status::AggregateOperationNotAllowed => 459,
            Status::OnlyAggregateOperationAllowed => 460,
            Status::UnsupportedTransport => 461,
            Status::DestinationUnreachable => 462,
            Status::InternalServerError => 500,
            Status::NotImplemented => 501,
            Status::BadGateway => 502,
            Status::ServiceUnavailable => 503,
            Status::GatewayTimeout => 504,
            Status::RtspVersionNotSupported => 505,
            Status::OptionNotSupported => 551,
        }
    }

    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Status::Continue => "Continue",
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::LowOnStorageSpace => "Low on Storage Space",
            Status::MultipleChoices => "Multiple Choices",
            Status::MovedPermanently => "Moved Permanently",
            Status::MovedTemporarily => "Moved Temporarily",
            Status::SeeOther => "See Other",
            Status::UseProxy => "Use Proxy",
            Status::BadRequest => "Bad Request",
            Status::Unauthorized => "Unauthorized",
            Status::PaymentRequired => "Payment Required",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::NotAcceptable => "Not Acceptable",
            Status::ProxyAuthenticationRequired => "Proxy Authentication Required",
            Status::RequestTimeout => "Request Timeout",
            Status::Gone => "Gone",
            Status::LengthRequired => "Length Required",
            Status::PreconditionFailed => "Precondition Failed",
            Status::RequestEntityTooLarge => "Request Entity Too Large",
            Status::RequestUriTooLong => "Request-URI Too Long",
            Status::UnsupportedMediaType => "Unsupported Media Type",
            Status::ParameterNotUnderstood => "Parameter Not Understood",
            Status::ConferenceNotFound => "Conference Not Found",
            Status::NotEnoughBandwidth => "Not Enough Bandwidth",
            Status::SessionNotFound => "Session Not Found",
            Status::MethodNotValidInThisState => "Method Not Valid in This State",
            Status::HeaderFieldNotValidForResource => "Header Field Not Valid for Resource",
            Status::InvalidRange => "Invalid Range",
            Status::ParameterIsReadOnly => "Parameter Is Read-Only",
            Status::AggregateOperationNotAllowed => "Aggregate Operation Not Allowed",
            Status::OnlyAggregateOperationAllowed => "Only Aggregate Operation Allowed",
            Status::UnsupportedTransport => "Unsupported Transport",
            Status::DestinationUnreachable => "Destination Unreachable",
            Status::InternalServerError => "Internal Server Error",
            Status::NotImplemented => "Not Implemented",
            Status::BadGateway => "Bad Gateway",
            Status::ServiceUnavailable => "Service Unavailable",
            Status::GatewayTimeout => "Gateway Timeout",
            Status::RtspVersionNotSupported => "RTSP Version Not Supported",
            Status::OptionNotSupported => "Option not supported",
        }
    }
}
