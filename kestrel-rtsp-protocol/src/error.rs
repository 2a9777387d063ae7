use std::convert;
use std::error;
use std::fmt;
use std::io;

use super::machine::State;
use super::message::Method;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A line could not be decoded because the sender did not use valid
    /// UTF-8 text.
    Encoding,
    /// The request line does not consist of exactly three parts separated
    /// by single spaces: method, Request-URI and version.
    RequestLineMalformed { line: String },
    /// The version specifier is incorrect. It should be "RTSP/" followed
    /// by a digit, "." and another digit.
    VersionUnsupported { line: String, version: String },
    /// The response status line does not have a version, status code and
    /// reason phrase.
    StatusLineMalformed { line: String },
    /// The status code is not a 3-digit non-negative number.
    StatusCodeInvalid { line: String, status_code: String },
    /// Header line does not contain the ": " separator.
    HeaderMalformed { line: String },
    /// The message does not carry the required CSeq header.
    CSeqMissing,
    /// The CSeq header is present but its value is not an integer.
    CSeqInvalid { value: String },
    /// The Content-Length header is not an unsigned integer.
    ContentLengthInvalid { value: String },
    /// The stream ended before the message was complete.
    IncompleteMessage,
    /// A Transport item does not start with a protocol/profile specifier or
    /// uses an unknown lower transport.
    TransportMalformed { value: String },
    /// A port parameter is not of the form `N1-N2` with numeric parts.
    PortPairInvalid { value: String },
    /// The Range value is not one of the `smpte`, `npt` or `clock` forms.
    RangeTypeUnknown { value: String },
    /// The Range value has a known type but the time range itself is not
    /// well formed.
    RangeMalformed { value: String },
    /// Anything after the first ";" in a Range value must be `time=...`.
    TimeFieldMalformed { value: String },
    /// An RTP-Info field is not one of `url`, `seq` or `rtptime`.
    RtpInfoFieldUnknown { field: String },
    /// An RTP-Info `seq` or `rtptime` field does not hold a number.
    RtpInfoValueInvalid { field: String },
    /// An RTP-Info item does not have the required `url` field.
    RtpInfoUrlMissing { value: String },
    /// The Session header timeout parameter is not an unsigned integer.
    TimeoutInvalid { value: String },
    /// No transition exists for the method in the current state, and the
    /// method is not one of the state independent ones.
    UnhandledMethodState { method: Method, state: State },
    /// I/O error occurred.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Encoding => write!(f, "encoding incorrect"),
            Error::RequestLineMalformed { line } => {
                write!(f, "request line malformed: {line}")
            }
            Error::VersionUnsupported { line, version } => {
                write!(f, "version unsupported: {version} (in line: {line})")
            }
            Error::StatusLineMalformed { line } => {
                write!(f, "status line malformed: {line}")
            }
            Error::StatusCodeInvalid { line, status_code } => write!(
                f,
                "response has invalid status code: {status_code} (in status line: {line})"
            ),
            Error::HeaderMalformed { line } => write!(f, "header line malformed: {line}"),
            Error::CSeqMissing => write!(f, "message does not have CSeq header"),
            Error::CSeqInvalid { value } => {
                write!(f, "message has invalid value for CSeq: {value}")
            }
            Error::ContentLengthInvalid { value } => {
                write!(f, "message has invalid value for Content-Length: {value}")
            }
            Error::IncompleteMessage => write!(f, "stream ended in the middle of a message"),
            Error::TransportMalformed { value } => write!(f, "transport malformed: {value}"),
            Error::PortPairInvalid { value } => write!(f, "port pair invalid: {value}"),
            Error::RangeTypeUnknown { value } => write!(f, "range type unknown: {value}"),
            Error::RangeMalformed { value } => write!(f, "range malformed: {value}"),
            Error::TimeFieldMalformed { value } => {
                write!(f, "range time field malformed: {value}")
            }
            Error::RtpInfoFieldUnknown { field } => {
                write!(f, "rtp-info field unknown: {field}")
            }
            Error::RtpInfoValueInvalid { field } => {
                write!(f, "rtp-info field has invalid value: {field}")
            }
            Error::RtpInfoUrlMissing { value } => {
                write!(f, "rtp-info item does not have url: {value}")
            }
            Error::TimeoutInvalid { value } => write!(f, "session timeout invalid: {value}"),
            Error::UnhandledMethodState { method, state } => {
                write!(f, "method {method} not handled in state {state}")
            }
            Error::Io(err) => write!(f, "{err}"),
        }
    }
}

impl convert::From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl error::Error for Error {}
