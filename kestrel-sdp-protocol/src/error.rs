use std::error;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A line is not of the form `<key>=<value>` with a single character key.
    LineMalformed { line: String },
    /// A field line appeared before the `v=` line that opens the session.
    NoOpenBlock { line: String },
    /// A required field is not present, such as `m=` on a media description
    /// or `v=` on the whole document.
    FieldMissing { key: char },
    /// The `m=` line does not have four parts or its port is not numeric.
    MediaLineInvalid { value: String },
    /// The `a=rtpmap:` attribute is not `<pt> <name>/<rate>[/<params>]`.
    RtpmapInvalid { value: String },
    /// The description is not valid UTF-8 text.
    Encoding,
    /// Reading lines from the underlying source failed.
    Source(kestrel_rtsp_protocol::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LineMalformed { line } => write!(f, "sdp line malformed: {line}"),
            Error::NoOpenBlock { line } => {
                write!(f, "sdp field before version line: {line}")
            }
            Error::FieldMissing { key } => write!(f, "sdp field missing: {key}="),
            Error::MediaLineInvalid { value } => write!(f, "sdp media line invalid: {value}"),
            Error::RtpmapInvalid { value } => write!(f, "sdp rtpmap invalid: {value}"),
            Error::Encoding => write!(f, "encoding incorrect"),
            Error::Source(err) => write!(f, "failed to read description: {err}"),
        }
    }
}

impl From<kestrel_rtsp_protocol::Error> for Error {
    fn from(error: kestrel_rtsp_protocol::Error) -> Self {
        match error {
            kestrel_rtsp_protocol::Error::Encoding => Error::Encoding,
            error => Error::Source(error),
        }
    }
}

impl error::Error for Error {}
