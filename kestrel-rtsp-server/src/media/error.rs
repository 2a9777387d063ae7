use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use kestrel_sdp_protocol as sdp;

#[derive(Debug)]
pub enum Error {
    /// The SDP file of a media item could not be read.
    Io { path: PathBuf, error: io::Error },
    /// The SDP file of a media item is not a valid description.
    Sdp { name: String, error: sdp::Error },
    /// Neither an SDP file nor an encoding was configured.
    DescriptionMissing { name: String },
    /// The description has no media blocks to set up.
    NoStreams { name: String },
    /// Two media items share the same path.
    PathInUse { path: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, error } => {
                write!(f, "failed to read sdp file {}: {error}", path.display())
            }
            Error::Sdp { name, error } => write!(f, "invalid description for {name}: {error}"),
            Error::DescriptionMissing { name } => write!(
                f,
                "media item {name} needs either an sdp file or an encoding"
            ),
            Error::NoStreams { name } => write!(f, "description for {name} has no media"),
            Error::PathInUse { path } => write!(f, "path already registered: {path}"),
        }
    }
}

impl error::Error for Error {}
