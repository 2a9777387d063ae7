//! Line codec shared by RTSP message parsing and SDP parsing.
//!
//! Both protocols are line oriented text over an arbitrary byte source.
//! Lines may be terminated by CRLF or by a bare LF; the terminator is never
//! part of the returned line.

use std::io::{self, BufRead};

use bytes::{Bytes, BytesMut};

use super::error::{Error, Result};

const LN: u8 = b'\n';
const CR: u8 = b'\r';

/// Pull based source of lines.
pub trait LineSource {
    /// Read the next line. Returns `Ok(None)` once the end of the stream
    /// is reached; transport failures are reported as errors.
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Read exactly `len` raw bytes that follow the last line read, for
    /// message bodies.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes>;
}

/// Line source over any buffered reader, including `&[u8]`.
///
/// A final line without terminator is still returned as a line, so that
/// documents which do not end in a newline can be read in full.
pub struct Lines<R> {
    inner: R,
}

impl<R: BufRead> Lines<R> {
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> LineSource for Lines<R> {
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = Vec::new();
        if self.inner.read_until(LN, &mut line)? == 0 {
            return Ok(None);
        }
        strip_terminator(&mut line);
        String::from_utf8(line)
            .map(Some)
            .map_err(|_| Error::Encoding)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let mut body = vec![0_u8; len];
        self.inner.read_exact(&mut body).map_err(|err| {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                Error::IncompleteMessage
            } else {
                Error::Io(err)
            }
        })?;
        Ok(body.into())
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

/// Take one complete line from the front of `buf`.
///
/// Returns `None` when `buf` does not hold a full line yet, in which case
/// nothing is consumed. Used for incremental parsing of data as it arrives
/// from a connection.
pub fn take_line(buf: &mut BytesMut) -> Option<Result<String>> {
    let end = buf.iter().position(|b| *b == LN)?;
    let mut line = buf.split_to(end + 1).to_vec();
    strip_terminator(&mut line);
    Some(String::from_utf8(line).map_err(|_| Error::Encoding))
}

fn strip_terminator(line: &mut Vec<u8>) {
    if line.last() == Some(&LN) {
        line.pop();
        if line.last() == Some(&CR) {
            line.pop();
        }
    }
}
