use bytes::BytesMut;

use super::{
    error::{Error, Result},
    line::{take_line, LineSource},
    message::{Bytes, Headers, Message, Method, StatusCode, Version},
    request::{Request, RequestMetadata},
    response::{Response, ResponseMetadata},
};

pub type RequestParser = Parser<Request>;
pub type ResponseParser = Parser<Response>;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Status {
    Hungry,
    Done,
}

/// Incremental, line at a time message parser.
///
/// The parser can be driven by pushing lines ([`Parser::push_line`]), by
/// handing it a buffer of bytes as they arrive ([`Parser::parse`]), or by
/// letting it pull from a [`LineSource`] ([`Parser::read_from`]).
pub struct Parser<M: Message> {
    state: State,
    metadata: Option<M::Metadata>,
    headers: Headers,
    body: Option<Bytes>,
}

impl<M: Message> Parser<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Head(Head::FirstLine),
            metadata: None,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Whether the parser has consumed anything that belongs to a message.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.state != State::Head(Head::FirstLine)
    }

    /// Push a single line with its terminator already stripped.
    pub fn push_line(&mut self, line: &str) -> Result<Status> {
        match self.state {
            State::Head(Head::FirstLine) => {
                // Empty lines in between messages are tolerated.
                if !line.is_empty() {
                    self.metadata = Some(M::Metadata::parse(line)?);
                    self.state = State::Head(Head::Header);
                }
            }
            State::Head(Head::Header) => {
                if line.is_empty() {
                    // The line is empty, so we got CRLF, which signals end of
                    // headers for this message.
                    self.end_head()?;
                } else {
                    let (var, val) = parse_header(line)?;
                    self.headers.insert(var, val);
                }
            }
            State::Body(_) | State::Done => {}
        }
        Ok(self.status())
    }

    /// Parse as much of `buffer` as possible. Consumed bytes are removed from
    /// the buffer; bytes belonging to the next message are left in place.
    pub fn parse(&mut self, buffer: &mut BytesMut) -> Result<Status> {
        while let State::Head(_) = self.state {
            match take_line(buffer) {
                Some(line) => {
                    self.push_line(&line?)?;
                }
                None => return Ok(Status::Hungry),
            }
        }

        if let State::Body(need) = self.state {
            if buffer.len() >= need {
                self.body = Some(buffer.split_to(need).freeze());
                self.state = State::Done;
            }
        }

        Ok(self.status())
    }

    /// Read one full message from `source`.
    ///
    /// The end of the stream after the first line counts as the end of the
    /// head. The end of the stream before the first line, or in the middle
    /// of a body, is reported as [`Error::IncompleteMessage`].
    pub fn read_from(mut self, source: &mut impl LineSource) -> Result<M> {
        while let State::Head(head) = self.state {
            match source.read_line()? {
                Some(line) => {
                    self.push_line(&line)?;
                }
                None if head == Head::Header => self.end_head()?,
                None => return Err(Error::IncompleteMessage),
            }
        }

        if let State::Body(need) = self.state {
            self.body = Some(source.read_bytes(need)?);
            self.state = State::Done;
        }

        self.into_message()
    }

    pub fn into_message(self) -> Result<M> {
        match (self.state, self.metadata) {
            (State::Done, Some(metadata)) => M::new(metadata, self.headers, self.body),
            _ => Err(Error::IncompleteMessage),
        }
    }

    fn end_head(&mut self) -> Result<()> {
        self.state = match self.content_length()? {
            Some(need) if need > 0 => State::Body(need),
            _ => State::Done,
        };
        Ok(())
    }

    fn content_length(&self) -> Result<Option<usize>> {
        self.headers
            .get("Content-Length")
            .map(|value| {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| Error::ContentLengthInvalid {
                        value: value.to_string(),
                    })
            })
            .transpose()
    }

    fn status(&self) -> Status {
        match self.state {
            State::Done => Status::Done,
            _ => Status::Hungry,
        }
    }
}

impl<M: Message> Default for Parser<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    Head(Head),
    /// Head is done, waiting for this many body bytes.
    Body(usize),
    Done,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Head {
    FirstLine,
    Header,
}

pub trait Parse: Sized {
    fn parse(line: &str) -> Result<Self>;
}

impl Parse for RequestMetadata {
    fn parse(line: &str) -> Result<RequestMetadata> {
        // Request-Line = Method SP Request-URI SP RTSP-Version CRLF
        match *line.split(' ').collect::<Vec<_>>().as_slice() {
            [method, uri, version] => {
                let version = Version::parse(version, line)?;
                let method = method.parse::<Method>().unwrap_or_else(|never| match never {});
                Ok(RequestMetadata::new(method, uri.to_string(), version))
            }
            _ => Err(Error::RequestLineMalformed {
                line: line.to_string(),
            }),
        }
    }
}

impl Parse for ResponseMetadata {
    fn parse(line: &str) -> Result<ResponseMetadata> {
        // Status-Line = RTSP-Version SP Status-Code SP Reason-Phrase CRLF
        let mut parts = line.splitn(3, ' ');
        let (Some(version), Some(status_code), Some(reason)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::StatusLineMalformed {
                line: line.to_string(),
            });
        };

        let version = Version::parse(version, line)?;
        let status = parse_status_code(status_code).ok_or_else(|| Error::StatusCodeInvalid {
            line: line.to_string(),
            status_code: status_code.to_string(),
        })?;

        Ok(ResponseMetadata::new(version, status, reason.to_string()))
    }
}

fn parse_status_code(part: &str) -> Option<StatusCode> {
    if part.len() == 3 && part.bytes().all(|b| b.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

/// Split a header line on the first `": "` into name and value.
pub fn parse_header(line: &str) -> Result<(&str, &str)> {
    line.split_once(": ")
        .ok_or_else(|| Error::HeaderMalformed {
            line: line.to_string(),
        })
}
