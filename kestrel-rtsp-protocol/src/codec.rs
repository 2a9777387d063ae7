use tokio_util::codec::{Decoder, Encoder};

use bytes::BytesMut;

use super::{
    error::Error,
    message::Message,
    parse::{Parser, Status},
    request::Request,
    response::Response,
    serialize::{LineEnding, Serialize},
};

pub trait Target {
    type Send: Message + Serialize;
    type Receive: Message;
}

pub struct AsClient;

impl Target for AsClient {
    type Send = Request;
    type Receive = Response;
}

pub struct AsServer;

impl Target for AsServer {
    type Send = Response;
    type Receive = Request;
}

/// Framing codec for RTSP messages on a byte stream.
pub struct Codec<T: Target> {
    parser: Parser<T::Receive>,
    ending: LineEnding,
}

impl<T: Target> Codec<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            ending: LineEnding::default(),
        }
    }

    /// Use `ending` to terminate lines of outgoing messages.
    #[must_use]
    pub fn with_line_ending(mut self, ending: LineEnding) -> Self {
        self.ending = ending;
        self
    }
}

impl<T: Target> Default for Codec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Target> Decoder for Codec<T> {
    type Item = T::Receive;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(match self.parser.parse(src)? {
            Status::Done => {
                // Extract parser and replace with all new one since this one
                // is now consumed and we don't need it anymore
                let parser = std::mem::replace(&mut self.parser, Parser::<T::Receive>::new());
                Some(parser.into_message()?)
            }
            Status::Hungry => None,
        })
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() && !self.parser.has_started() => Ok(None),
            None => Err(Error::IncompleteMessage),
        }
    }
}

impl<T: Target> Encoder<T::Send> for Codec<T> {
    type Error = Error;

    fn encode(&mut self, item: T::Send, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.serialize(dst, self.ending);
        Ok(())
    }
}
