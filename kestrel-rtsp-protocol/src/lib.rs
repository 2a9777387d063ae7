mod error;
mod line;
mod machine;
mod message;
mod parse;
mod request;
mod response;
mod serialize;

pub mod header;

#[cfg(feature = "tokio-codec")]
mod codec;

pub use error::{Error, Result};
pub use line::{take_line, LineSource, Lines};
pub use machine::{Handler, SessionMachine, State, Transition};
pub use message::{
    Bytes, CSeq, Headers, Message, Method, Status, StatusCategory, StatusCode, Uri, Version,
};
pub use parse::{parse_header, Parser, RequestParser, ResponseParser, Status as ParserStatus};
pub use request::{Request, RequestMetadata};
pub use response::{Response, ResponseBuilder, ResponseMetadata};
pub use serialize::{LineEnding, Serialize};

#[cfg(feature = "tokio-codec")]
pub use codec::{AsClient, AsServer, Codec, Target};
