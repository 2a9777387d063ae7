mod attribute;
mod block;
mod error;
mod time;
mod timing;

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use kestrel_rtsp_protocol::{LineSource, Lines};

pub use attribute::{Control, MediaLine, Rtpmap};
pub use block::{Block, Fields, Media, Session, REPEATABLE_KEYS};
pub use error::{Error, Result};
pub use timing::TimeRange;

/// Session description: one session block followed by zero or more media
/// blocks.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Sdp {
    pub session: Session,
    pub media: Vec<Media>,
}

impl Sdp {
    /// Start a description as a server would announce it: version 0,
    /// anonymous origin with the current time as session id, a session name
    /// and a connection address.
    #[must_use]
    pub fn new(origin: IpAddr, name: &str, connection: IpAddr, time_range: TimeRange) -> Self {
        let timestamp = time::unix_epoch_timestamp();
        let mut session = Session::new();
        session.set('v', "0");
        session.set(
            'o',
            format!(
                "- {timestamp} {timestamp} IN {} {origin}",
                address_type(&origin)
            ),
        );
        session.set('s', name);
        session.set('c', format!("IN {} {connection}", address_type(&connection)));
        session.set('t', time_range.to_field());
        Self {
            session,
            media: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.session.set('i', description);
        self
    }

    /// Add a session level attribute such as `tool:kestrel`.
    #[must_use]
    pub fn with_attribute(mut self, value: impl Into<String>) -> Self {
        self.session.set('a', value);
        self
    }

    #[must_use]
    pub fn with_media(mut self, media: Media) -> Self {
        self.media.push(media);
        self
    }

    /// Parse a description from lines.
    ///
    /// `v=` opens the session block and `m=` opens a new media block. Every
    /// other field belongs to the block that is open. Empty lines are
    /// skipped.
    pub fn parse(source: &mut impl LineSource) -> Result<Sdp> {
        let mut session: Option<Session> = None;
        let mut media: Vec<Media> = Vec::new();
        let mut in_media = false;

        while let Some(line) = source.read_line()? {
            if line.is_empty() {
                continue;
            }
            let (key, value) = parse_line(&line)?;
            match key {
                'v' => {
                    let mut block = Session::new();
                    block.set(key, value);
                    session = Some(block);
                    in_media = false;
                }
                _ if session.is_none() => {
                    return Err(Error::NoOpenBlock { line });
                }
                'm' => {
                    let mut block = Media::default();
                    block.set(key, value);
                    media.push(block);
                    in_media = true;
                }
                _ => {
                    let fields = if in_media {
                        media.last_mut().map(Media::fields_mut)
                    } else {
                        session.as_mut().map(Session::fields_mut)
                    };
                    if let Some(fields) = fields {
                        fields.set(key, value);
                    }
                }
            }
        }

        Ok(Sdp {
            session: session.ok_or(Error::FieldMissing { key: 'v' })?,
            media,
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Sdp> {
        Self::parse(&mut Lines::new(data))
    }
}

impl FromStr for Sdp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for Sdp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.session)?;
        for media in &self.media {
            write!(f, "{media}")?;
        }
        Ok(())
    }
}

/// Split a line into its single character key and the value.
fn parse_line(line: &str) -> Result<(char, &str)> {
    let malformed = || Error::LineMalformed {
        line: line.to_string(),
    };
    let (key, value) = line.split_once('=').ok_or_else(malformed)?;
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok((key, value)),
        _ => Err(malformed()),
    }
}

fn address_type(addr: &IpAddr) -> &'static str {
    match addr {
        IpAddr::V4(_) => "IP4",
        IpAddr::V6(_) => "IP6",
    }
}
