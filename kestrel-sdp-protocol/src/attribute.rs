use std::fmt;
use std::str::FromStr;

use super::error::{Error, Result};

/// Parsed `m=` line: `<media> <port>[/<count>] <proto> <fmt>`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MediaLine {
    pub media: String,
    pub port: u16,
    /// Number of consecutive ports, 1 when not given.
    pub port_count: u16,
    pub proto: String,
    pub format: String,
}

impl MediaLine {
    #[must_use]
    pub fn new(media: &str, port: u16, proto: &str, format: &str) -> Self {
        Self {
            media: media.to_string(),
            port,
            port_count: 1,
            proto: proto.to_string(),
            format: format.to_string(),
        }
    }
}

impl fmt::Display for MediaLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.media, self.port)?;
        if self.port_count != 1 {
            write!(f, "/{}", self.port_count)?;
        }
        write!(f, " {} {}", self.proto, self.format)
    }
}

impl FromStr for MediaLine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::MediaLineInvalid {
            value: s.to_string(),
        };
        let [media, port, proto, format] = *s.split(' ').collect::<Vec<_>>().as_slice() else {
            return Err(invalid());
        };
        let (port, port_count) = match port.split_once('/') {
            Some((port, count)) => (
                port.parse().map_err(|_| invalid())?,
                count.parse().map_err(|_| invalid())?,
            ),
            None => (port.parse().map_err(|_| invalid())?, 1),
        };
        Ok(Self {
            media: media.to_string(),
            port,
            port_count,
            proto: proto.to_string(),
            format: format.to_string(),
        })
    }
}

/// `a=rtpmap:<payload type> <encoding name>/<clock rate>[/<encoding parameters>]`
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Rtpmap {
    pub payload_type: u8,
    pub encoding_name: String,
    pub clock_rate: u32,
    /// For audio streams, the number of channels.
    pub encoding_params: Option<u16>,
}

impl Rtpmap {
    #[must_use]
    pub fn new(payload_type: u8, encoding_name: &str, clock_rate: u32) -> Self {
        Self {
            payload_type,
            encoding_name: encoding_name.to_string(),
            clock_rate,
            encoding_params: None,
        }
    }

    #[must_use]
    pub const fn with_encoding_params(mut self, encoding_params: u16) -> Self {
        self.encoding_params = Some(encoding_params);
        self
    }

    /// Parse the value of an `a=` line that holds an rtpmap attribute,
    /// including the `rtpmap:` prefix.
    pub fn parse_attribute(attribute: &str) -> Result<Self> {
        attribute
            .strip_prefix("rtpmap:")
            .ok_or_else(|| Error::RtpmapInvalid {
                value: attribute.to_string(),
            })?
            .parse()
    }
}

impl fmt::Display for Rtpmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.payload_type, self.encoding_name, self.clock_rate
        )?;
        if let Some(encoding_params) = self.encoding_params {
            write!(f, "/{encoding_params}")?;
        }
        Ok(())
    }
}

impl FromStr for Rtpmap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::RtpmapInvalid {
            value: s.to_string(),
        };
        let (payload_type, encoding) = s.split_once(' ').ok_or_else(invalid)?;
        let payload_type = payload_type.parse().map_err(|_| invalid())?;
        let (encoding_name, clock_rate, encoding_params) =
            match *encoding.split('/').collect::<Vec<_>>().as_slice() {
                [name, clock_rate] => (name, clock_rate, None),
                [name, clock_rate, params] => (name, clock_rate, Some(params)),
                _ => return Err(invalid()),
            };
        if encoding_name.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            payload_type,
            encoding_name: encoding_name.to_string(),
            clock_rate: clock_rate.parse().map_err(|_| invalid())?,
            encoding_params: encoding_params
                .map(|params| params.parse().map_err(|_| invalid()))
                .transpose()?,
        })
    }
}

/// `a=control:<url>`, the URL used to address a stream in RTSP requests.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Control {
    value: String,
}

impl Control {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Resolve against the aggregate URL: `*` is the aggregate URL itself,
    /// absolute URLs are kept and anything else is relative to `base`.
    #[must_use]
    pub fn resolve(&self, base: &str) -> String {
        if self.value == "*" {
            base.to_string()
        } else if self.value.contains("://") {
            self.value.clone()
        } else {
            format!("{}/{}", base.trim_end_matches('/'), self.value)
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
