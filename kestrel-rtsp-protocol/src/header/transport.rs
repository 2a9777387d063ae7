use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Value of the `Transport` header: one or more transport specifications in
/// order of preference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transport(Vec<TransportItem>);

impl Transport {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn with_item(mut self, item: TransportItem) -> Self {
        self.0.push(item);
        self
    }

    #[must_use]
    pub fn items(&self) -> &[TransportItem] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransportItem> {
        self.0.iter()
    }
}

impl From<TransportItem> for Transport {
    fn from(item: TransportItem) -> Self {
        Self(vec![item])
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, item) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .map(str::parse)
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

/// A single transport specification such as
/// `RTP/AVP/UDP;unicast;client_port=4588-4589`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportItem {
    pub protocol: String,
    pub profile: String,
    /// Lower transport as written. Use [`TransportItem::lower_transport`] for
    /// the effective value.
    pub lower: Option<Lower>,
    pub cast: Option<Cast>,
    pub port: Option<PortPair>,
    pub client_port: Option<PortPair>,
    pub server_port: Option<PortPair>,
    pub ssrc: Option<String>,
    /// Parameters that have no dedicated field, in the order received.
    pub extra: Vec<(String, Option<String>)>,
}

impl TransportItem {
    /// Plain `RTP/AVP` item without parameters.
    #[must_use]
    pub fn rtp_avp() -> Self {
        Self {
            protocol: "RTP".to_string(),
            profile: "AVP".to_string(),
            lower: None,
            cast: None,
            port: None,
            client_port: None,
            server_port: None,
            ssrc: None,
            extra: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_lower(mut self, lower: Lower) -> Self {
        self.lower = Some(lower);
        self
    }

    #[must_use]
    pub const fn with_cast(mut self, cast: Cast) -> Self {
        self.cast = Some(cast);
        self
    }

    #[must_use]
    pub const fn with_client_port(mut self, port: PortPair) -> Self {
        self.client_port = Some(port);
        self
    }

    #[must_use]
    pub const fn with_server_port(mut self, port: PortPair) -> Self {
        self.server_port = Some(port);
        self
    }

    #[must_use]
    pub fn with_ssrc(mut self, ssrc: impl Into<String>) -> Self {
        self.ssrc = Some(ssrc.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, var: impl Into<String>, val: Option<String>) -> Self {
        self.extra.push((var.into(), val));
        self
    }

    /// Lower transport, UDP when not specified.
    #[must_use]
    pub fn lower_transport(&self) -> Lower {
        self.lower.unwrap_or(Lower::Udp)
    }

    #[must_use]
    pub fn is_unicast(&self) -> bool {
        self.cast == Some(Cast::Unicast)
    }
}

impl fmt::Display for TransportItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.profile)?;
        if let Some(lower) = self.lower {
            write!(f, "/{lower}")?;
        }
        if let Some(cast) = self.cast {
            write!(f, ";{cast}")?;
        }
        if let Some(port) = self.port {
            write!(f, ";port={port}")?;
        }
        if let Some(client_port) = self.client_port {
            write!(f, ";client_port={client_port}")?;
        }
        if let Some(server_port) = self.server_port {
            write!(f, ";server_port={server_port}")?;
        }
        if let Some(ssrc) = self.ssrc.as_ref().filter(|ssrc| !ssrc.is_empty()) {
            write!(f, ";ssrc={ssrc}")?;
        }
        for (var, val) in &self.extra {
            match val {
                Some(val) => write!(f, ";{var}={val}")?,
                None => write!(f, ";{var}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for TransportItem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::TransportMalformed {
            value: s.to_string(),
        };

        let mut segments = s.trim().split(';');
        let spec = segments.next().ok_or_else(malformed)?;
        let (protocol, profile, lower) = match *spec.split('/').collect::<Vec<_>>().as_slice() {
            [protocol, profile] => (protocol, profile, None),
            [protocol, profile, lower] => (
                protocol,
                profile,
                Some(lower.parse::<Lower>().map_err(|_| malformed())?),
            ),
            _ => return Err(malformed()),
        };
        if protocol.is_empty() || profile.is_empty() {
            return Err(malformed());
        }

        let mut item = Self {
            protocol: protocol.to_string(),
            profile: profile.to_string(),
            lower,
            ..Self::rtp_avp()
        };

        for segment in segments.filter(|segment| !segment.is_empty()) {
            let (var, val) = match segment.split_once('=') {
                Some((var, val)) => (var, Some(val)),
                None => (segment, None),
            };
            match (var, val) {
                ("unicast", None) if item.cast.is_none() => item.cast = Some(Cast::Unicast),
                ("multicast", None) if item.cast.is_none() => item.cast = Some(Cast::Multicast),
                ("port", Some(val)) => item.port = Some(parse_port_pair(val)?),
                ("client_port", Some(val)) => item.client_port = Some(parse_port_pair(val)?),
                ("server_port", Some(val)) => item.server_port = Some(parse_port_pair(val)?),
                ("ssrc", Some(val)) => item.ssrc = Some(val.to_string()),
                (var, val) => item.extra.push((var.to_string(), val.map(str::to_string))),
            }
        }

        Ok(item)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lower {
    Tcp,
    Udp,
}

impl fmt::Display for Lower {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

impl FromStr for Lower {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            _ => Err(Error::TransportMalformed {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cast {
    Unicast,
    Multicast,
}

impl fmt::Display for Cast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unicast => write!(f, "unicast"),
            Self::Multicast => write!(f, "multicast"),
        }
    }
}

/// RTP and RTCP port, written as `rtp-rtcp`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PortPair {
    pub rtp: u16,
    pub rtcp: u16,
}

impl PortPair {
    #[must_use]
    pub const fn new(rtp: u16, rtcp: u16) -> Self {
        Self { rtp, rtcp }
    }
}

impl fmt::Display for PortPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.rtp, self.rtcp)
    }
}

impl FromStr for PortPair {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_port_pair(s)
    }
}

/// Parse a `N1-N2` port pair. Both parts are required.
pub fn parse_port_pair(value: &str) -> Result<PortPair> {
    let invalid = || Error::PortPairInvalid {
        value: value.to_string(),
    };
    let (rtp, rtcp) = value.split_once('-').ok_or_else(invalid)?;
    Ok(PortPair {
        rtp: rtp.parse().map_err(|_| invalid())?,
        rtcp: rtcp.parse().map_err(|_| invalid())?,
    })
}
