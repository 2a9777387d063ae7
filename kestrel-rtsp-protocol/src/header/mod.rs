//! Structured header values. Each type parses with [`std::str::FromStr`]
//! and generates its wire form with [`std::fmt::Display`].

mod range;
mod rtp_info;
mod session;
mod transport;

pub use range::{NptRange, NptStart, NptTime, Range, RangeSpec, SmpteRange, UtcRange};
pub use rtp_info::{RtpInfo, RtpInfoItem};
pub use session::Session;
pub use transport::{parse_port_pair, Cast, Lower, PortPair, Transport, TransportItem};
