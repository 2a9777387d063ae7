use std::fmt;

use rand::Rng;

use kestrel_rtsp_protocol::header::{
    Cast, Lower, PortPair, RtpInfo, RtpInfoItem, Session as SessionHeader, TransportItem,
};

use crate::app::config::SessionConfig;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    const SESSION_ID_LEN: u32 = 8;

    pub fn generate(rng: &mut impl Rng) -> SessionId {
        SessionId(
            rng.sample(rand::distributions::Uniform::from(
                10_u32.pow(Self::SESSION_ID_LEN - 1)..10_u32.pow(Self::SESSION_ID_LEN),
            ))
            .to_string(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Random synchronization source, written as 8 hex digits.
pub fn generate_ssrc(rng: &mut impl Rng) -> String {
    format!("{:08X}", rng.gen::<u32>())
}

/// Draw a server port pair from `[min, max]` with an even RTP port and the
/// RTCP port directly after it.
pub fn allocate_port_pair(rng: &mut impl Rng, min: u16, max: u16) -> PortPair {
    let lowest = (u32::from(min) + 1) / 2;
    let highest = (u32::from(max).saturating_sub(1) / 2).max(lowest);
    let rtp = (rng.gen_range(lowest..=highest) * 2).min(u32::from(u16::MAX) - 1);
    // Bounded by `u16::MAX - 1` above.
    let rtp = rtp as u16;
    PortPair::new(rtp, rtp + 1)
}

/// A stream of a media item that was set up in the session.
#[derive(Clone, Debug)]
pub struct SessionStream {
    pub index: usize,
    pub url: String,
    pub seq: u16,
    pub rtptime: u32,
}

/// Negotiated state of the single session a connection may own.
#[derive(Debug)]
pub struct SessionState {
    pub id: SessionId,
    /// Aggregate path of the media item the session belongs to.
    pub item_path: String,
    timeout: u64,
    streams: Vec<SessionStream>,
}

impl SessionState {
    pub fn new(rng: &mut impl Rng, item_path: &str, config: &SessionConfig) -> Self {
        Self {
            id: SessionId::generate(rng),
            item_path: item_path.to_string(),
            timeout: config.timeout,
            streams: Vec::new(),
        }
    }

    /// Set up (or set up again) stream `index` for a client transport and
    /// return the transport the server answers with.
    pub fn setup_stream(
        &mut self,
        rng: &mut impl Rng,
        config: &SessionConfig,
        index: usize,
        url: &str,
        client_port: PortPair,
    ) -> TransportItem {
        let transport = TransportItem::rtp_avp()
            .with_lower(Lower::Udp)
            .with_cast(Cast::Unicast)
            .with_client_port(client_port)
            .with_server_port(allocate_port_pair(
                rng,
                config.rtp_port_min,
                config.rtp_port_max,
            ))
            .with_ssrc(generate_ssrc(rng));

        let stream = SessionStream {
            index,
            url: url.to_string(),
            seq: rng.gen(),
            rtptime: rng.gen(),
        };
        match self.streams.iter_mut().find(|stream| stream.index == index) {
            Some(existing) => *existing = stream,
            None => self.streams.push(stream),
        }

        transport
    }

    pub fn streams(&self) -> &[SessionStream] {
        &self.streams
    }

    /// `Session` header value including the configured timeout.
    pub fn header(&self) -> SessionHeader {
        SessionHeader::new(self.id.as_str()).with_timeout(self.timeout)
    }

    /// `RTP-Info` header value with one item per set up stream.
    pub fn rtp_info(&self) -> RtpInfo {
        self.streams().iter().fold(RtpInfo::new(), |rtp_info, stream| {
            rtp_info.with_item(
                RtpInfoItem::new(stream.url.as_str())
                    .with_seq(stream.seq)
                    .with_rtptime(stream.rtptime),
            )
        })
    }
}
