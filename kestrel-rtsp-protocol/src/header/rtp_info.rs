use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Value of the `RTP-Info` header, one item per stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RtpInfo(Vec<RtpInfoItem>);

impl RtpInfo {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn with_item(mut self, item: RtpInfoItem) -> Self {
        self.0.push(item);
        self
    }

    #[must_use]
    pub fn items(&self) -> &[RtpInfoItem] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RtpInfo {
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

impl FromStr for RtpInfo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .map(str::parse)
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpInfoItem {
    pub url: String,
    /// Sequence number of the first packet sent after the request.
    pub seq: Option<u16>,
    /// RTP timestamp corresponding to the start of the range.
    pub rtptime: Option<u32>,
}

impl RtpInfoItem {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            seq: None,
            rtptime: None,
        }
    }

    #[must_use]
    pub const fn with_seq(mut self, seq: u16) -> Self {
        self.seq = Some(seq);
        self
    }

    #[must_use]
    pub const fn with_rtptime(mut self, rtptime: u32) -> Self {
        self.rtptime = Some(rtptime);
        self
    }
}

impl fmt::Display for RtpInfoItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "url={}", self.url)?;
        if let Some(seq) = self.seq {
            write!(f, ";seq={seq}")?;
        }
        if let Some(rtptime) = self.rtptime {
            write!(f, ";rtptime={rtptime}")?;
        }
        Ok(())
    }
}

impl FromStr for RtpInfoItem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut url = None;
        let mut seq = None;
        let mut rtptime = None;

        for field in s.trim().split(';') {
            if let Some(value) = field.strip_prefix("url=") {
                url = Some(value.to_string());
            } else if let Some(value) = field.strip_prefix("seq=") {
                seq = Some(parse_number(field, value)?);
            } else if let Some(value) = field.strip_prefix("rtptime=") {
                rtptime = Some(parse_number(field, value)?);
            } else {
                return Err(Error::RtpInfoFieldUnknown {
                    field: field.to_string(),
                });
            }
        }

        Ok(Self {
            url: url.ok_or_else(|| Error::RtpInfoUrlMissing {
                value: s.to_string(),
            })?,
            seq,
            rtptime,
        })
    }
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::RtpInfoValueInvalid {
        field: field.to_string(),
    })
}

#[cfg(test)]
mod tests {

    use super::{Error, RtpInfo, RtpInfoItem};

    #[test]
    fn parse_rfc2326_example() {
        let value = "url=rtsp://foo.com/bar.avi/streamid=0;seq=45102,url=rtsp://foo.com/bar.avi/streamid=1;seq=30211";
        let rtp_info = value.parse::<RtpInfo>().unwrap();
        assert_eq!(
            rtp_info,
            RtpInfo::new()
                .with_item(RtpInfoItem::new("rtsp://foo.com/bar.avi/streamid=0").with_seq(45102))
                .with_item(RtpInfoItem::new("rtsp://foo.com/bar.avi/streamid=1").with_seq(30211)),
        );
        assert_eq!(rtp_info.to_string(), value);
    }

    #[test]
    fn parse_all_fields() {
        let item = "url=rtsp://h/a/trackID=0;seq=1;rtptime=3450012"
            .parse::<RtpInfoItem>()
            .unwrap();
        assert_eq!(item.url, "rtsp://h/a/trackID=0");
        assert_eq!(item.seq, Some(1));
        assert_eq!(item.rtptime, Some(3_450_012));
    }

    #[test]
    fn parse_unknown_field() {
        assert!(matches!(
            "url=rtsp://h/a;ssrc=1234".parse::<RtpInfo>(),
            Err(Error::RtpInfoFieldUnknown { field }) if field == "ssrc=1234",
        ));
    }

    #[test]
    fn parse_invalid_values() {
        assert!(matches!(
            "url=rtsp://h/a;seq=x".parse::<RtpInfo>(),
            Err(Error::RtpInfoValueInvalid { .. }),
        ));
        assert!(matches!(
            "seq=1;rtptime=2".parse::<RtpInfo>(),
            Err(Error::RtpInfoUrlMissing { .. }),
        ));
    }
}
