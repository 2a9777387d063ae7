use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Value of the `Range` header.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub spec: RangeSpec,
    /// Wall clock time at which the range should take effect, from the
    /// `time=` parameter.
    pub time: Option<String>,
}

impl Range {
    /// `npt=now-`, the range of a live stream.
    #[must_use]
    pub const fn live() -> Self {
        Self {
            spec: RangeSpec::Npt(NptRange {
                start: NptStart::Now,
                end: None,
            }),
            time: None,
        }
    }

    #[must_use]
    pub fn npt(start: NptStart, end: Option<NptTime>) -> Self {
        Self {
            spec: RangeSpec::Npt(NptRange { start, end }),
            time: None,
        }
    }

    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.spec)?;
        if let Some(time) = &self.time {
            write!(f, ";time={time}")?;
        }
        Ok(())
    }
}

impl FromStr for Range {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (spec, time) = match s.split_once(';') {
            Some((spec, rest)) => {
                let time = rest
                    .trim()
                    .strip_prefix("time=")
                    .ok_or_else(|| Error::TimeFieldMalformed {
                        value: s.to_string(),
                    })?;
                (spec, Some(time.to_string()))
            }
            None => (s, None),
        };

        Ok(Self {
            spec: spec.trim().parse()?,
            time,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RangeSpec {
    Smpte(SmpteRange),
    Npt(NptRange),
    Utc(UtcRange),
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Smpte(smpte) => write!(f, "{smpte}"),
            Self::Npt(npt) => write!(f, "{npt}"),
            Self::Utc(utc) => write!(f, "{utc}"),
        }
    }
}

impl FromStr for RangeSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::RangeMalformed {
            value: s.to_string(),
        };

        if s.starts_with("smpte") {
            let (kind, value) = s.split_once('=').ok_or_else(malformed)?;
            let (start, end) = value.split_once('-').ok_or_else(malformed)?;
            if start.is_empty() {
                return Err(malformed());
            }
            Ok(Self::Smpte(SmpteRange {
                kind: kind.to_string(),
                start: start.to_string(),
                end: non_empty(end),
            }))
        } else if let Some(value) = s.strip_prefix("npt") {
            let value = value.strip_prefix('=').ok_or_else(malformed)?;
            Ok(Self::Npt(parse_npt_range(value).ok_or_else(malformed)?))
        } else if let Some(value) = s.strip_prefix("clock") {
            let value = value.strip_prefix('=').ok_or_else(malformed)?;
            let (start, end) = value.split_once('-').ok_or_else(malformed)?;
            if start.is_empty() {
                return Err(malformed());
            }
            Ok(Self::Utc(UtcRange {
                start: start.to_string(),
                end: non_empty(end),
            }))
        } else {
            Err(Error::RangeTypeUnknown {
                value: s.to_string(),
            })
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_npt_range(value: &str) -> Option<NptRange> {
    let (start, end) = value.split_once('-')?;
    let start = match start {
        "" => NptStart::Open,
        "now" => NptStart::Now,
        start => NptStart::Time(start.parse().ok()?),
    };
    let end = match end {
        "" => None,
        end => Some(end.parse().ok()?),
    };
    Some(NptRange { start, end })
}

/// SMPTE relative timestamps. Time codes are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmpteRange {
    /// `smpte`, `smpte-30-drop` or `smpte-25`.
    pub kind: String,
    pub start: String,
    pub end: Option<String>,
}

impl fmt::Display for SmpteRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}={}-{}",
            self.kind,
            self.start,
            self.end.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NptRange {
    pub start: NptStart,
    /// `None` for an open ended range.
    pub end: Option<NptTime>,
}

impl fmt::Display for NptRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "npt=")?;
        match &self.start {
            NptStart::Open => {}
            NptStart::Now => write!(f, "now")?,
            NptStart::Time(time) => write!(f, "{time}")?,
        }
        write!(f, "-")?;
        if let Some(end) = &self.end {
            write!(f, "{end}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NptStart {
    /// No start time, as in `npt=-10`.
    Open,
    Now,
    Time(NptTime),
}

/// Normal play time as seconds from the start of the presentation. A parsed
/// time is written back as it was received.
#[derive(Debug, Clone)]
pub struct NptTime {
    secs: f64,
    text: String,
}

impl NptTime {
    #[must_use]
    pub fn from_secs(secs: f64) -> Self {
        Self {
            secs,
            text: secs.to_string(),
        }
    }

    #[must_use]
    pub const fn as_secs(&self) -> f64 {
        self.secs
    }
}

impl PartialEq for NptTime {
    fn eq(&self, other: &Self) -> bool {
        self.secs == other.secs
    }
}

impl fmt::Display for NptTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl FromStr for NptTime {
    type Err = Error;

    /// Accepts both `npt-sec` (`123.45`) and `npt-hhmmss` (`1:02:03.45`).
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::RangeMalformed {
            value: s.to_string(),
        };
        let secs = match *s.split(':').collect::<Vec<_>>().as_slice() {
            [secs] => parse_secs(secs).ok_or_else(malformed)?,
            [hh, mm, ss] => {
                let hh = hh.parse::<u32>().map_err(|_| malformed())?;
                let mm = mm.parse::<u32>().map_err(|_| malformed())?;
                let ss = parse_secs(ss).ok_or_else(malformed)?;
                if mm >= 60 || ss >= 60.0 {
                    return Err(malformed());
                }
                f64::from(hh) * 3600.0 + f64::from(mm) * 60.0 + ss
            }
            _ => return Err(malformed()),
        };
        Ok(Self {
            secs,
            text: s.to_string(),
        })
    }
}

fn parse_secs(value: &str) -> Option<f64> {
    // Only digits with an optional fraction; rejects forms like `1e3` or
    // `inf` that `f64::from_str` would take.
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits(whole) || !digits(fraction) {
        return None;
    }
    value.parse().ok()
}

/// Absolute time range in UTC, `clock=19961108T142300Z-19961108T143520Z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtcRange {
    pub start: String,
    pub end: Option<String>,
}

impl fmt::Display for UtcRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "clock={}-{}",
            self.start,
            self.end.as_deref().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {

    use super::{Error, NptRange, NptStart, NptTime, Range, RangeSpec, SmpteRange, UtcRange};

    fn npt(range: &Range) -> &NptRange {
        match &range.spec {
            RangeSpec::Npt(npt) => npt,
            spec => panic!("expected npt range, got {spec:?}"),
        }
    }

    #[test]
    fn parse_npt_open_start() {
        let range = "npt=-10.5".parse::<Range>().unwrap();
        assert_eq!(npt(&range).start, NptStart::Open);
        assert_eq!(npt(&range).end, Some(NptTime::from_secs(10.5)));
        assert_eq!(range.to_string(), "npt=-10.5");
    }

    #[test]
    fn parse_npt_now() {
        let range = "npt=now-".parse::<Range>().unwrap();
        assert_eq!(npt(&range).start, NptStart::Now);
        assert_eq!(npt(&range).end, None);
        assert_eq!(range, Range::live());
        assert_eq!(range.to_string(), "npt=now-");
    }

    #[test]
    fn parse_npt_start_end() {
        let range = "npt=0-7.741".parse::<Range>().unwrap();
        assert_eq!(npt(&range).start, NptStart::Time(NptTime::from_secs(0.0)));
        assert_eq!(npt(&range).end, Some(NptTime::from_secs(7.741)));
        assert_eq!(range.to_string(), "npt=0-7.741");
    }

    #[test]
    fn parse_npt_hhmmss() {
        let range = "npt=0:01:02.5-".parse::<Range>().unwrap();
        assert_eq!(
            npt(&range).start,
            NptStart::Time(NptTime::from_secs(62.5))
        );
        assert!(matches!(
            "npt=0:61:00-".parse::<Range>(),
            Err(Error::RangeMalformed { .. }),
        ));
    }

    #[test]
    fn npt_written_as_received() {
        let range = "npt=0.000-1:00:00".parse::<Range>().unwrap();
        assert_eq!(npt(&range).start, NptStart::Time(NptTime::from_secs(0.0)));
        assert_eq!(npt(&range).end.as_ref().map(NptTime::as_secs), Some(3600.0));
        assert_eq!(range.to_string(), "npt=0.000-1:00:00");

        let range = Range::npt(NptStart::Time(NptTime::from_secs(12.5)), None);
        assert_eq!(range.to_string(), "npt=12.5-");
    }

    #[test]
    fn parse_smpte() {
        let range = "smpte-25=10:07:00-10:07:33:05.01".parse::<Range>().unwrap();
        assert_eq!(
            range.spec,
            RangeSpec::Smpte(SmpteRange {
                kind: "smpte-25".to_string(),
                start: "10:07:00".to_string(),
                end: Some("10:07:33:05.01".to_string()),
            }),
        );
        assert_eq!(range.to_string(), "smpte-25=10:07:00-10:07:33:05.01");

        let range = "smpte=0:10:20-".parse::<Range>().unwrap();
        assert!(matches!(range.spec, RangeSpec::Smpte(SmpteRange { end: None, .. })));
    }

    #[test]
    fn parse_clock_with_time() {
        let range = "clock=19961108T142300Z-19961108T143520Z;time=19970123T143720Z"
            .parse::<Range>()
            .unwrap();
        assert_eq!(
            range.spec,
            RangeSpec::Utc(UtcRange {
                start: "19961108T142300Z".to_string(),
                end: Some("19961108T143520Z".to_string()),
            }),
        );
        assert_eq!(range.time.as_deref(), Some("19970123T143720Z"));
        assert_eq!(
            range.to_string(),
            "clock=19961108T142300Z-19961108T143520Z;time=19970123T143720Z",
        );
    }

    #[test]
    fn parse_unknown_type() {
        assert!(matches!(
            "frames=0-100".parse::<Range>(),
            Err(Error::RangeTypeUnknown { .. }),
        ));
    }

    #[test]
    fn parse_malformed_time_field() {
        assert!(matches!(
            "npt=0-;at=19970123T143720Z".parse::<Range>(),
            Err(Error::TimeFieldMalformed { .. }),
        ));
    }

    #[test]
    fn parse_malformed_npt() {
        for value in ["npt=10", "npt=abc-", "npt=1e3-", "npt10-"] {
            assert!(matches!(
                value.parse::<Range>(),
                Err(Error::RangeMalformed { .. }),
            ));
        }
    }
}
