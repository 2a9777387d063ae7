use std::fmt;

/// Time during which a session is active, the `t=` field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeRange {
    /// Unbounded session, `t=0 0`.
    Live,
    Playback { start: u64, end: u64 },
}

impl TimeRange {
    /// Value of the `t=` field.
    #[must_use]
    pub fn to_field(self) -> String {
        let (start, end): (u64, u64) = self.into();
        format!("{start} {end}")
    }
}

impl From<TimeRange> for (u64, u64) {
    fn from(time_range: TimeRange) -> (u64, u64) {
        match time_range {
            TimeRange::Live => (0, 0),
            TimeRange::Playback { start, end } => (start, end),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimeRange::Live => write!(f, "live"),
            TimeRange::Playback { start, end } => write!(f, "from {start} to {end}"),
        }
    }
}
