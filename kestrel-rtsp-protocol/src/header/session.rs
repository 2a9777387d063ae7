use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Value of the `Session` header: `<id>[;timeout=<seconds>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Timeout in seconds. Zero means no timeout is written.
    pub timeout: u64,
}

impl Session {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timeout: 0,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if self.timeout > 0 {
            write!(f, ";timeout={}", self.timeout)?;
        }
        Ok(())
    }
}

impl FromStr for Session {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(';') {
            None => Ok(Session::new(s.trim())),
            Some((id, param)) => {
                let invalid = || Error::TimeoutInvalid {
                    value: param.to_string(),
                };
                let timeout = param
                    .trim()
                    .strip_prefix("timeout=")
                    .ok_or_else(invalid)?
                    .parse::<u64>()
                    .map_err(|_| invalid())?;
                Ok(Session::new(id.trim()).with_timeout(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {

    use super::{Error, Session};

    #[test]
    fn parse_without_timeout() {
        let session = "47112344".parse::<Session>().unwrap();
        assert_eq!(session, Session::new("47112344"));
        assert_eq!(session.timeout, 0);
        assert_eq!(session.to_string(), "47112344");
    }

    #[test]
    fn parse_with_timeout() {
        let session = "12345678;timeout=60".parse::<Session>().unwrap();
        assert_eq!(session.id, "12345678");
        assert_eq!(session.timeout, 60);
        assert_eq!(session.to_string(), "12345678;timeout=60");
    }

    #[test]
    fn zero_timeout_is_omitted() {
        assert_eq!(Session::new("abc").with_timeout(0).to_string(), "abc");
    }

    #[test]
    fn parse_invalid_timeout() {
        for value in ["abc;timeout=sixty", "abc;timeout=-1", "abc;expires=60"] {
            assert!(matches!(
                value.parse::<Session>(),
                Err(Error::TimeoutInvalid { .. }),
            ));
        }
    }
}
