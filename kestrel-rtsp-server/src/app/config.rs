use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use config::{Config, ConfigError};

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub media: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8554,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    /// Seconds advertised in the `Session` header. Zero leaves out the
    /// timeout parameter.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_rtp_port_min")]
    pub rtp_port_min: u16,
    #[serde(default = "default_rtp_port_max")]
    pub rtp_port_max: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            rtp_port_min: default_rtp_port_min(),
            rtp_port_max: default_rtp_port_max(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_rtp_port_min() -> u16 {
    20000
}

fn default_rtp_port_max() -> u16 {
    30000
}

#[derive(Clone, Debug, Deserialize)]
pub struct Item {
    pub name: String,
    pub path: String,
    /// SDP file describing the item. When absent a description is generated
    /// from the encoding fields below.
    pub sdp: Option<PathBuf>,
    pub encoding: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_payload_type")]
    pub payload_type: u8,
    #[serde(default = "default_clock_rate")]
    pub clock_rate: u32,
}

fn default_kind() -> String {
    "video".to_string()
}

fn default_payload_type() -> u8 {
    96
}

fn default_clock_rate() -> u32 {
    90000
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}): ", self.name, self.path)?;
        match (&self.sdp, &self.encoding) {
            (Some(sdp), _) => write!(f, "sdp file {}", sdp.display()),
            (None, Some(encoding)) => write!(
                f,
                "{} {}/{} ({})",
                self.kind, encoding, self.clock_rate, self.payload_type
            ),
            (None, None) => write!(f, "no description"),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("KESTREL"))
            .build()?
            .try_deserialize()?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Make relative SDP file paths relative to `base`, the directory of the
    /// configuration file, instead of the working directory.
    fn resolve_paths(&mut self, base: &Path) {
        for item in &mut self.media {
            if let Some(sdp) = item.sdp.as_mut().filter(|sdp| sdp.is_relative()) {
                *sdp = base.join(&*sdp);
            }
        }
    }
}
