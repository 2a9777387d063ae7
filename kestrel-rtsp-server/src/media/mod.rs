pub mod error;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use kestrel_rtsp_protocol::Uri;
use kestrel_sdp_protocol::{Media, MediaLine, Rtpmap, Sdp, TimeRange};

use crate::app::config::Item;

pub use error::Error;

/// A configured media item and the description handed out for it.
#[derive(Debug)]
pub struct MediaItem {
    pub name: String,
    pub path: String,
    pub sdp: Sdp,
    streams: Vec<String>,
}

impl MediaItem {
    pub fn new(name: &str, path: &str, sdp: Sdp) -> Result<Self, Error> {
        // Media lines are validated once so the handler can rely on them.
        for media in &sdp.media {
            media.m().map_err(|error| Error::Sdp {
                name: name.to_string(),
                error,
            })?;
        }
        if sdp.media.is_empty() {
            return Err(Error::NoStreams {
                name: name.to_string(),
            });
        }

        let path = normalize_path(path);
        let streams = sdp
            .media
            .iter()
            .enumerate()
            .map(|(index, media)| match media.controls().first() {
                Some(control) => stream_path(&control.resolve(&path)),
                None => format!("{path}/streamid={index}"),
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            path,
            sdp,
            streams,
        })
    }

    /// Build the item from configuration, either by loading its SDP file or
    /// by generating a single stream description.
    pub fn from_config(item: &Item, origin: IpAddr) -> Result<Self, Error> {
        let sdp = match (&item.sdp, &item.encoding) {
            (Some(path), _) => {
                let contents = std::fs::read(path).map_err(|error| Error::Io {
                    path: path.clone(),
                    error,
                })?;
                Sdp::from_bytes(&contents).map_err(|error| Error::Sdp {
                    name: item.name.clone(),
                    error,
                })?
            }
            (None, Some(encoding)) => generate_sdp(item, encoding, origin),
            (None, None) => {
                return Err(Error::DescriptionMissing {
                    name: item.name.clone(),
                })
            }
        };

        Self::new(&item.name, &item.path, sdp)
    }

    pub fn streams(&self) -> &[String] {
        &self.streams
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} streams)",
            self.name,
            self.path,
            self.streams.len()
        )
    }
}

/// Reference to a single stream of a media item, as addressed by SETUP.
#[derive(Clone, Copy, Debug)]
pub struct StreamRef<'a> {
    pub item: &'a MediaItem,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct MediaCatalog {
    items: Vec<MediaItem>,
}

impl MediaCatalog {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_config(items: &[Item], origin: IpAddr) -> Result<Self, Error> {
        let mut catalog = Self::new();
        for item in items {
            tracing::debug!(%item, "loading media item");
            let media_item = MediaItem::from_config(item, origin)?;
            tracing::info!(%media_item, "registered media item");
            catalog.register(media_item)?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, item: MediaItem) -> Result<(), Error> {
        if self.describe(&item.path).is_some() {
            return Err(Error::PathInUse { path: item.path });
        }
        self.items.push(item);
        Ok(())
    }

    /// Find the item whose aggregate path is `path`.
    pub fn describe(&self, path: &str) -> Option<&MediaItem> {
        let path = normalize_path(path);
        self.items.iter().find(|item| item.path == path)
    }

    /// Find the stream addressed by `path`. The aggregate path of an item
    /// with a single stream addresses that stream.
    pub fn resolve_stream(&self, path: &str) -> Option<StreamRef<'_>> {
        let path = normalize_path(path);
        self.items.iter().find_map(|item| {
            if let Some(index) = item.streams().iter().position(|stream| *stream == path) {
                Some(StreamRef { item, index })
            } else if item.path == path && item.streams().len() == 1 {
                Some(StreamRef { item, index: 0 })
            } else {
                None
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for MediaCatalog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} media items", self.items.len())
    }
}

fn generate_sdp(item: &Item, encoding: &str, origin: IpAddr) -> Sdp {
    let format = item.payload_type.to_string();
    Sdp::new(
        origin,
        &item.name,
        IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        TimeRange::Live,
    )
    .with_attribute("tool:kestrel")
    .with_media(
        Media::new(&MediaLine::new(&item.kind, 0, "RTP/AVP", &format))
            .with_rtpmap(&Rtpmap::new(item.payload_type, encoding, item.clock_rate))
            .with_control("streamid=0"),
    )
}

/// Controls may be absolute URLs; only their path is matched.
fn stream_path(resolved: &str) -> String {
    if resolved.contains("://") {
        if let Ok(uri) = resolved.parse::<Uri>() {
            return normalize_path(uri.path());
        }
    }
    normalize_path(resolved)
}

fn normalize_path(path: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {

    use std::net::{IpAddr, Ipv4Addr};

    use kestrel_sdp_protocol::{Block, Sdp};

    use super::{Error, MediaCatalog, MediaItem};
    use crate::app::config::Item;

    const TWO_STREAMS: &str = "v=0\r\n\
o=- 0 0 IN IP4 127.0.0.1\r\n\
s=Lobby\r\n\
t=0 0\r\n\
m=video 0 RTP/AVP 96\r\n\
a=rtpmap:96 H264/90000\r\n\
a=control:trackID=1\r\n\
m=audio 0 RTP/AVP 97\r\n\
a=rtpmap:97 MPEG4-GENERIC/44100/2\r\n\
a=control:rtsp://camera.local/live/lobby/trackID=2\r\n";

    fn generated(name: &str, path: &str) -> Item {
        Item {
            name: name.to_string(),
            path: path.to_string(),
            sdp: None,
            encoding: Some("H264".to_string()),
            kind: "video".to_string(),
            payload_type: 96,
            clock_rate: 90000,
        }
    }

    fn origin() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    #[test]
    fn generate_description() {
        let item = MediaItem::from_config(&generated("Front", "/live/front/"), origin()).unwrap();
        assert_eq!(item.path, "/live/front");
        assert_eq!(item.streams(), ["/live/front/streamid=0"]);

        let media = &item.sdp.media[0];
        assert_eq!(media.get('m'), Some("video 0 RTP/AVP 96"));
        assert_eq!(media.attributes(), ["rtpmap:96 H264/90000", "control:streamid=0"]);
        assert_eq!(item.sdp.session.get('s'), Some("Front"));
    }

    #[test]
    fn description_missing() {
        let mut item = generated("Front", "/live/front");
        item.encoding = None;
        assert!(matches!(
            MediaItem::from_config(&item, origin()),
            Err(Error::DescriptionMissing { .. }),
        ));
    }

    #[test]
    fn description_without_media() {
        let sdp = "v=0\r\ns=Empty\r\n".parse::<Sdp>().unwrap();
        assert!(matches!(
            MediaItem::new("Empty", "/empty", sdp),
            Err(Error::NoStreams { .. }),
        ));
    }

    #[test]
    fn resolve_streams() {
        let mut catalog = MediaCatalog::new();
        catalog
            .register(MediaItem::from_config(&generated("Front", "/live/front"), origin()).unwrap())
            .unwrap();
        catalog
            .register(
                MediaItem::new("Lobby", "live/lobby", TWO_STREAMS.parse().unwrap()).unwrap(),
            )
            .unwrap();
        assert_eq!(catalog.to_string(), "2 media items");

        assert_eq!(catalog.describe("/live/front/").unwrap().name, "Front");
        assert!(catalog.describe("/live/back").is_none());

        let stream = catalog.resolve_stream("/live/front/streamid=0").unwrap();
        assert_eq!((stream.item.name.as_str(), stream.index), ("Front", 0));
        let stream = catalog.resolve_stream("/live/front").unwrap();
        assert_eq!((stream.item.name.as_str(), stream.index), ("Front", 0));

        let stream = catalog.resolve_stream("/live/lobby/trackID=1").unwrap();
        assert_eq!((stream.item.name.as_str(), stream.index), ("Lobby", 0));
        let stream = catalog.resolve_stream("/live/lobby/trackID=2").unwrap();
        assert_eq!((stream.item.name.as_str(), stream.index), ("Lobby", 1));

        // Aggregate setup of an item with more than one stream.
        assert!(catalog.resolve_stream("/live/lobby").is_none());
    }

    #[test]
    fn register_duplicate_path() {
        let mut catalog = MediaCatalog::new();
        let item = generated("Front", "/live/front");
        catalog
            .register(MediaItem::from_config(&item, origin()).unwrap())
            .unwrap();
        assert!(matches!(
            catalog.register(MediaItem::from_config(&item, origin()).unwrap()),
            Err(Error::PathInUse { .. }),
        ));
    }
}
