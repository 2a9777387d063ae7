pub mod config;
pub mod handler;

use std::error::Error;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use crate::app::config::{AppConfig, SessionConfig};
use crate::media::MediaCatalog;
use crate::net::server::Server;
use crate::runtime::Runtime;

pub struct App {
    server: Server,
    runtime: Arc<Runtime>,
}

impl App {
    pub async fn start(config: AppConfig) -> Result<App, Box<dyn Error>> {
        // Descriptions name the server as origin; a host name or wildcard
        // falls back to the unspecified address.
        let origin = config
            .server
            .host
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let catalog = MediaCatalog::from_config(&config.media, origin)?;
        if catalog.is_empty() {
            tracing::warn!("no media items configured");
        }
        tracing::info!(%catalog, "initialized media catalog");

        let context = Arc::new(AppContext {
            catalog,
            session: config.session,
        });

        let runtime = Arc::new(Runtime::new());
        let server = Server::start(
            (config.server.host.as_str(), config.server.port),
            context,
            runtime.clone(),
        )
        .await?;

        Ok(Self { server, runtime })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Stop accepting clients, signal all connections to close and wait for
    /// them to finish.
    pub async fn stop(self) {
        tracing::info!("stopping");
        self.runtime.stop().await;
    }
}

/// State shared by all connections.
pub struct AppContext {
    pub catalog: MediaCatalog,
    pub session: SessionConfig,
}
