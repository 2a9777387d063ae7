use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::select;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;

use crate::app::handler::AppHandler;
use crate::app::AppContext;
use crate::net::connection::Connection;
use crate::runtime::task_manager::TaskContext;
use crate::runtime::Runtime;

pub struct Server {
    local_addr: SocketAddr,
}

impl Server {
    pub async fn start(
        addrs: impl ToSocketAddrs,
        context: Arc<AppContext>,
        runtime: Arc<Runtime>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addrs).await?;
        let local_addr = listener.local_addr()?;

        let spawned = runtime
            .task()
            .spawn({
                let runtime = runtime.clone();
                move |task_context| Self::run(listener, context, runtime, task_context)
            })
            .await;
        if !spawned {
            tracing::warn!(%local_addr, "runtime is stopping, server not started");
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "runtime is stopping",
            ));
        }
        tracing::info!(%local_addr, "server listening");

        Ok(Self { local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    async fn run(
        listener: TcpListener,
        context: Arc<AppContext>,
        runtime: Arc<Runtime>,
        mut task_context: TaskContext,
    ) {
        // Every connection draws from its own generator, seeded from this one.
        let mut rng = StdRng::from_entropy();
        let mut incoming = TcpListenerStream::new(listener);

        loop {
            select! {
                stream = incoming.next() => {
                    match stream {
                        Some(Ok(stream)) => {
                            let addr = match stream.peer_addr() {
                                Ok(addr) => addr,
                                Err(err) => {
                                    tracing::warn!(%err, "accepted client without peer address");
                                    continue;
                                },
                            };
                            tracing::trace!(%addr, "accepted client");
                            let handler = AppHandler::new(
                                context.clone(),
                                StdRng::seed_from_u64(rng.gen()),
                            );
                            Connection::start(stream, addr, handler, &runtime).await;
                        },
                        Some(Err(err)) => {
                            tracing::warn!(%err, "failed to accept client");
                        },
                        None => {
                            break;
                        },
                    }
                },
                _ = task_context.wait_for_stop() => {
                    tracing::trace!("server stopped accepting clients");
                    break;
                },
            }
        }
    }
}
