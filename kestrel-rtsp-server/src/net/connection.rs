use std::net::SocketAddr;

use futures::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::select;
use tokio_stream::StreamExt;
use tokio_util::codec::Framed;

use kestrel_rtsp_protocol::{AsServer, Codec, Error, Response, SessionMachine, Status};

use crate::app::handler::AppHandler;
use crate::runtime::task_manager::TaskContext;
use crate::runtime::Runtime;

/// Worker serving a single client connection. Requests are handled one at
/// a time in the order they arrive.
pub struct Connection;

impl Connection {
    pub async fn start(
        stream: TcpStream,
        addr: SocketAddr,
        handler: AppHandler,
        runtime: &Runtime,
    ) {
        let spawned = runtime
            .task()
            .spawn(move |task_context| Self::run(stream, addr, handler, task_context))
            .await;
        if !spawned {
            tracing::debug!(%addr, "server is stopping, dropped connection");
        }
    }

    pub async fn run<S>(
        stream: S,
        addr: SocketAddr,
        mut handler: AppHandler,
        mut task_context: TaskContext,
    ) where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(stream, Codec::<AsServer>::new());
        let mut machine = SessionMachine::new();

        tracing::trace!(%addr, "connection started");
        loop {
            select! {
                request = framed.next() => {
                    match request {
                        Some(Ok(request)) => {
                            tracing::trace!(%addr, %request, "C->S");
                            let response = handler.handle(&mut machine, &request);
                            tracing::trace!(%addr, %response, "S->C");
                            if let Err(err) = framed.send(response).await {
                                tracing::error!(%addr, %err, "failed to send response");
                                break;
                            }
                        },
                        Some(Err(Error::Io(err))) => {
                            tracing::debug!(%addr, %err, "connection failed");
                            break;
                        },
                        Some(Err(err)) => {
                            // The stream cannot be resynchronized after a
                            // malformed message, so the connection ends here.
                            tracing::warn!(%addr, %err, "failed to parse request");
                            let _ = framed.send(reply_bad_request()).await;
                            break;
                        },
                        None => {
                            tracing::trace!(%addr, "client disconnected");
                            break;
                        },
                    }
                },
                _ = task_context.wait_for_stop() => {
                    tracing::trace!(%addr, "connection stopped by server");
                    break;
                },
            }
        }

        if let Some(session) = handler.session() {
            tracing::debug!(%addr, session_id = %session.id, "connection closed, session ended");
        }
    }
}

#[inline]
fn reply_bad_request() -> Response {
    Response::error(Status::BadRequest).build()
}
