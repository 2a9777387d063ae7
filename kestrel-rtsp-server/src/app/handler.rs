use std::sync::Arc;

use rand::rngs::StdRng;

use kestrel_rtsp_protocol::header::{Lower, PortPair, Range, RangeSpec, Transport};
use kestrel_rtsp_protocol::{
    Error, Handler, Method, Request, Response, SessionMachine, State, Status, Transition,
};

use crate::app::AppContext;
use crate::session::SessionState;

const SUPPORTED_METHODS: &str = "OPTIONS, DESCRIBE, SETUP, PLAY, PAUSE, TEARDOWN";

/// Serves the requests of one connection. Owns the session the connection
/// set up, if any, and the random source used for it.
pub struct AppHandler {
    context: Arc<AppContext>,
    rng: StdRng,
    session: Option<SessionState>,
}

impl AppHandler {
    pub fn new(context: Arc<AppContext>, rng: StdRng) -> Self {
        Self {
            context,
            rng,
            session: None,
        }
    }

    pub fn handle(&mut self, machine: &mut SessionMachine, request: &Request) -> Response {
        // Check the Require header and make sure all requested options are
        // supported or return response with 551 Option Not Supported.
        if !is_request_require_supported(request) {
            return reply_option_not_supported(request);
        }

        let state = machine.state();
        match machine.request(request, self) {
            Ok(response) => {
                if machine.state() != state {
                    tracing::debug!(
                        %request,
                        from = %state,
                        to = %machine.state(),
                        "session state changed",
                    );
                }
                response
            }
            Err(Error::UnhandledMethodState { method, state }) => match method {
                // Request with method REDIRECT can only be sent from server
                // to client, not the other way around.
                Method::Redirect => reply_method_not_valid(request),
                method if is_method_supported(&method) => {
                    reply_method_not_valid_in_state(request, state)
                }
                _ => reply_method_not_supported(request),
            },
            Err(err) => {
                tracing::error!(%request, %err, "failed to handle request");
                reply_internal_server_error(request)
            }
        }
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    fn setup(&mut self, request: &Request) -> Response {
        let context = self.context.clone();

        let Some(stream) = request
            .path()
            .and_then(|path| context.catalog.resolve_stream(&path))
        else {
            return reply_not_found(request);
        };

        match (&self.session, request.session()) {
            (None, None) => {}
            (Some(session), Some(Ok(header))) if header.id == session.id.as_str() => {
                // A session covers the streams of a single media item.
                if session.item_path != stream.item.path {
                    return reply_aggregate_operation_not_allowed(request);
                }
            }
            // Only one session per connection is served.
            (Some(_), None) => return reply_aggregate_operation_not_allowed(request),
            _ => return reply_session_not_found(request),
        }

        let Some(client_port) = request
            .transport()
            .and_then(Result::ok)
            .as_ref()
            .and_then(select_client_port)
        else {
            return reply_unsupported_transport(request);
        };

        let session_config = &context.session;
        let session = self.session.get_or_insert_with(|| {
            SessionState::new(&mut self.rng, &stream.item.path, session_config)
        });
        let transport = session.setup_stream(
            &mut self.rng,
            session_config,
            stream.index,
            &request.uri,
            client_port,
        );
        tracing::debug!(
            %request,
            session_id = %session.id,
            %transport,
            "set up stream",
        );

        reply_to_setup_with_transport(request, session, Transport::from(transport))
    }

    fn play(&mut self, request: &Request) -> Response {
        let Some(session) = self.session_of(request) else {
            return reply_session_not_found(request);
        };

        let range = match request.range() {
            None => Range::live(),
            Some(Ok(range)) if matches!(range.spec, RangeSpec::Npt(_)) => range,
            Some(_) => return reply_invalid_range(request),
        };

        reply_to_play_with_range(request, session, &range)
    }

    fn pause(&mut self, request: &Request) -> Response {
        let Some(session) = self.session_of(request) else {
            return reply_session_not_found(request);
        };

        reply_with_session(request, session)
    }

    fn teardown(&mut self, request: &Request) -> Response {
        let names_session = self.session.is_some() || request.session().is_some();
        if names_session && self.session_of(request).is_none() {
            return reply_session_not_found(request);
        }

        if let Some(session) = self.session.take() {
            tracing::debug!(%request, session_id = %session.id, "session torn down");
        }
        Response::ok().with_cseq_of(request).build()
    }

    /// The session owned by this connection if `request` names it.
    fn session_of(&self, request: &Request) -> Option<&SessionState> {
        let header = request.session()?.ok()?;
        self.session
            .as_ref()
            .filter(|session| session.id.as_str() == header.id)
    }
}

impl Handler for AppHandler {
    fn options(&mut self, request: &Request) -> Response {
        reply_to_options_with_supported_methods(request)
    }

    fn describe(&mut self, request: &Request) -> Response {
        if !is_request_one_of_content_types_supported(request) {
            tracing::warn!(
                %request,
                "none of content types accepted by client are supported, \
                 server only supports `application/sdp`",
            );
            return reply_not_acceptable(request);
        }

        match request
            .path()
            .and_then(|path| self.context.catalog.describe(&path))
        {
            Some(media_item) => {
                reply_to_describe_with_media_sdp(request, media_item.sdp.to_string())
            }
            None => reply_not_found(request),
        }
    }

    fn transition(&mut self, transition: Transition, request: &Request) -> Response {
        match transition {
            Transition::SetupInit | Transition::SetupReady | Transition::SetupPlaying => {
                self.setup(request)
            }
            Transition::PlayReady => self.play(request),
            Transition::PausePlaying => self.pause(request),
            Transition::TeardownInit | Transition::TeardownPlaying => self.teardown(request),
        }
    }
}

/// First unicast UDP item that tells where the client listens.
fn select_client_port(transport: &Transport) -> Option<PortPair> {
    transport
        .iter()
        .filter(|item| item.is_unicast() && item.lower_transport() == Lower::Udp)
        .find_map(|item| item.client_port)
}

#[inline]
fn is_method_supported(method: &Method) -> bool {
    matches!(
        method,
        Method::Options
            | Method::Describe
            | Method::Setup
            | Method::Play
            | Method::Pause
            | Method::Teardown
    )
}

#[inline]
fn is_request_require_supported(request: &Request) -> bool {
    // We don't support any features at this point
    request.require().is_none()
}

#[inline]
fn is_request_one_of_content_types_supported(request: &Request) -> bool {
    let accept = request.accept();
    accept.is_empty()
        || accept.iter().any(|content_type| {
            let content_type = content_type.split(';').next().unwrap_or_default().trim();
            matches!(content_type, "application/sdp" | "application/*" | "*/*")
        })
}

#[inline]
fn reply_to_options_with_supported_methods(request: &Request) -> Response {
    Response::ok()
        .with_cseq_of(request)
        .with_header("Public", SUPPORTED_METHODS)
        .build()
}

#[inline]
fn reply_to_describe_with_media_sdp(request: &Request, sdp_contents: String) -> Response {
    Response::ok()
        .with_cseq_of(request)
        .with_header("Content-Base", format!("{}/", request.uri.trim_end_matches('/')))
        .with_sdp(sdp_contents)
        .build()
}

#[inline]
fn reply_to_setup_with_transport(
    request: &Request,
    session: &SessionState,
    transport: Transport,
) -> Response {
    Response::ok()
        .with_cseq_of(request)
        .with_header("Transport", transport)
        .with_header("Session", session.header())
        .build()
}

#[inline]
fn reply_to_play_with_range(request: &Request, session: &SessionState, range: &Range) -> Response {
    Response::ok()
        .with_cseq_of(request)
        .with_header("Range", range)
        .with_header("RTP-Info", session.rtp_info())
        .with_header("Session", session.header())
        .build()
}

#[inline]
fn reply_with_session(request: &Request, session: &SessionState) -> Response {
    Response::ok()
        .with_cseq_of(request)
        .with_header("Session", session.header())
        .build()
}

#[inline]
fn reply_option_not_supported(request: &Request) -> Response {
    tracing::debug!(
        %request,
        "client asked for feature that is not supported",
    );
    Response::error(Status::OptionNotSupported)
        .with_cseq_of(request)
        .with_header("Unsupported", request.require().unwrap_or_default())
        .build()
}

#[inline]
fn reply_method_not_supported(request: &Request) -> Response {
    tracing::warn!(
        %request,
        method = %request.method,
        "client sent unsupported request",
    );
    Response::error(Status::MethodNotAllowed)
        .with_cseq_of(request)
        .with_header("Allow", SUPPORTED_METHODS)
        .build()
}

#[inline]
fn reply_method_not_valid(request: &Request) -> Response {
    tracing::warn!(
        %request,
        method = %request.method,
        "client tried server-only method in request to server; \
         does client think it is server?",
    );
    Response::error(Status::MethodNotValidInThisState)
        .with_cseq_of(request)
        .build()
}

#[inline]
fn reply_method_not_valid_in_state(request: &Request, state: State) -> Response {
    tracing::warn!(
        %request,
        method = %request.method,
        %state,
        "method not valid in current session state",
    );
    Response::error(Status::MethodNotValidInThisState)
        .with_cseq_of(request)
        .build()
}

#[inline]
fn reply_not_acceptable(request: &Request) -> Response {
    tracing::debug!(
        %request,
        "server does not support a presentation format acceptable \
         by client",
    );
    Response::error(Status::NotAcceptable)
        .with_cseq_of(request)
        .build()
}

#[inline]
fn reply_not_found(request: &Request) -> Response {
    tracing::debug!(
        %request,
        path = ?request.path(),
        "path not registered as media item",
    );
    Response::error(Status::NotFound)
        .with_cseq_of(request)
        .build()
}

#[inline]
fn reply_session_not_found(request: &Request) -> Response {
    tracing::debug!(
        %request,
        session = request.header("Session"),
        "session not found",
    );
    Response::error(Status::SessionNotFound)
        .with_cseq_of(request)
        .build()
}

#[inline]
fn reply_aggregate_operation_not_allowed(request: &Request) -> Response {
    tracing::debug!(%request, "refusing to do aggregate request");
    Response::error(Status::AggregateOperationNotAllowed)
        .with_cseq_of(request)
        .build()
}

#[inline]
fn reply_unsupported_transport(request: &Request) -> Response {
    tracing::debug!(
        %request,
        transport = request.header("Transport"),
        "unsupported transport",
    );
    Response::error(Status::UnsupportedTransport)
        .with_cseq_of(request)
        .build()
}

#[inline]
fn reply_invalid_range(request: &Request) -> Response {
    tracing::debug!(
        %request,
        range = request.header("Range"),
        "invalid range",
    );
    Response::error(Status::InvalidRange)
        .with_cseq_of(request)
        .build()
}

#[inline]
fn reply_internal_server_error(request: &Request) -> Response {
    Response::error(Status::InternalServerError)
        .with_cseq_of(request)
        .build()
}

#[cfg(test)]
mod tests {

    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use kestrel_rtsp_protocol::header::{Session, Transport};
    use kestrel_rtsp_protocol::{Method, Request, Response, SessionMachine, State};
    use kestrel_sdp_protocol::Sdp;

    use super::AppHandler;
    use crate::app::config::{Item, SessionConfig};
    use crate::app::AppContext;
    use crate::media::{MediaCatalog, MediaItem};

    const URL: &str = "rtsp://localhost:8554/live/front";
    const STREAM_URL: &str = "rtsp://localhost:8554/live/front/streamid=0";
    const CLIENT_TRANSPORT: &str = "RTP/AVP;unicast;client_port=4588-4589";

    struct Client {
        handler: AppHandler,
        machine: SessionMachine,
        cseq: i64,
    }

    impl Client {
        fn new() -> Self {
            let item = Item {
                name: "Front".to_string(),
                path: "/live/front".to_string(),
                sdp: None,
                encoding: Some("H264".to_string()),
                kind: "video".to_string(),
                payload_type: 96,
                clock_rate: 90000,
            };
            let mut catalog = MediaCatalog::new();
            catalog
                .register(
                    MediaItem::from_config(&item, IpAddr::V4(Ipv4Addr::LOCALHOST)).unwrap(),
                )
                .unwrap();
            let context = AppContext {
                catalog,
                session: SessionConfig::default(),
            };
            Self {
                handler: AppHandler::new(Arc::new(context), StdRng::seed_from_u64(5)),
                machine: SessionMachine::new(),
                cseq: 0,
            }
        }

        fn request(&mut self, method: Method, uri: &str) -> Request {
            self.cseq += 1;
            Request::new(method, uri, self.cseq)
        }

        fn send(&mut self, request: Request) -> Response {
            let response = self.handler.handle(&mut self.machine, &request);
            assert_eq!(response.cseq, Some(request.cseq));
            response
        }

        fn setup(&mut self) -> Response {
            let request = self
                .request(Method::Setup, STREAM_URL)
                .with_header("Transport", CLIENT_TRANSPORT);
            self.send(request)
        }

        fn session_id(&self) -> String {
            self.handler.session().unwrap().id.to_string()
        }
    }

    #[test]
    fn options() {
        let mut client = Client::new();
        let request = client.request(Method::Options, "*");
        let response = client.send(request);
        assert_eq!(response.status, 200);
        assert_eq!(
            response.headers.get("Public"),
            Some("OPTIONS, DESCRIBE, SETUP, PLAY, PAUSE, TEARDOWN"),
        );
    }

    #[test]
    fn describe() {
        let mut client = Client::new();
        let request = client
            .request(Method::Describe, URL)
            .with_header("Accept", "application/sdp");
        let response = client.send(request);
        assert_eq!(response.status, 200);
        assert_eq!(response.headers.get("Content-Type"), Some("application/sdp"));
        assert_eq!(response.headers.get("Content-Base"), Some(&*format!("{URL}/")));

        let sdp = Sdp::from_bytes(response.body.as_deref().unwrap()).unwrap();
        assert_eq!(sdp.media.len(), 1);
        assert_eq!(client.machine.state(), State::Init);
    }

    #[test]
    fn describe_not_acceptable() {
        let mut client = Client::new();
        let request = client
            .request(Method::Describe, URL)
            .with_header("Accept", "text/html, application/json");
        assert_eq!(client.send(request).status, 406);

        let request = client
            .request(Method::Describe, URL)
            .with_header("Accept", "text/html, */*;q=0.1");
        assert_eq!(client.send(request).status, 200);
    }

    #[test]
    fn describe_not_found() {
        let mut client = Client::new();
        let request = client.request(Method::Describe, "rtsp://localhost/live/back");
        assert_eq!(client.send(request).status, 404);
    }

    #[test]
    fn require_not_supported() {
        let mut client = Client::new();
        let request = client
            .request(Method::Options, "*")
            .with_header("Require", "implicit-play");
        let response = client.send(request);
        assert_eq!(response.status, 551);
        assert_eq!(response.headers.get("Unsupported"), Some("implicit-play"));
    }

    #[test]
    fn full_session() {
        let mut client = Client::new();

        let response = client.setup();
        assert_eq!(response.status, 200);
        assert_eq!(client.machine.state(), State::Ready);

        let session = response.headers.get("Session").unwrap().parse::<Session>().unwrap();
        assert_eq!(session.id, client.session_id());
        assert_eq!(session.timeout, 60);

        let transport = response.headers.get("Transport").unwrap().parse::<Transport>().unwrap();
        let item = &transport.items()[0];
        assert!(item.is_unicast());
        assert_eq!(item.client_port.unwrap().rtp, 4588);
        let server_port = item.server_port.unwrap();
        assert_eq!(server_port.rtp % 2, 0);
        assert_eq!(item.ssrc.as_ref().unwrap().len(), 8);

        let request = client
            .request(Method::Play, URL)
            .with_header("Session", &session.id);
        let response = client.send(request);
        assert_eq!(response.status, 200);
        assert_eq!(response.headers.get("Range"), Some("npt=now-"));
        assert!(response
            .headers
            .get("RTP-Info")
            .unwrap()
            .starts_with(&format!("url={STREAM_URL};seq=")));
        assert_eq!(client.machine.state(), State::Playing);

        let request = client
            .request(Method::Pause, URL)
            .with_header("Session", &session.id);
        assert_eq!(client.send(request).status, 200);
        assert_eq!(client.machine.state(), State::Ready);

        let request = client
            .request(Method::Play, URL)
            .with_header("Session", &session.id)
            .with_header("Range", "npt=0.000-");
        let response = client.send(request);
        assert_eq!(response.status, 200);
        // The range is echoed as the client wrote it.
        assert_eq!(response.headers.get("Range"), Some("npt=0.000-"));

        let request = client
            .request(Method::Teardown, URL)
            .with_header("Session", &session.id);
        assert_eq!(client.send(request).status, 200);
        assert_eq!(client.machine.state(), State::Init);
        assert!(client.handler.session().is_none());
    }

    #[test]
    fn method_not_valid_in_state() {
        let mut client = Client::new();
        let request = client.request(Method::Play, URL);
        assert_eq!(client.send(request).status, 455);

        let request = client.request(Method::Pause, URL);
        assert_eq!(client.send(request).status, 455);
        assert_eq!(client.machine.state(), State::Init);
    }

    #[test]
    fn method_not_allowed() {
        let mut client = Client::new();
        for method in [
            Method::Record,
            Method::Announce,
            Method::GetParameter,
            Method::Extension("FLY".to_string()),
        ] {
            let request = client.request(method, URL);
            let response = client.send(request);
            assert_eq!(response.status, 405);
            assert_eq!(
                response.headers.get("Allow"),
                Some("OPTIONS, DESCRIBE, SETUP, PLAY, PAUSE, TEARDOWN"),
            );
        }

        let request = client.request(Method::Redirect, URL);
        assert_eq!(client.send(request).status, 455);
    }

    #[test]
    fn setup_unsupported_transport() {
        let mut client = Client::new();
        for transport in [
            "RTP/AVP/TCP;unicast;interleaved=0-1",
            "RTP/AVP;multicast;client_port=4588-4589",
            "RTP/AVP;unicast",
            "garbage",
        ] {
            let request = client
                .request(Method::Setup, STREAM_URL)
                .with_header("Transport", transport);
            assert_eq!(client.send(request).status, 461);
        }

        let request = client.request(Method::Setup, STREAM_URL);
        assert_eq!(client.send(request).status, 461);
        assert_eq!(client.machine.state(), State::Init);
        assert!(client.handler.session().is_none());
    }

    #[test]
    fn setup_picks_first_usable_transport() {
        let mut client = Client::new();
        let request = client.request(Method::Setup, STREAM_URL).with_header(
            "Transport",
            "RTP/AVP/TCP;unicast;interleaved=0-1,RTP/AVP/UDP;unicast;client_port=6000-6001",
        );
        let response = client.send(request);
        assert_eq!(response.status, 200);
        let transport = response.headers.get("Transport").unwrap().parse::<Transport>().unwrap();
        assert_eq!(transport.items()[0].client_port.unwrap().rtp, 6000);
    }

    #[test]
    fn setup_unknown_stream() {
        let mut client = Client::new();
        let request = client
            .request(Method::Setup, "rtsp://localhost/live/front/streamid=3")
            .with_header("Transport", CLIENT_TRANSPORT);
        assert_eq!(client.send(request).status, 404);
    }

    #[test]
    fn setup_foreign_session() {
        let mut client = Client::new();
        let request = client
            .request(Method::Setup, STREAM_URL)
            .with_header("Transport", CLIENT_TRANSPORT)
            .with_header("Session", "12345678");
        assert_eq!(client.send(request).status, 454);

        assert_eq!(client.setup().status, 200);
        // A second session on the same connection.
        assert_eq!(client.setup().status, 459);

        let request = client
            .request(Method::Setup, STREAM_URL)
            .with_header("Transport", CLIENT_TRANSPORT)
            .with_header("Session", "0");
        assert_eq!(client.send(request).status, 454);

        let session_id = client.session_id();
        let request = client
            .request(Method::Setup, STREAM_URL)
            .with_header("Transport", CLIENT_TRANSPORT)
            .with_header("Session", &session_id);
        assert_eq!(client.send(request).status, 200);
        assert_eq!(client.session_id(), session_id);
        assert_eq!(client.machine.state(), State::Ready);
    }

    #[test]
    fn play_invalid_range() {
        let mut client = Client::new();
        assert_eq!(client.setup().status, 200);
        let session_id = client.session_id();

        for range in ["npt=abc-", "clock=19961108T142300Z-", "frames=0-"] {
            let request = client
                .request(Method::Play, URL)
                .with_header("Session", &session_id)
                .with_header("Range", range);
            assert_eq!(client.send(request).status, 457);
        }
        assert_eq!(client.machine.state(), State::Ready);
    }

    #[test]
    fn play_without_session() {
        let mut client = Client::new();
        assert_eq!(client.setup().status, 200);
        let request = client.request(Method::Play, URL);
        assert_eq!(client.send(request).status, 454);
        assert_eq!(client.machine.state(), State::Ready);
    }

    #[test]
    fn teardown_in_init() {
        let mut client = Client::new();
        let request = client.request(Method::Teardown, URL);
        assert_eq!(client.send(request).status, 200);

        let request = client
            .request(Method::Teardown, URL)
            .with_header("Session", "12345678");
        assert_eq!(client.send(request).status, 454);
        assert_eq!(client.machine.state(), State::Init);
    }
}
