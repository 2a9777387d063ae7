//! Per-session RTSP state machine (RFC 2326 appendix A.2).
//!
//! The machine decides which handler runs for a request and moves to the
//! next state based on the status class of the handler's response. It does
//! not produce responses itself; that is left to a [`Handler`].

use std::fmt;

use super::{
    error::{Error, Result},
    message::{Method, StatusCategory},
    request::Request,
    response::Response,
};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum State {
    #[default]
    Init,
    Ready,
    Playing,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            State::Init => write!(f, "INIT"),
            State::Ready => write!(f, "READY"),
            State::Playing => write!(f, "PLAYING"),
        }
    }
}

/// Entries of the transition table, one for each (method, state) pair that
/// changes state.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Transition {
    SetupInit,
    TeardownInit,
    SetupReady,
    PlayReady,
    SetupPlaying,
    PausePlaying,
    TeardownPlaying,
}

impl Transition {
    pub const ALL: [Transition; 7] = [
        Transition::SetupInit,
        Transition::TeardownInit,
        Transition::SetupReady,
        Transition::PlayReady,
        Transition::SetupPlaying,
        Transition::PausePlaying,
        Transition::TeardownPlaying,
    ];

    #[must_use]
    pub fn lookup(method: &Method, state: State) -> Option<Transition> {
        match (method, state) {
            (Method::Setup, State::Init) => Some(Transition::SetupInit),
            (Method::Teardown, State::Init) => Some(Transition::TeardownInit),
            (Method::Setup, State::Ready) => Some(Transition::SetupReady),
            (Method::Play, State::Ready) => Some(Transition::PlayReady),
            (Method::Setup, State::Playing) => Some(Transition::SetupPlaying),
            (Method::Pause, State::Playing) => Some(Transition::PausePlaying),
            (Method::Teardown, State::Playing) => Some(Transition::TeardownPlaying),
            _ => None,
        }
    }

    #[must_use]
    pub const fn method(self) -> Method {
        match self {
            Transition::SetupInit | Transition::SetupReady | Transition::SetupPlaying => {
                Method::Setup
            }
            Transition::TeardownInit | Transition::TeardownPlaying => Method::Teardown,
            Transition::PlayReady => Method::Play,
            Transition::PausePlaying => Method::Pause,
        }
    }

    #[must_use]
    pub const fn source(self) -> State {
        match self {
            Transition::SetupInit | Transition::TeardownInit => State::Init,
            Transition::SetupReady | Transition::PlayReady => State::Ready,
            Transition::SetupPlaying | Transition::PausePlaying | Transition::TeardownPlaying => {
                State::Playing
            }
        }
    }

    /// State after a successful response.
    #[must_use]
    pub const fn target(self) -> State {
        match self {
            Transition::SetupInit | Transition::SetupReady | Transition::PausePlaying => {
                State::Ready
            }
            Transition::PlayReady | Transition::SetupPlaying => State::Playing,
            Transition::TeardownInit | Transition::TeardownPlaying => State::Init,
        }
    }
}

/// Produces responses on behalf of the state machine.
pub trait Handler {
    fn options(&mut self, request: &Request) -> Response;

    fn describe(&mut self, request: &Request) -> Response;

    fn transition(&mut self, transition: Transition, request: &Request) -> Response;
}

#[derive(Debug, Default)]
pub struct SessionMachine {
    state: State,
}

impl SessionMachine {
    #[must_use]
    pub const fn new() -> Self {
        Self { state: State::Init }
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Dispatch `request` to `handler` and update the state from the
    /// response.
    ///
    /// OPTIONS and DESCRIBE are handled in every state and never change it.
    /// Other requests must match an entry of the transition table, or
    /// [`Error::UnhandledMethodState`] is returned and the handler is not
    /// called.
    pub fn request(&mut self, request: &Request, handler: &mut impl Handler) -> Result<Response> {
        if let Some(transition) = Transition::lookup(&request.method, self.state) {
            let response = handler.transition(transition, request);
            self.state = Self::next(self.state, transition, &response);
            return Ok(response);
        }

        match request.method {
            Method::Options => Ok(handler.options(request)),
            Method::Describe => Ok(handler.describe(request)),
            _ => Err(Error::UnhandledMethodState {
                method: request.method.clone(),
                state: self.state,
            }),
        }
    }

    fn next(current: State, transition: Transition, response: &Response) -> State {
        match response.category() {
            StatusCategory::Success => transition.target(),
            StatusCategory::Redirection => State::Init,
            _ => current,
        }
    }
}

#[cfg(test)]
mod tests {

    use proptest::prelude::*;

    use super::{Error, Handler, SessionMachine, State, Transition};
    use crate::message::{Method, StatusCode};
    use crate::request::Request;
    use crate::response::Response;

    /// Answers every request with the same status and records what ran.
    struct FixedStatus {
        status: StatusCode,
        calls: Vec<String>,
    }

    impl FixedStatus {
        fn new(status: StatusCode) -> Self {
            Self {
                status,
                calls: Vec::new(),
            }
        }

        fn respond(&self, request: &Request) -> Response {
            Response::with_status(self.status, "Test")
                .with_cseq_of(request)
                .build()
        }
    }

    impl Handler for FixedStatus {
        fn options(&mut self, request: &Request) -> Response {
            self.calls.push("options".to_string());
            self.respond(request)
        }

        fn describe(&mut self, request: &Request) -> Response {
            self.calls.push("describe".to_string());
            self.respond(request)
        }

        fn transition(&mut self, transition: Transition, request: &Request) -> Response {
            self.calls.push(format!("{transition:?}"));
            self.respond(request)
        }
    }

    fn request(method: Method) -> Request {
        Request::new(method, "rtsp://example.com/media", 1)
    }

    fn machine_in(state: State) -> SessionMachine {
        SessionMachine { state }
    }

    #[test]
    fn setup_from_init_success() {
        let mut machine = SessionMachine::new();
        let mut handler = FixedStatus::new(200);
        let response = machine.request(&request(Method::Setup), &mut handler).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(machine.state(), State::Ready);
        assert_eq!(handler.calls, vec!["SetupInit"]);
    }

    #[test]
    fn setup_from_init_client_error() {
        let mut machine = SessionMachine::new();
        let mut handler = FixedStatus::new(451);
        machine.request(&request(Method::Setup), &mut handler).unwrap();
        assert_eq!(machine.state(), State::Init);
    }

    #[test]
    fn redirect_reverts_to_init() {
        let mut machine = machine_in(State::Playing);
        let mut handler = FixedStatus::new(301);
        machine.request(&request(Method::Pause), &mut handler).unwrap();
        assert_eq!(machine.state(), State::Init);
    }

    #[test]
    fn server_error_keeps_state() {
        let mut machine = machine_in(State::Ready);
        let mut handler = FixedStatus::new(500);
        machine.request(&request(Method::Play), &mut handler).unwrap();
        assert_eq!(machine.state(), State::Ready);
    }

    #[test]
    fn full_session() {
        let mut machine = SessionMachine::new();
        let mut handler = FixedStatus::new(200);
        for (method, state) in [
            (Method::Options, State::Init),
            (Method::Describe, State::Init),
            (Method::Setup, State::Ready),
            (Method::Setup, State::Ready),
            (Method::Play, State::Playing),
            (Method::Setup, State::Playing),
            (Method::Pause, State::Ready),
            (Method::Play, State::Playing),
            (Method::Teardown, State::Init),
        ] {
            machine.request(&request(method), &mut handler).unwrap();
            assert_eq!(machine.state(), state);
        }
    }

    #[test]
    fn options_and_describe_in_every_state() {
        for state in [State::Init, State::Ready, State::Playing] {
            let mut machine = machine_in(state);
            let mut handler = FixedStatus::new(200);
            machine.request(&request(Method::Options), &mut handler).unwrap();
            machine.request(&request(Method::Describe), &mut handler).unwrap();
            assert_eq!(machine.state(), state);
            assert_eq!(handler.calls, vec!["options", "describe"]);
        }
    }

    #[test]
    fn unhandled_method_state() {
        let mut handler = FixedStatus::new(200);
        for (method, state) in [
            (Method::Play, State::Init),
            (Method::Pause, State::Init),
            (Method::Pause, State::Ready),
            (Method::Teardown, State::Ready),
            (Method::Play, State::Playing),
            (Method::Record, State::Ready),
            (Method::Extension("OPTION".to_string()), State::Init),
        ] {
            let mut machine = machine_in(state);
            assert!(matches!(
                machine.request(&request(method.clone()), &mut handler),
                Err(Error::UnhandledMethodState { method: m, state: s }) if m == method && s == state,
            ));
            assert_eq!(machine.state(), state);
        }
        assert!(handler.calls.is_empty());
    }

    #[test]
    fn table_is_consistent() {
        for transition in Transition::ALL {
            assert_eq!(
                Transition::lookup(&transition.method(), transition.source()),
                Some(transition),
            );
        }
    }

    proptest! {
        #[test]
        fn next_state_depends_on_target_and_status_class(
            index in 0..Transition::ALL.len(),
            status in 100u16..600,
        ) {
            let transition = Transition::ALL[index];
            let mut machine = machine_in(transition.source());
            let mut handler = FixedStatus::new(status);
            machine
                .request(&request(transition.method()), &mut handler)
                .unwrap();
            let expected = match status / 100 {
                2 => transition.target(),
                3 => State::Init,
                _ => transition.source(),
            };
            prop_assert_eq!(machine.state(), expected);
        }
    }
}
