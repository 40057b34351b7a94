//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Session contract state machine for message ordering."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
//! [`SessionContract`] tracks which message kinds are legal at each point of a
//! connection's lifecycle. Parsing and serialization never consult it; the
//! session layer drives one contract per connection and decides what to do
//! with violations.
//!
//! ```text
//! Disconnected --handshake--> Handshaking --handshake_response(accepted)--> Active
//! Active --reload_request--> Reloading --reload_response--> Active
//! any --disconnect--> Disconnected
//! any --error(fatal code)--> Disconnected
//! ```

use crate::kind::{Message, MessageKind};

/// Lifecycle phase of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// No session established.
    Disconnected,
    /// Negotiating protocol version and capabilities.
    Handshaking,
    /// Exchanging actions and state updates.
    Active,
    /// Waiting for a reload to complete.
    Reloading,
}

/// Ordering violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The message kind is not legal in the current state.
    #[error("`{kind}` is not valid while {state} (allowed: {})", display_kinds(.allowed))]
    UnexpectedMessage {
        /// State at the time of the violation.
        state: SessionState,
        /// Offending kind.
        kind: MessageKind,
        /// Kinds legal in `state`.
        allowed: Vec<MessageKind>,
    },
}

fn display_kinds(kinds: &[MessageKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tracks session state and enforces valid message ordering.
///
/// # Example
///
/// ```
/// use simlink_msg::session::{SessionContract, SessionState};
/// use simlink_msg::HandshakeMessage;
///
/// let mut contract = SessionContract::new();
/// let state = contract
///     .observe(&HandshakeMessage::new("1.0.0", "agent").into())
///     .unwrap();
/// assert_eq!(state, SessionState::Handshaking);
/// ```
#[derive(Debug, Clone)]
pub struct SessionContract {
    state: SessionState,
}

impl SessionContract {
    /// Contract in the [`Disconnected`](SessionState::Disconnected) state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Kinds legal in the current state.
    #[must_use]
    pub const fn allowed_kinds(&self) -> &'static [MessageKind] {
        match self.state {
            SessionState::Disconnected => &[
                MessageKind::Handshake,
                MessageKind::Disconnect,
                MessageKind::Error,
            ],
            SessionState::Handshaking => &[
                MessageKind::Handshake,
                MessageKind::HandshakeResponse,
                MessageKind::Disconnect,
                MessageKind::Error,
            ],
            SessionState::Active => &[
                MessageKind::Action,
                MessageKind::StateUpdate,
                MessageKind::ReloadRequest,
                MessageKind::Disconnect,
                MessageKind::Error,
            ],
            SessionState::Reloading => &[
                MessageKind::ReloadResponse,
                MessageKind::Disconnect,
                MessageKind::Error,
            ],
        }
    }

    /// Whether `kind` is legal in the current state.
    #[must_use]
    pub fn permits(&self, kind: MessageKind) -> bool {
        self.allowed_kinds().contains(&kind)
    }

    /// Validate `message` against the current state and apply its transition.
    ///
    /// Returns the new state. An illegal message leaves the state unchanged.
    pub fn observe(&mut self, message: &Message) -> Result<SessionState, SessionError> {
        let kind = message.kind();
        if !self.permits(kind) {
            return Err(self.unexpected(kind));
        }

        self.state = match (self.state, message) {
            (_, Message::Disconnect(_)) => SessionState::Disconnected,
            (_, Message::Error(error)) if error.code.is_fatal() => SessionState::Disconnected,
            (state, Message::Error(_)) => state,
            (SessionState::Disconnected | SessionState::Handshaking, Message::Handshake(_)) => {
                SessionState::Handshaking
            }
            (SessionState::Handshaking, Message::HandshakeResponse(response)) => {
                if response.accepted {
                    SessionState::Active
                } else {
                    SessionState::Disconnected
                }
            }
            (SessionState::Active, Message::Action(_) | Message::StateUpdate(_)) => {
                SessionState::Active
            }
            (SessionState::Active, Message::ReloadRequest(_)) => SessionState::Reloading,
            (SessionState::Reloading, Message::ReloadResponse(_)) => SessionState::Active,
            _ => return Err(self.unexpected(kind)),
        };
        Ok(self.state)
    }

    /// Return to [`Disconnected`](SessionState::Disconnected), e.g. after the
    /// transport dropped without a disconnect message.
    pub fn reset(&mut self) {
        self.state = SessionState::Disconnected;
    }

    fn unexpected(&self, kind: MessageKind) -> SessionError {
        SessionError::UnexpectedMessage {
            state: self.state,
            kind,
            allowed: self.allowed_kinds().to_vec(),
        }
    }
}

impl Default for SessionContract {
    fn default() -> Self {
        Self::new()
    }
}
