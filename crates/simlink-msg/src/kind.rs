//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Message kind discriminator and the tagged message sum type."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    ActionMessage, DisconnectMessage, ErrorMessage, HandshakeMessage, HandshakeResponse,
    ReloadRequestMessage, ReloadResponseMessage, StateUpdateMessage,
};

/// Name of the discriminator field carried by every canonical payload.
pub const TAG_FIELD: &str = "type";

/// Closed set of message kinds. The snake_case name is the wire tag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    /// Client capability/version negotiation request.
    Handshake,
    /// Server negotiation result.
    HandshakeResponse,
    /// Client control input for one step.
    Action,
    /// Server state snapshot or delta.
    StateUpdate,
    /// Client request to reset the simulation.
    ReloadRequest,
    /// Server acknowledgement of a reload.
    ReloadResponse,
    /// Graceful termination notice.
    Disconnect,
    /// Out-of-band failure signal.
    Error,
}

/// Which peer may send a message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// Sent by control clients.
    ClientToServer,
    /// Sent by the simulation host.
    ServerToClient,
    /// Sent by either peer.
    Either,
}

impl MessageKind {
    /// Every kind, in catalogue order.
    pub const ALL: [MessageKind; 8] = [
        MessageKind::Handshake,
        MessageKind::HandshakeResponse,
        MessageKind::Action,
        MessageKind::StateUpdate,
        MessageKind::ReloadRequest,
        MessageKind::ReloadResponse,
        MessageKind::Disconnect,
        MessageKind::Error,
    ];

    /// Wire tag for this kind.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Which peer sends this kind.
    pub const fn direction(self) -> Direction {
        match self {
            MessageKind::Handshake | MessageKind::Action | MessageKind::ReloadRequest => {
                Direction::ClientToServer
            }
            MessageKind::HandshakeResponse
            | MessageKind::StateUpdate
            | MessageKind::ReloadResponse => Direction::ServerToClient,
            MessageKind::Disconnect | MessageKind::Error => Direction::Either,
        }
    }
}

/// Binds a payload type to its [`MessageKind`].
pub trait ProtocolMessage: Serialize + DeserializeOwned + Into<Message> {
    /// Kind this payload type represents.
    const KIND: MessageKind;
}

/// A message of any kind; the variant is the discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// See [`HandshakeMessage`].
    Handshake(HandshakeMessage),
    /// See [`HandshakeResponse`].
    HandshakeResponse(HandshakeResponse),
    /// See [`ActionMessage`].
    Action(ActionMessage),
    /// See [`StateUpdateMessage`].
    StateUpdate(StateUpdateMessage),
    /// See [`ReloadRequestMessage`].
    ReloadRequest(ReloadRequestMessage),
    /// See [`ReloadResponseMessage`].
    ReloadResponse(ReloadResponseMessage),
    /// See [`DisconnectMessage`].
    Disconnect(DisconnectMessage),
    /// See [`ErrorMessage`].
    Error(ErrorMessage),
}

impl Message {
    /// Kind of the carried payload.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Handshake(_) => MessageKind::Handshake,
            Message::HandshakeResponse(_) => MessageKind::HandshakeResponse,
            Message::Action(_) => MessageKind::Action,
            Message::StateUpdate(_) => MessageKind::StateUpdate,
            Message::ReloadRequest(_) => MessageKind::ReloadRequest,
            Message::ReloadResponse(_) => MessageKind::ReloadResponse,
            Message::Disconnect(_) => MessageKind::Disconnect,
            Message::Error(_) => MessageKind::Error,
        }
    }
}

macro_rules! protocol_message {
    ($($ty:ident => $variant:ident),+ $(,)?) => {
        $(
            impl ProtocolMessage for $ty {
                const KIND: MessageKind = MessageKind::$variant;
            }

            impl From<$ty> for Message {
                fn from(message: $ty) -> Self {
                    Message::$variant(message)
                }
            }
        )+
    };
}

protocol_message! {
    HandshakeMessage => Handshake,
    HandshakeResponse => HandshakeResponse,
    ActionMessage => Action,
    StateUpdateMessage => StateUpdate,
    ReloadRequestMessage => ReloadRequest,
    ReloadResponseMessage => ReloadResponse,
    DisconnectMessage => Disconnect,
    ErrorMessage => Error,
}
