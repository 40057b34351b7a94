//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Message schema, parser, serializer and session contract."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
//! Wire protocol between a simulation host and its control clients.
//!
//! Every message is a JSON object whose `type` field names one of eight
//! [`MessageKind`]s. Inbound text goes through a `parse_*` function (or a
//! [`Codec`]) and comes back as a typed message or `None` plus a
//! [`ParseDiagnostic`]; outbound messages are rendered to canonical text by
//! the `serialize_*` functions. [`SessionContract`] checks message ordering,
//! including how an [`ErrorMessage`] with a fatal code ends a session.
#![warn(missing_docs)]

pub mod codec;
pub mod diagnostics;
pub mod error;
pub mod kind;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod serializer;
pub mod session;
pub mod transcript;
pub mod types;
pub mod version;

pub use codec::{default_codec, Codec};
pub use diagnostics::{
    CollectingSink, DiagnosticOptions, DiagnosticSink, NullSink, ParseDiagnostic, TracingSink,
};
pub use error::{ParseError, ParseFailureCategory};
pub use kind::{Direction, Message, MessageKind, ProtocolMessage, TAG_FIELD};
pub use logging::{log_message, MessageDirection};
pub use metrics::ProtocolMetrics;
pub use parser::{
    decode, decode_message, parse_action, parse_disconnect, parse_error, parse_handshake,
    parse_handshake_response, parse_message, parse_reload_request, parse_reload_response,
    parse_state_update,
};
pub use serializer::{
    encode, encode_message, serialize_action, serialize_disconnect, serialize_error,
    serialize_handshake, serialize_handshake_response, serialize_message,
    serialize_reload_request, serialize_reload_response, serialize_state_update,
};
pub use session::{SessionContract, SessionError, SessionState};
pub use transcript::{
    parse_transcript, read_transcript, read_transcript_with, write_transcript, Transcript,
    TranscriptError,
};
pub use types::{
    ActionMessage, ActionPayload, CapabilitySet, DisconnectMessage, ErrorCode, ErrorMessage,
    HandshakeMessage, HandshakeResponse, ReloadRequestMessage, ReloadResponseMessage,
    SessionParameters, StateUpdateKind, StateUpdateMessage, StateValues, UnknownCode,
};
pub use version::{
    negotiate_version, respond_to_handshake, ServerProfile, VersionError, PROTOCOL_VERSION,
};
