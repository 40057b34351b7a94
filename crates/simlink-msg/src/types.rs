//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Message schema definitions for the control protocol."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Named boolean capability flags advertised during the handshake.
pub type CapabilitySet = BTreeMap<String, bool>;

/// Numeric state values keyed by name, as carried in state updates.
pub type StateValues = BTreeMap<String, f64>;

/// Parameters describing the session a server hands out on handshake or reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParameters {
    /// Server-assigned session identifier.
    pub session_id: String,
    /// Simulation tick rate in hertz.
    pub tick_rate_hz: f64,
    /// RNG seed in effect for the session, when the simulation is seeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Scenario currently loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
}

impl SessionParameters {
    /// Construct session parameters without seed or scenario.
    pub fn new(session_id: impl Into<String>, tick_rate_hz: f64) -> Self {
        Self {
            session_id: session_id.into(),
            tick_rate_hz,
            seed: None,
            scenario_id: None,
        }
    }
}

/// Initial capability/version negotiation request sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeMessage {
    /// Semantic version of the protocol the client speaks.
    pub protocol_version: String,
    /// Client identity.
    pub client_name: String,
    /// Client software version.
    #[serde(default)]
    pub client_version: String,
    /// Capabilities the client supports.
    #[serde(default)]
    pub capabilities: CapabilitySet,
}

impl HandshakeMessage {
    /// Construct a handshake with no advertised capabilities.
    pub fn new(protocol_version: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            client_name: client_name.into(),
            client_version: String::new(),
            capabilities: CapabilitySet::new(),
        }
    }
}

/// Result of the handshake negotiation sent by the server.
///
/// `session` is present exactly when `accepted` is true, and `reason` only on
/// rejection. [`HandshakeResponse::accept`] and [`HandshakeResponse::reject`]
/// keep the pairing; decoding does not enforce it, so a peer that breaks it
/// still round-trips unchanged. The session layer keys its transition on
/// `accepted` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    /// Whether the server accepted the client.
    pub accepted: bool,
    /// Protocol version the session will use (or the server's, on rejection).
    pub protocol_version: String,
    /// Session parameters; present exactly when accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionParameters>,
    /// Capabilities the server supports.
    #[serde(default)]
    pub server_capabilities: CapabilitySet,
    /// Human-readable rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HandshakeResponse {
    /// Accept the client into a new session.
    pub fn accept(
        protocol_version: impl Into<String>,
        session: SessionParameters,
        server_capabilities: CapabilitySet,
    ) -> Self {
        Self {
            accepted: true,
            protocol_version: protocol_version.into(),
            session: Some(session),
            server_capabilities,
            reason: None,
        }
    }

    /// Reject the client with a reason.
    pub fn reject(protocol_version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            protocol_version: protocol_version.into(),
            session: None,
            server_capabilities: CapabilitySet::new(),
            reason: Some(reason.into()),
        }
    }
}

/// Control input for a single simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPayload {
    /// Continuous control vector.
    Continuous(Vec<f64>),
    /// Index into a discrete action set.
    Discrete(u64),
    /// Named control channels.
    Named(BTreeMap<String, f64>),
}

/// One simulation step's control input from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    /// Target agent or entity.
    pub agent_id: String,
    /// The control input.
    pub action: ActionPayload,
    /// Tick the client intends this action for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
}

impl ActionMessage {
    /// Construct an action not pinned to a tick.
    pub fn new(agent_id: impl Into<String>, action: ActionPayload) -> Self {
        Self {
            agent_id: agent_id.into(),
            action,
            tick: None,
        }
    }
}

/// Whether a state update carries the full state or only changed values.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateUpdateKind {
    /// Full state.
    #[default]
    Snapshot,
    /// Changed values since the previous update.
    Delta,
}

/// Simulation state snapshot or delta sent by the server.
///
/// Values must be finite: JSON has no representation for NaN or infinity, so
/// such values are written as `null` and the receiving parser rejects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdateMessage {
    /// Simulation tick this update describes.
    pub tick: u64,
    /// Snapshot or delta.
    #[serde(default)]
    pub kind: StateUpdateKind,
    /// State values.
    pub state: StateValues,
    /// Reward accrued during the tick, for training clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    /// Whether the episode ended with this tick.
    #[serde(default)]
    pub done: bool,
}

impl StateUpdateMessage {
    /// Full-state update for `tick`.
    pub fn snapshot(tick: u64, state: StateValues) -> Self {
        Self {
            tick,
            kind: StateUpdateKind::Snapshot,
            state,
            reward: None,
            done: false,
        }
    }

    /// Partial update for `tick` carrying only changed values.
    pub fn delta(tick: u64, state: StateValues) -> Self {
        Self {
            kind: StateUpdateKind::Delta,
            ..Self::snapshot(tick, state)
        }
    }
}

/// Request to reset or reinitialise the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReloadRequestMessage {
    /// Scenario to load; the current scenario when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    /// RNG seed to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Scenario-specific numeric parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

/// Acknowledgement that a reload finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReloadResponseMessage {
    /// Whether the reload succeeded.
    pub success: bool,
    /// Session parameters after the reload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionParameters>,
    /// Failure detail or informational note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReloadResponseMessage {
    /// Successful reload with the resulting session parameters.
    pub fn completed(session: SessionParameters) -> Self {
        Self {
            success: true,
            session: Some(session),
            detail: None,
        }
    }

    /// Failed reload.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            session: None,
            detail: Some(detail.into()),
        }
    }
}

/// Graceful termination notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisconnectMessage {
    /// Machine-readable reason, e.g. `client_shutdown`.
    pub reason: String,
    /// Free-form detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DisconnectMessage {
    /// Disconnect with a reason and no detail.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            detail: None,
        }
    }
}

/// Error codes carried by [`ErrorMessage`].
///
/// Codes travel as snake_case strings. Codes this build does not know decode
/// into [`ErrorCode::Other`] and are written back unchanged. A known string
/// always maps to its named variant, whichever constructor it came through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    /// Inbound payload was not well-formed structured text.
    MalformedMessage,
    /// Inbound payload lacked a required field.
    MissingField,
    /// Inbound payload had a field of the wrong type.
    TypeMismatch,
    /// Message kind is not valid in the current session state.
    UnexpectedMessage,
    /// Protocol versions are incompatible.
    VersionMismatch,
    /// Simulation could not be reloaded.
    ReloadFailed,
    /// Simulation faulted.
    SimulationFault,
    /// Unclassified failure inside the peer.
    Internal,
    /// Code unknown to this build. Built only through [`ErrorCode::from_wire`].
    Other(UnknownCode),
}

/// A code string that matches none of the named [`ErrorCode`] variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownCode(String);

impl UnknownCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ErrorCode {
    /// Classify a wire code string.
    pub fn from_wire(code: impl Into<String>) -> Self {
        let code = code.into();
        match code.as_str() {
            "malformed_message" => ErrorCode::MalformedMessage,
            "missing_field" => ErrorCode::MissingField,
            "type_mismatch" => ErrorCode::TypeMismatch,
            "unexpected_message" => ErrorCode::UnexpectedMessage,
            "version_mismatch" => ErrorCode::VersionMismatch,
            "reload_failed" => ErrorCode::ReloadFailed,
            "simulation_fault" => ErrorCode::SimulationFault,
            "internal" => ErrorCode::Internal,
            _ => ErrorCode::Other(UnknownCode(code)),
        }
    }

    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::MalformedMessage => "malformed_message",
            ErrorCode::MissingField => "missing_field",
            ErrorCode::TypeMismatch => "type_mismatch",
            ErrorCode::UnexpectedMessage => "unexpected_message",
            ErrorCode::VersionMismatch => "version_mismatch",
            ErrorCode::ReloadFailed => "reload_failed",
            ErrorCode::SimulationFault => "simulation_fault",
            ErrorCode::Internal => "internal",
            ErrorCode::Other(code) => code.as_str(),
        }
    }

    /// Whether a session layer should tear the session down on this code.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorCode::VersionMismatch | ErrorCode::SimulationFault | ErrorCode::Internal
        )
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        ErrorCode::from_wire(code)
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        ErrorCode::from_wire(code)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Other(UnknownCode(code)) => code,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Out-of-band failure signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Error classification.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl ErrorMessage {
    /// Construct an error message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
