//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Protocol version negotiation and handshake replies."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use semver::Version;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::{CapabilitySet, HandshakeMessage, HandshakeResponse, SessionParameters};

/// Protocol version spoken by this crate.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Reasons a version pair cannot be negotiated.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// One side sent something that is not a semantic version.
    #[error("invalid protocol version `{version}`: {source}")]
    Invalid {
        /// Offending text.
        version: String,
        /// Parser failure.
        #[source]
        source: semver::Error,
    },
    /// Both versions parse but are not wire compatible.
    #[error("protocol version {client} is incompatible with server version {server}")]
    Incompatible {
        /// Client's version.
        client: Version,
        /// Server's version.
        server: Version,
    },
}

fn parse(version: &str) -> Result<Version, VersionError> {
    Version::parse(version.trim()).map_err(|source| VersionError::Invalid {
        version: version.to_string(),
        source,
    })
}

/// Negotiate the version both sides will speak.
///
/// Majors must match; while the major is 0 the minors must match as well.
/// The result is the lower of the two versions.
pub fn negotiate_version(client: &str, server: &str) -> Result<Version, VersionError> {
    let client = parse(client)?;
    let server = parse(server)?;

    let compatible = client.major == server.major
        && (client.major != 0 || client.minor == server.minor);
    if !compatible {
        return Err(VersionError::Incompatible { client, server });
    }
    Ok(client.min(server))
}

/// What a server advertises when answering handshakes.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerProfile {
    /// Server identity, used in logs.
    pub name: String,
    /// Version the server speaks.
    pub protocol_version: String,
    /// Tick rate handed out in new sessions.
    pub tick_rate_hz: f64,
    /// Capabilities advertised to accepted clients.
    pub capabilities: CapabilitySet,
}

impl ServerProfile {
    /// Profile speaking [`PROTOCOL_VERSION`] at 60 Hz with no capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            tick_rate_hz: 60.0,
            capabilities: CapabilitySet::new(),
        }
    }

    /// Build the reply to `handshake`.
    ///
    /// Accepted replies carry the negotiated version and a fresh session id;
    /// rejected replies carry the server's version and the reason.
    pub fn respond(&self, handshake: &HandshakeMessage) -> HandshakeResponse {
        match negotiate_version(&handshake.protocol_version, &self.protocol_version) {
            Ok(version) => {
                let session = SessionParameters::new(Uuid::new_v4().to_string(), self.tick_rate_hz);
                info!(
                    server = %self.name,
                    client = %handshake.client_name,
                    version = %version,
                    session_id = %session.session_id,
                    "handshake accepted"
                );
                HandshakeResponse::accept(version.to_string(), session, self.capabilities.clone())
            }
            Err(err) => {
                warn!(
                    server = %self.name,
                    client = %handshake.client_name,
                    error = %err,
                    "handshake rejected"
                );
                HandshakeResponse::reject(self.protocol_version.clone(), err.to_string())
            }
        }
    }
}

impl Default for ServerProfile {
    fn default() -> Self {
        Self::new("simlink")
    }
}

/// Build the reply `profile` gives to `handshake`.
pub fn respond_to_handshake(
    handshake: &HandshakeMessage,
    profile: &ServerProfile,
) -> HandshakeResponse {
    profile.respond(handshake)
}
