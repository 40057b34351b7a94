//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Typed message to canonical text serialization."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
//! Canonical text form: compact JSON, the `type` discriminator first, then the
//! payload fields in declaration order. Map keys are sorted and absent
//! optional fields are omitted, so equal values always produce equal bytes.

use serde::Serialize;

use crate::codec::default_codec;
use crate::kind::{Message, ProtocolMessage};
use crate::types::{
    ActionMessage, DisconnectMessage, ErrorMessage, HandshakeMessage, HandshakeResponse,
    ReloadRequestMessage, ReloadResponseMessage, StateUpdateMessage,
};

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

/// Render `message` as canonical text.
///
/// Infallible: every protocol type has string map keys and derived
/// serializers. Non-finite floats render as `null`.
pub fn encode<T: ProtocolMessage>(message: &T) -> String {
    let tagged = Tagged {
        kind: T::KIND.as_str(),
        body: message,
    };
    serde_json::to_string(&tagged)
        .expect("protocol messages have string keys and derived serializers")
}

/// Render a message of any kind as canonical text.
pub fn encode_message(message: &Message) -> String {
    match message {
        Message::Handshake(inner) => encode(inner),
        Message::HandshakeResponse(inner) => encode(inner),
        Message::Action(inner) => encode(inner),
        Message::StateUpdate(inner) => encode(inner),
        Message::ReloadRequest(inner) => encode(inner),
        Message::ReloadResponse(inner) => encode(inner),
        Message::Disconnect(inner) => encode(inner),
        Message::Error(inner) => encode(inner),
    }
}

/// Serialize a [`HandshakeMessage`].
pub fn serialize_handshake(message: &HandshakeMessage) -> String {
    default_codec().serialize(message)
}

/// Serialize a [`HandshakeResponse`].
pub fn serialize_handshake_response(message: &HandshakeResponse) -> String {
    default_codec().serialize(message)
}

/// Serialize an [`ActionMessage`].
pub fn serialize_action(message: &ActionMessage) -> String {
    default_codec().serialize(message)
}

/// Serialize a [`StateUpdateMessage`].
pub fn serialize_state_update(message: &StateUpdateMessage) -> String {
    default_codec().serialize(message)
}

/// Serialize a [`ReloadRequestMessage`].
pub fn serialize_reload_request(message: &ReloadRequestMessage) -> String {
    default_codec().serialize(message)
}

/// Serialize a [`ReloadResponseMessage`].
pub fn serialize_reload_response(message: &ReloadResponseMessage) -> String {
    default_codec().serialize(message)
}

/// Serialize a [`DisconnectMessage`].
pub fn serialize_disconnect(message: &DisconnectMessage) -> String {
    default_codec().serialize(message)
}

/// Serialize an [`ErrorMessage`].
pub fn serialize_error(message: &ErrorMessage) -> String {
    default_codec().serialize(message)
}

/// Serialize a message of any kind.
pub fn serialize_message(message: &Message) -> String {
    default_codec().serialize_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ActionPayload, CapabilitySet, ErrorCode, SessionParameters, StateValues,
    };

    #[test]
    fn state_update_canonical_text() {
        let mut state = StateValues::new();
        state.insert("y".into(), 2.0);
        state.insert("x".into(), 1.0);
        let text = serialize_state_update(&StateUpdateMessage::snapshot(42, state));
        insta::assert_snapshot!(
            text,
            @r#"{"type":"state_update","tick":42,"kind":"snapshot","state":{"x":1.0,"y":2.0},"done":false}"#
        );
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let text = serialize_disconnect(&DisconnectMessage::new("client_shutdown"));
        insta::assert_snapshot!(text, @r#"{"type":"disconnect","reason":"client_shutdown"}"#);
    }

    #[test]
    fn handshake_response_field_order() {
        let mut capabilities = CapabilitySet::new();
        capabilities.insert("reload".into(), true);
        capabilities.insert("delta_updates".into(), false);
        let response = HandshakeResponse::accept(
            "1.0.0",
            SessionParameters {
                seed: Some(7),
                ..SessionParameters::new("s-1", 50.0)
            },
            capabilities,
        );
        insta::assert_snapshot!(
            serialize_handshake_response(&response),
            @r#"{"type":"handshake_response","accepted":true,"protocol_version":"1.0.0","session":{"session_id":"s-1","tick_rate_hz":50.0,"seed":7},"server_capabilities":{"delta_updates":false,"reload":true}}"#
        );
    }

    #[test]
    fn action_and_error_shapes() {
        let action = ActionMessage::new("cartpole-0", ActionPayload::Continuous(vec![0.5, -0.25]));
        insta::assert_snapshot!(
            serialize_action(&action),
            @r#"{"type":"action","agent_id":"cartpole-0","action":{"continuous":[0.5,-0.25]}}"#
        );

        let error = ErrorMessage::new(ErrorCode::ReloadFailed, "scenario not found");
        insta::assert_snapshot!(
            serialize_error(&error),
            @r#"{"type":"error","code":"reload_failed","message":"scenario not found"}"#
        );
    }

    #[test]
    fn reload_request_defaults() {
        insta::assert_snapshot!(
            serialize_reload_request(&ReloadRequestMessage::default()),
            @r#"{"type":"reload_request","parameters":{}}"#
        );
    }

    #[test]
    fn generic_and_per_kind_serialization_agree() {
        let response = ReloadResponseMessage::failed("seed rejected");
        let message = Message::from(response.clone());
        assert_eq!(serialize_message(&message), serialize_reload_response(&response));
        assert_eq!(encode_message(&message), encode(&response));
    }

    #[test]
    fn non_finite_values_render_as_null() {
        let mut state = StateValues::new();
        state.insert("x".into(), f64::NAN);
        let mut update = StateUpdateMessage::snapshot(3, state);
        update.reward = Some(f64::INFINITY);
        insta::assert_snapshot!(
            serialize_state_update(&update),
            @r#"{"type":"state_update","tick":3,"kind":"snapshot","state":{"x":null},"reward":null,"done":false}"#
        );
    }

    #[test]
    fn handshake_escapes_strings() {
        let handshake = HandshakeMessage::new("1.0.0", "viz \"alpha\"\n");
        let text = serialize_handshake(&handshake);
        assert!(text.starts_with(r#"{"type":"handshake","protocol_version":"1.0.0""#));
        assert!(text.contains(r#""client_name":"viz \"alpha\"\n""#));
    }
}
