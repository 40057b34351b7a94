//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Text to typed message parsing."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
//! Parsing of inbound payloads.
//!
//! [`decode`] and [`decode_message`] are the explicit-result layer. The
//! `parse_*` functions collapse failures to `None` and report a diagnostic
//! through the process-wide [`Codec`](crate::Codec); use a dedicated codec to
//! route diagnostics elsewhere.
//!
//! Per-kind decoding accepts payloads without a `type` field, since the caller
//! already chose the kind. When the field is present it must name that kind.
//! Generic dispatch through [`decode_message`] requires it.
//!
//! Keys of the top-level object must be distinct; a repeated key rejects the
//! payload as malformed instead of letting one occurrence win.

use std::fmt;

use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::codec::default_codec;
use crate::error::ParseError;
use crate::kind::{Message, MessageKind, ProtocolMessage, TAG_FIELD};
use crate::types::{
    ActionMessage, DisconnectMessage, ErrorMessage, HandshakeMessage, HandshakeResponse,
    ReloadRequestMessage, ReloadResponseMessage, StateUpdateMessage,
};

/// Decode `text` as a message of kind `T::KIND`.
pub fn decode<T: ProtocolMessage>(text: &str) -> Result<T, ParseError> {
    let mut object = read_object(text)?;
    match object.remove(TAG_FIELD) {
        None => {}
        Some(Value::String(tag)) if tag == T::KIND.as_str() => {}
        Some(Value::String(tag)) => {
            return Err(ParseError::KindMismatch {
                expected: T::KIND,
                found: tag,
            })
        }
        Some(other) => return Err(discriminator_not_a_string(&other)),
    }
    decode_fields(object)
}

/// Decode `text` into whichever kind its discriminator names.
pub fn decode_message(text: &str) -> Result<Message, ParseError> {
    let mut object = read_object(text)?;
    let kind = match object.remove(TAG_FIELD) {
        Some(Value::String(tag)) => tag
            .parse::<MessageKind>()
            .map_err(|_| ParseError::UnknownKind { tag })?,
        Some(other) => return Err(discriminator_not_a_string(&other)),
        None => return Err(ParseError::MissingDiscriminator),
    };

    let message = match kind {
        MessageKind::Handshake => Message::Handshake(decode_fields(object)?),
        MessageKind::HandshakeResponse => Message::HandshakeResponse(decode_fields(object)?),
        MessageKind::Action => Message::Action(decode_fields(object)?),
        MessageKind::StateUpdate => Message::StateUpdate(decode_fields(object)?),
        MessageKind::ReloadRequest => Message::ReloadRequest(decode_fields(object)?),
        MessageKind::ReloadResponse => Message::ReloadResponse(decode_fields(object)?),
        MessageKind::Disconnect => Message::Disconnect(decode_fields(object)?),
        MessageKind::Error => Message::Error(decode_fields(object)?),
    };
    Ok(message)
}

fn read_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str::<Payload>(text) {
        Ok(Payload::Object(object)) => Ok(object),
        Ok(Payload::Other(found)) => Err(ParseError::NotAnObject { found }),
        Err(err) if err.is_data() => {
            let detail = err.to_string();
            match duplicate_field_name(&detail) {
                Some(field) => Err(ParseError::DuplicateField {
                    field: field.to_owned(),
                }),
                None => Err(ParseError::Malformed {
                    line: err.line(),
                    column: err.column(),
                    detail,
                }),
            }
        }
        Err(err) => Err(ParseError::Malformed {
            line: err.line(),
            column: err.column(),
            detail: err.to_string(),
        }),
    }
}

/// Top-level payload: an object with distinct keys, or the JSON type found.
enum Payload {
    Object(Map<String, Value>),
    Other(&'static str),
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PayloadVisitor)
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Payload, A::Error> {
        let mut object = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            if object.contains_key(&key) {
                return Err(de::Error::custom(format_args!("duplicate field `{key}`")));
            }
            let value = access.next_value::<Value>()?;
            object.insert(key, value);
        }
        Ok(Payload::Object(object))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Payload, A::Error> {
        while access.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Payload::Other("array"))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Payload, E> {
        Ok(Payload::Other("null"))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Payload, E> {
        Ok(Payload::Other("boolean"))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Payload, E> {
        Ok(Payload::Other("number"))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Payload, E> {
        Ok(Payload::Other("number"))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Payload, E> {
        Ok(Payload::Other("number"))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Payload, E> {
        Ok(Payload::Other("string"))
    }
}

fn decode_fields<T: DeserializeOwned>(object: Map<String, Value>) -> Result<T, ParseError> {
    serde_path_to_error::deserialize(Value::Object(object)).map_err(classify)
}

fn classify(err: serde_path_to_error::Error<serde_json::Error>) -> ParseError {
    let path = err.path().to_string();
    let detail = err.into_inner().to_string();
    match missing_field_name(&detail) {
        Some(field) if path == "." => ParseError::MissingField {
            field: field.to_owned(),
        },
        Some(field) => ParseError::MissingField {
            field: format!("{path}.{field}"),
        },
        None => ParseError::TypeMismatch { path, detail },
    }
}

// serde reports absent fields as "missing field `name`".
fn missing_field_name(detail: &str) -> Option<&str> {
    detail.strip_prefix("missing field `")?.split('`').next()
}

// serde_json appends " at line L column C" to custom errors.
fn duplicate_field_name(detail: &str) -> Option<&str> {
    detail.strip_prefix("duplicate field `")?.split('`').next()
}

fn discriminator_not_a_string(value: &Value) -> ParseError {
    ParseError::TypeMismatch {
        path: TAG_FIELD.to_owned(),
        detail: format!("expected a string, found {}", json_type_name(value)),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a [`HandshakeMessage`].
pub fn parse_handshake(text: &str) -> Option<HandshakeMessage> {
    default_codec().parse(text)
}

/// Parse a [`HandshakeResponse`].
pub fn parse_handshake_response(text: &str) -> Option<HandshakeResponse> {
    default_codec().parse(text)
}

/// Parse an [`ActionMessage`].
pub fn parse_action(text: &str) -> Option<ActionMessage> {
    default_codec().parse(text)
}

/// Parse a [`StateUpdateMessage`].
pub fn parse_state_update(text: &str) -> Option<StateUpdateMessage> {
    default_codec().parse(text)
}

/// Parse a [`ReloadRequestMessage`].
pub fn parse_reload_request(text: &str) -> Option<ReloadRequestMessage> {
    default_codec().parse(text)
}

/// Parse a [`ReloadResponseMessage`].
pub fn parse_reload_response(text: &str) -> Option<ReloadResponseMessage> {
    default_codec().parse(text)
}

/// Parse a [`DisconnectMessage`].
pub fn parse_disconnect(text: &str) -> Option<DisconnectMessage> {
    default_codec().parse(text)
}

/// Parse an [`ErrorMessage`].
pub fn parse_error(text: &str) -> Option<ErrorMessage> {
    default_codec().parse(text)
}

/// Parse a message of any kind, dispatching on its discriminator.
pub fn parse_message(text: &str) -> Option<Message> {
    default_codec().parse_message(text)
}
