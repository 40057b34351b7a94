//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Structured logging helpers for message traffic."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use tracing::debug;

use crate::kind::Message;

/// Direction of the message movement, used for consistent logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    /// Message handed to the transport.
    Outbound,
    /// Message received from the transport.
    Inbound,
}

/// Emit a structured log entry for message activity.
pub fn log_message(direction: MessageDirection, message: &Message) {
    let tick = match message {
        Message::StateUpdate(update) => Some(update.tick),
        Message::Action(action) => action.tick,
        _ => None,
    };
    debug!(
        kind = message.kind().as_str(),
        sender = %message.kind().direction(),
        tick = ?tick,
        direction = ?direction,
        "protocol message"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DisconnectMessage, StateUpdateMessage, StateValues};

    #[test]
    fn log_message_handles_every_shape() {
        log_message(
            MessageDirection::Outbound,
            &StateUpdateMessage::snapshot(3, StateValues::new()).into(),
        );
        log_message(
            MessageDirection::Inbound,
            &DisconnectMessage::new("idle").into(),
        );
    }
}
