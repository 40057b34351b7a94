//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Codec binding parser and serializer to a diagnostic sink and metrics."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::diagnostics::{DiagnosticOptions, DiagnosticSink, ParseDiagnostic, TracingSink};
use crate::error::ParseError;
use crate::kind::{Message, MessageKind, ProtocolMessage};
use crate::metrics::ProtocolMetrics;
use crate::types::{
    ActionMessage, DisconnectMessage, ErrorMessage, HandshakeMessage, HandshakeResponse,
    ReloadRequestMessage, ReloadResponseMessage, StateUpdateMessage,
};
use crate::{parser, serializer};

static DEFAULT_CODEC: Lazy<Codec> = Lazy::new(Codec::default);

/// Process-wide codec used by the free `parse_*`/`serialize_*` functions.
/// Reports diagnostics through [`TracingSink`] and records no metrics.
pub fn default_codec() -> &'static Codec {
    &DEFAULT_CODEC
}

/// Parser and serializer bound to a diagnostic sink and optional metrics.
///
/// Holds no per-session state; one codec can serve every session
/// concurrently.
#[derive(Clone)]
pub struct Codec {
    sink: Arc<dyn DiagnosticSink>,
    metrics: Option<ProtocolMetrics>,
    options: DiagnosticOptions,
}

impl Codec {
    /// Codec reporting to `sink`.
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            sink,
            metrics: None,
            options: DiagnosticOptions::default(),
        }
    }

    /// Record parse and serialize activity in `metrics`.
    pub fn with_metrics(mut self, metrics: ProtocolMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Override diagnostic excerpt settings.
    pub fn with_options(mut self, options: DiagnosticOptions) -> Self {
        self.options = options;
        self
    }

    /// Active diagnostic options.
    pub fn options(&self) -> DiagnosticOptions {
        self.options
    }

    /// Parse `text` as kind `T::KIND`, reporting any failure to the sink.
    pub fn parse<T: ProtocolMessage>(&self, text: &str) -> Option<T> {
        match parser::decode::<T>(text) {
            Ok(message) => {
                if let Some(metrics) = &self.metrics {
                    metrics.observe_parsed(T::KIND);
                }
                Some(message)
            }
            Err(err) => {
                self.reject(Some(T::KIND), text, &err);
                None
            }
        }
    }

    /// Parse a message of any kind, dispatching on its discriminator.
    pub fn parse_message(&self, text: &str) -> Option<Message> {
        match parser::decode_message(text) {
            Ok(message) => {
                if let Some(metrics) = &self.metrics {
                    metrics.observe_parsed(message.kind());
                }
                Some(message)
            }
            Err(err) => {
                self.reject(None, text, &err);
                None
            }
        }
    }

    /// Parse `text` as `kind` when the kind is only known at runtime.
    pub fn parse_as(&self, kind: MessageKind, text: &str) -> Option<Message> {
        match kind {
            MessageKind::Handshake => self.parse::<HandshakeMessage>(text).map(Into::into),
            MessageKind::HandshakeResponse => self.parse::<HandshakeResponse>(text).map(Into::into),
            MessageKind::Action => self.parse::<ActionMessage>(text).map(Into::into),
            MessageKind::StateUpdate => self.parse::<StateUpdateMessage>(text).map(Into::into),
            MessageKind::ReloadRequest => self.parse::<ReloadRequestMessage>(text).map(Into::into),
            MessageKind::ReloadResponse => {
                self.parse::<ReloadResponseMessage>(text).map(Into::into)
            }
            MessageKind::Disconnect => self.parse::<DisconnectMessage>(text).map(Into::into),
            MessageKind::Error => self.parse::<ErrorMessage>(text).map(Into::into),
        }
    }

    /// Canonical text for `message`.
    pub fn serialize<T: ProtocolMessage>(&self, message: &T) -> String {
        self.observe_serialized(T::KIND);
        serializer::encode(message)
    }

    /// Canonical text for a message of any kind.
    pub fn serialize_message(&self, message: &Message) -> String {
        self.observe_serialized(message.kind());
        serializer::encode_message(message)
    }

    fn reject(&self, expected: Option<MessageKind>, text: &str, err: &ParseError) {
        if let Some(metrics) = &self.metrics {
            metrics.observe_rejected(expected, err.category());
        }
        let diagnostic = ParseDiagnostic::from_error(expected, err, text, &self.options);
        self.sink.report(&diagnostic);
    }

    fn observe_serialized(&self, kind: MessageKind) {
        if let Some(metrics) = &self.metrics {
            metrics.observe_serialized(kind);
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("metrics", &self.metrics.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
