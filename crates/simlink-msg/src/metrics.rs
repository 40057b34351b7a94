//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Prometheus counters for codec activity."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use prometheus::{IntCounterVec, Opts, Registry};

use crate::error::ParseFailureCategory;
use crate::kind::MessageKind;

/// Label used when a payload was rejected before its kind was known.
pub const UNKNOWN_KIND_LABEL: &str = "any";

/// Prometheus metric handles for parse/serialize activity.
#[derive(Clone)]
pub struct ProtocolMetrics {
    parsed: IntCounterVec,
    rejected: IntCounterVec,
    serialized: IntCounterVec,
}

impl ProtocolMetrics {
    /// Register protocol metrics with the provided registry.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let parsed = IntCounterVec::new(
            Opts::new(
                "simlink_messages_parsed_total",
                "Inbound payloads parsed into typed messages",
            ),
            &["kind"],
        )?;
        let rejected = IntCounterVec::new(
            Opts::new(
                "simlink_messages_rejected_total",
                "Inbound payloads rejected by the parser",
            ),
            &["kind", "category"],
        )?;
        let serialized = IntCounterVec::new(
            Opts::new(
                "simlink_messages_serialized_total",
                "Outbound messages serialized to canonical text",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(parsed.clone()))?;
        registry.register(Box::new(rejected.clone()))?;
        registry.register(Box::new(serialized.clone()))?;

        Ok(Self {
            parsed,
            rejected,
            serialized,
        })
    }

    /// Record a successful parse.
    pub fn observe_parsed(&self, kind: MessageKind) {
        self.parsed.with_label_values(&[kind.as_str()]).inc();
    }

    /// Record a rejected payload; `kind` is `None` for generic dispatch.
    pub fn observe_rejected(&self, kind: Option<MessageKind>, category: ParseFailureCategory) {
        let kind = kind.map_or(UNKNOWN_KIND_LABEL, MessageKind::as_str);
        self.rejected
            .with_label_values(&[kind, category.as_str()])
            .inc();
    }

    /// Record a serialized message.
    pub fn observe_serialized(&self, kind: MessageKind) {
        self.serialized.with_label_values(&[kind.as_str()]).inc();
    }

    /// Parsed count for one kind.
    pub fn parsed(&self, kind: MessageKind) -> u64 {
        self.parsed.with_label_values(&[kind.as_str()]).get()
    }

    /// Rejected count for one kind/category pair.
    pub fn rejected(&self, kind: Option<MessageKind>, category: ParseFailureCategory) -> u64 {
        let kind = kind.map_or(UNKNOWN_KIND_LABEL, MessageKind::as_str);
        self.rejected
            .with_label_values(&[kind, category.as_str()])
            .get()
    }

    /// Serialized count for one kind.
    pub fn serialized(&self, kind: MessageKind) -> u64 {
        self.serialized.with_label_values(&[kind.as_str()]).get()
    }
}
