//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Injected diagnostic sinks for parse failures."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
//! Diagnostic sinks receive one [`ParseDiagnostic`] per rejected payload.
//!
//! Diagnostics are advisory. The parser's return value is the only
//! control-flow signal; sinks must not assume anything about ordering across
//! threads and must never block for long.

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{ParseError, ParseFailureCategory};
use crate::kind::MessageKind;

/// Description of a rejected payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// Kind the caller asked for; `None` for generic dispatch.
    pub expected: Option<MessageKind>,
    /// Failure class.
    pub category: ParseFailureCategory,
    /// Offending field path, when the failure concerns one field.
    pub field: Option<String>,
    /// Human-readable description of what was expected.
    pub detail: String,
    /// Leading characters of the payload, when enabled.
    pub excerpt: Option<String>,
}

impl ParseDiagnostic {
    /// Build a diagnostic from a parse failure.
    pub fn from_error(
        expected: Option<MessageKind>,
        error: &ParseError,
        text: &str,
        options: &DiagnosticOptions,
    ) -> Self {
        Self {
            expected,
            category: error.category(),
            field: error.field().map(str::to_owned),
            detail: error.to_string(),
            excerpt: options.excerpt(text),
        }
    }

    /// Label for the expected kind, `any` for generic dispatch.
    pub fn expected_label(&self) -> &'static str {
        self.expected.map_or("any", MessageKind::as_str)
    }
}

/// Controls how much of the payload ends up in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticOptions {
    /// Attach a payload excerpt.
    pub include_excerpt: bool,
    /// Maximum excerpt length in characters.
    pub excerpt_chars: usize,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            include_excerpt: true,
            excerpt_chars: 120,
        }
    }
}

impl DiagnosticOptions {
    fn excerpt(&self, text: &str) -> Option<String> {
        if !self.include_excerpt {
            return None;
        }
        let mut chars = text.chars();
        let mut excerpt: String = chars.by_ref().take(self.excerpt_chars).collect();
        if chars.next().is_some() {
            excerpt.push('…');
        }
        Some(excerpt)
    }
}

/// Destination for parse diagnostics. Implementations are shared across
/// sessions and threads.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic.
    fn report(&self, diagnostic: &ParseDiagnostic);
}

/// Emits diagnostics as structured `tracing` events at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &ParseDiagnostic) {
        warn!(
            kind = diagnostic.expected_label(),
            category = diagnostic.category.as_str(),
            field = diagnostic.field.as_deref().unwrap_or(""),
            excerpt = diagnostic.excerpt.as_deref().unwrap_or(""),
            detail = %diagnostic.detail,
            "rejected inbound payload"
        );
    }
}

/// Discards diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &ParseDiagnostic) {}
}

/// Keeps diagnostics in memory for tooling and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<ParseDiagnostic>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of diagnostics recorded so far.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of the recorded diagnostics.
    pub fn snapshot(&self) -> Vec<ParseDiagnostic> {
        self.entries.lock().clone()
    }

    /// Remove and return the recorded diagnostics.
    pub fn take(&self) -> Vec<ParseDiagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &ParseDiagnostic) {
        self.entries.lock().push(diagnostic.clone());
    }
}
