//! ---
//! simlink_section: "02-wire-protocol"
//! simlink_subsection: "module"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Newline-delimited message transcripts for replay and tooling."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::codec::{default_codec, Codec};
use crate::diagnostics::{CollectingSink, DiagnosticOptions, ParseDiagnostic};
use crate::kind::Message;
use crate::session::{SessionContract, SessionError, SessionState};

/// Failures while reading, writing or replaying a transcript.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    /// Wrapper for IO errors on the transcript file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A message arrived out of order.
    #[error("line {line}: {source}")]
    Violation {
        /// 1-based line of the offending message.
        line: usize,
        /// Contract violation.
        #[source]
        source: SessionError,
    },
}

/// Messages loaded from a newline-delimited transcript.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    /// Accepted messages with their 1-based line numbers.
    pub messages: Vec<(usize, Message)>,
    /// Line numbers the parser rejected.
    pub rejected: Vec<usize>,
    /// One diagnostic per rejected line, in line order.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Transcript {
    /// Whether every non-blank line parsed.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Accepted messages without line numbers.
    pub fn iter_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().map(|(_, message)| message)
    }

    /// Drive `contract` over the accepted messages.
    ///
    /// Stops at the first ordering violation. Returns the final state.
    pub fn replay(&self, contract: &mut SessionContract) -> Result<SessionState, TranscriptError> {
        for (line, message) in &self.messages {
            let state = contract
                .observe(message)
                .map_err(|source| TranscriptError::Violation {
                    line: *line,
                    source,
                })?;
            debug!(line, kind = message.kind().as_str(), state = %state, "replayed message");
        }
        Ok(contract.state())
    }
}

/// Parse a transcript from any buffered reader. Blank lines are skipped.
pub fn parse_transcript<R: BufRead>(
    reader: R,
    options: DiagnosticOptions,
) -> Result<Transcript, TranscriptError> {
    let sink = Arc::new(CollectingSink::new());
    let codec = Codec::new(sink.clone()).with_options(options);
    let mut transcript = Transcript::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let number = index + 1;
        match codec.parse_message(&line) {
            Some(message) => transcript.messages.push((number, message)),
            None => transcript.rejected.push(number),
        }
    }

    transcript.diagnostics = sink.take();
    Ok(transcript)
}

/// Load a transcript file with default diagnostic options.
pub fn read_transcript<P: AsRef<Path>>(path: P) -> Result<Transcript, TranscriptError> {
    read_transcript_with(path, DiagnosticOptions::default())
}

/// Load a transcript file.
pub fn read_transcript_with<P: AsRef<Path>>(
    path: P,
    options: DiagnosticOptions,
) -> Result<Transcript, TranscriptError> {
    let file = File::open(path)?;
    parse_transcript(BufReader::new(file), options)
}

/// Write `messages` as canonical text, one per line.
pub fn write_transcript<P: AsRef<Path>>(
    path: P,
    messages: &[Message],
) -> Result<(), TranscriptError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for message in messages {
        writeln!(writer, "{}", default_codec().serialize_message(message))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseFailureCategory;
    use crate::kind::MessageKind;
    use crate::types::{
        ActionMessage, ActionPayload, CapabilitySet, DisconnectMessage, HandshakeMessage,
        HandshakeResponse, SessionParameters, StateUpdateMessage, StateValues,
    };

    fn session_messages() -> Vec<Message> {
        vec![
            HandshakeMessage::new("1.0.0", "agent").into(),
            HandshakeResponse::accept(
                "1.0.0",
                SessionParameters::new("s-1", 60.0),
                CapabilitySet::new(),
            )
            .into(),
            ActionMessage::new("agent-0", ActionPayload::Discrete(1)).into(),
            StateUpdateMessage::snapshot(1, StateValues::new()).into(),
            DisconnectMessage::new("client_shutdown").into(),
        ]
    }

    #[test]
    fn write_then_read_preserves_messages() {
        let temp = tempfile::NamedTempFile::new().expect("temp file");
        let messages = session_messages();
        write_transcript(temp.path(), &messages).expect("write transcript");

        let transcript = read_transcript(temp.path()).expect("read transcript");
        assert!(transcript.is_clean());
        let read: Vec<Message> = transcript.iter_messages().cloned().collect();
        assert_eq!(read, messages);
        assert_eq!(transcript.messages[0].0, 1);
    }

    #[test]
    fn rejected_lines_are_reported_with_diagnostics() {
        let temp = tempfile::NamedTempFile::new().expect("temp file");
        std::fs::write(
            temp.path(),
            r#"{"type":"handshake","protocol_version":"1.0.0","client_name":"a"}

{"type":"action","agent_id":"a"}
{"type":"disconnect","reason":"done"
{"type":"disconnect","reason":"done"}
"#,
        )
        .expect("write temp file");

        let transcript = read_transcript(temp.path()).expect("read transcript");
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[1].0, 5);
        assert_eq!(transcript.rejected, vec![3, 4]);
        assert_eq!(transcript.diagnostics.len(), 2);
        assert_eq!(transcript.diagnostics[0].category, ParseFailureCategory::MissingField);
        assert_eq!(transcript.diagnostics[0].field.as_deref(), Some("action"));
        assert_eq!(transcript.diagnostics[1].category, ParseFailureCategory::Malformed);
    }

    #[test]
    fn replay_walks_a_valid_session() {
        let transcript = parse_transcript(
            session_messages()
                .iter()
                .map(|m| default_codec().serialize_message(m))
                .collect::<Vec<_>>()
                .join("\n")
                .as_bytes(),
            DiagnosticOptions::default(),
        )
        .expect("parse transcript");

        let mut contract = SessionContract::new();
        let state = transcript.replay(&mut contract).expect("valid ordering");
        assert_eq!(state, SessionState::Disconnected);
    }

    #[test]
    fn replay_reports_first_violation() {
        let text = r#"{"type":"handshake","protocol_version":"1.0.0","client_name":"a"}
{"type":"action","agent_id":"a","action":{"discrete":0}}
"#;
        let transcript =
            parse_transcript(text.as_bytes(), DiagnosticOptions::default()).expect("parse");
        let mut contract = SessionContract::new();
        match transcript.replay(&mut contract) {
            Err(TranscriptError::Violation { line, source }) => {
                assert_eq!(line, 2);
                let SessionError::UnexpectedMessage { kind, state, .. } = source;
                assert_eq!(kind, MessageKind::Action);
                assert_eq!(state, SessionState::Handshaking);
            }
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = read_transcript(dir.path().join("absent.ndjson")).unwrap_err();
        assert!(matches!(err, TranscriptError::Io(_)));
    }
}
