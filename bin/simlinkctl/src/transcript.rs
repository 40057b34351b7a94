//! ---
//! simlink_section: "05-external-interfaces"
//! simlink_subsection: "binary"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Transcript canonicalization and replay commands."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Args;
use simlink_msg::{
    read_transcript_with, serialize_message, write_transcript, Message, SessionContract,
    Transcript, TranscriptError,
};
use tracing::{info, warn};

use crate::payload::print_diagnostic;
use crate::Context;

#[derive(Debug, Args)]
pub struct CanonicalizeCommand {
    /// Newline-delimited transcript to read.
    #[arg(value_name = "IN")]
    input: PathBuf,
    /// Destination file; stdout when omitted.
    #[arg(long, value_name = "OUT")]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// Newline-delimited transcript to check.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn load(path: &Path, context: &Context) -> Result<Transcript> {
    let transcript = read_transcript_with(path, context.diagnostics)
        .with_context(|| format!("unable to read transcript {}", path.display()))?;
    info!(
        path = %path.display(),
        accepted = transcript.messages.len(),
        rejected = transcript.rejected.len(),
        "transcript loaded"
    );
    Ok(transcript)
}

fn report_rejected(transcript: &Transcript) {
    for (line, diagnostic) in transcript.rejected.iter().zip(&transcript.diagnostics) {
        eprintln!("line {line}:");
        print_diagnostic(diagnostic);
    }
}

impl CanonicalizeCommand {
    pub fn execute(self, context: &Context) -> Result<ExitCode> {
        let transcript = load(&self.input, context)?;
        let messages: Vec<Message> = transcript.iter_messages().cloned().collect();

        match &self.out {
            Some(out) => {
                write_transcript(out, &messages)
                    .with_context(|| format!("unable to write transcript {}", out.display()))?;
                info!(path = %out.display(), messages = messages.len(), "canonical transcript written");
            }
            None => messages
                .iter()
                .for_each(|message| println!("{}", serialize_message(message))),
        }

        if transcript.is_clean() {
            Ok(ExitCode::SUCCESS)
        } else {
            warn!(rejected = transcript.rejected.len(), "dropped lines that failed to parse");
            report_rejected(&transcript);
            Ok(ExitCode::FAILURE)
        }
    }
}

impl ReplayCommand {
    pub fn execute(self, context: &Context) -> Result<ExitCode> {
        let transcript = load(&self.input, context)?;
        report_rejected(&transcript);

        let mut contract = SessionContract::new();
        match transcript.replay(&mut contract) {
            Ok(state) => {
                println!(
                    "replayed {} messages, final state: {state}",
                    transcript.messages.len()
                );
                if transcript.is_clean() {
                    Ok(ExitCode::SUCCESS)
                } else {
                    Ok(ExitCode::FAILURE)
                }
            }
            Err(TranscriptError::Violation { line, source }) => {
                println!("violation at line {line}: {source}");
                Ok(ExitCode::FAILURE)
            }
            Err(err) => Err(err.into()),
        }
    }
}
