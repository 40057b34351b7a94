//! ---
//! simlink_section: "05-external-interfaces"
//! simlink_subsection: "binary"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Single-payload validation and inspection commands."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use simlink_msg::{
    log_message, Codec, CollectingSink, MessageDirection, MessageKind, ParseDiagnostic,
};

use crate::Context;

#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Kind the payload must parse as.
    #[arg(long, value_enum)]
    kind: KindArg,
    /// Payload file, `-` or omitted for stdin.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Payload file, `-` or omitted for stdin.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
enum KindArg {
    Handshake,
    HandshakeResponse,
    Action,
    StateUpdate,
    ReloadRequest,
    ReloadResponse,
    Disconnect,
    Error,
}

impl From<KindArg> for MessageKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Handshake => MessageKind::Handshake,
            KindArg::HandshakeResponse => MessageKind::HandshakeResponse,
            KindArg::Action => MessageKind::Action,
            KindArg::StateUpdate => MessageKind::StateUpdate,
            KindArg::ReloadRequest => MessageKind::ReloadRequest,
            KindArg::ReloadResponse => MessageKind::ReloadResponse,
            KindArg::Disconnect => MessageKind::Disconnect,
            KindArg::Error => MessageKind::Error,
        }
    }
}

pub fn list_kinds() -> Result<ExitCode> {
    for kind in MessageKind::ALL {
        println!("{:<20} {}", kind.as_str(), kind.direction());
    }
    Ok(ExitCode::SUCCESS)
}

impl ValidateCommand {
    pub fn execute(self, context: &Context) -> Result<ExitCode> {
        let text = read_input(self.input.as_deref())?;
        let (codec, sink) = collecting_codec(context);
        let kind = MessageKind::from(self.kind);
        match codec.parse_as(kind, &text) {
            Some(message) => {
                log_message(MessageDirection::Inbound, &message);
                println!("ok {kind}");
                println!("{}", codec.serialize_message(&message));
                Ok(ExitCode::SUCCESS)
            }
            None => {
                sink.take().iter().for_each(print_diagnostic);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

impl InspectCommand {
    pub fn execute(self, context: &Context) -> Result<ExitCode> {
        let text = read_input(self.input.as_deref())?;
        let (codec, sink) = collecting_codec(context);
        match codec.parse_message(&text) {
            Some(message) => {
                log_message(MessageDirection::Inbound, &message);
                let kind = message.kind();
                println!("kind: {kind}");
                println!("sender: {}", kind.direction());
                println!("{}", codec.serialize_message(&message));
                Ok(ExitCode::SUCCESS)
            }
            None => {
                sink.take().iter().for_each(print_diagnostic);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

pub fn collecting_codec(context: &Context) -> (Codec, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let codec = Codec::new(sink.clone()).with_options(context.diagnostics);
    (codec, sink)
}

/// Report a rejected payload on stderr; stdout carries only accepted output.
pub fn print_diagnostic(diagnostic: &ParseDiagnostic) {
    eprintln!(
        "rejected: expected={} category={} field={}",
        diagnostic.expected_label(),
        diagnostic.category,
        diagnostic.field.as_deref().unwrap_or("-"),
    );
    eprintln!("  detail: {}", diagnostic.detail);
    if let Some(excerpt) = &diagnostic.excerpt {
        eprintln!("  excerpt: {excerpt}");
    }
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("unable to read payload {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("unable to read payload from stdin")?;
            Ok(text)
        }
    }
}
