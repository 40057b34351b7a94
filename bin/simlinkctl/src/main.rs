//! ---
//! simlink_section: "05-external-interfaces"
//! simlink_subsection: "binary"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Developer CLI for validating, inspecting and replaying protocol traffic."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use simlink_common::{init_tracing, SimlinkConfig};
use simlink_msg::{DiagnosticOptions, ServerProfile};

mod negotiate;
mod payload;
mod transcript;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "SimLink protocol inspection utility",
    long_about = None
)]
struct Cli {
    /// Configuration file (falls back to SIMLINK_CONFIG, ./simlink.toml, configs/simlink.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List message kinds and which peer sends them.
    Kinds,
    /// Parse one payload as a specific kind.
    Validate(payload::ValidateCommand),
    /// Parse one payload of any kind and print its canonical form.
    Inspect(payload::InspectCommand),
    /// Re-serialize a transcript into canonical text.
    Canonicalize(transcript::CanonicalizeCommand),
    /// Check a transcript against the session contract.
    Replay(transcript::ReplayCommand),
    /// Negotiate a protocol version against the configured server version.
    Negotiate(negotiate::NegotiateCommand),
}

/// Settings derived from the loaded configuration.
pub struct Context {
    pub diagnostics: DiagnosticOptions,
    pub profile: ServerProfile,
}

impl Context {
    fn from_config(config: &SimlinkConfig) -> Self {
        let diagnostics = DiagnosticOptions {
            include_excerpt: config.diagnostics.include_excerpt,
            excerpt_chars: config.diagnostics.excerpt_chars,
        };
        let protocol = &config.protocol;
        let profile = ServerProfile {
            name: protocol.server_name.clone(),
            protocol_version: protocol.version.clone(),
            tick_rate_hz: protocol.tick_rate_hz,
            capabilities: protocol
                .capabilities
                .iter()
                .map(|(name, enabled)| (name.clone(), *enabled))
                .collect(),
        };
        Self {
            diagnostics,
            profile,
        }
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<SimlinkConfig> {
    match explicit {
        Some(path) => SimlinkConfig::load(&[path]),
        None => SimlinkConfig::load_or_default(&[
            PathBuf::from("simlink.toml"),
            PathBuf::from("configs/simlink.toml"),
        ]),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing("simlinkctl", &config.logging)?;
    let context = Context::from_config(&config);

    match cli.command {
        Commands::Kinds => payload::list_kinds(),
        Commands::Validate(cmd) => cmd.execute(&context),
        Commands::Inspect(cmd) => cmd.execute(&context),
        Commands::Canonicalize(cmd) => cmd.execute(&context),
        Commands::Replay(cmd) => cmd.execute(&context),
        Commands::Negotiate(cmd) => cmd.execute(&context),
    }
}
