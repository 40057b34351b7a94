//! ---
//! simlink_section: "05-external-interfaces"
//! simlink_subsection: "binary"
//! simlink_type: "source"
//! simlink_scope: "code"
//! simlink_description: "Protocol version negotiation command."
//! simlink_version: "v0.0.0-prealpha"
//! simlink_owner: "tbd"
//! ---
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use simlink_msg::{
    negotiate_version, respond_to_handshake, serialize_handshake_response, HandshakeMessage,
    VersionError,
};

use crate::Context;

#[derive(Debug, Args)]
pub struct NegotiateCommand {
    /// Version the client offers.
    #[arg(value_name = "CLIENT")]
    client: String,
    /// Server version; defaults to `protocol.version` from the configuration.
    #[arg(long, value_name = "SERVER")]
    server: Option<String>,
    /// Print the handshake_response the configured server would send.
    #[arg(long = "show-response", action = clap::ArgAction::SetTrue)]
    show_response: bool,
}

impl NegotiateCommand {
    pub fn execute(self, context: &Context) -> Result<ExitCode> {
        let mut profile = context.profile.clone();
        if let Some(server) = self.server {
            profile.protocol_version = server;
        }

        let code = match negotiate_version(&self.client, &profile.protocol_version) {
            Ok(version) => {
                println!("negotiated: {version}");
                ExitCode::SUCCESS
            }
            Err(err @ VersionError::Incompatible { .. }) => {
                println!("incompatible: {err}");
                ExitCode::FAILURE
            }
            Err(err @ VersionError::Invalid { .. }) => {
                println!("invalid: {err}");
                ExitCode::FAILURE
            }
        };

        if self.show_response {
            let handshake = HandshakeMessage::new(self.client, "simlinkctl");
            let response = respond_to_handshake(&handshake, &profile);
            println!("{}", serialize_handshake_response(&response));
        }
        Ok(code)
    }
}
