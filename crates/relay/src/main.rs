//! `relay` - mailbox access from the command line.
//!
//! Accounts and their encrypted passwords live in a local database; every
//! message command opens one IMAP session, does its work and logs out.
//! Records go to stdout as JSON lines, logs go to stderr.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use relay_core::{Relay, Settings};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=info,relay_core=info,relay_imap=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            debug!(error = ?err, "command failed");
            if let Err(e) = output::emit(&output::error_record(&err)) {
                eprintln!("relay: {err:#} ({e})");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = Settings::load().context("loading settings")?;
    let relay = Relay::open(settings)
        .await
        .context("opening the local database")?;
    commands::run(&relay, cli.command).await
}
