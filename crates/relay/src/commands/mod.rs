//! Command handlers.

mod account;
mod messages;

use std::process::ExitCode;

use relay_core::{Error, Relay, Session};
use tracing::warn;

use crate::cli::{Command, Location};

/// Runs one parsed command.
pub async fn run(relay: &Relay, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Account(command) => account::run(relay, command).await,
        Command::Messages(command) => messages::run(relay, command).await,
    }
}

/// The account to use: the one given, or the only one registered.
async fn pick_account(relay: &Relay, requested: Option<String>) -> relay_core::Result<String> {
    if let Some(name) = requested {
        return Ok(name);
    }
    let mut accounts = relay.accounts().list().await?;
    match accounts.len() {
        1 => Ok(accounts.remove(0).name),
        0 => Err(Error::Configuration(
            "no accounts registered; run `relay account add` first".to_string(),
        )),
        n => Err(Error::Configuration(format!(
            "{n} accounts registered; choose one with --account"
        ))),
    }
}

/// Opens a session on the chosen account and folder.
async fn open(relay: &Relay, location: Location) -> relay_core::Result<Session> {
    let account = pick_account(relay, location.account).await?;
    relay
        .sessions()
        .open(&account, location.folder.as_deref())
        .await
}

/// Logs out, keeping the command's own result.
async fn finish<T>(session: Session, result: relay_core::Result<T>) -> relay_core::Result<T> {
    if let Err(e) = session.close().await {
        warn!(error = %e, "logout failed");
    }
    result
}
