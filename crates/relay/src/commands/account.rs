//! `relay account ...`

use std::io::BufRead;
use std::process::ExitCode;

use relay_core::{AccountSpec, Error, Relay, Secret};
use serde_json::json;
use tracing::info;

use crate::cli::AccountCommand;
use crate::output::emit;

const PASSWORD_VAR: &str = "RELAY_PASSWORD";

pub async fn run(relay: &Relay, command: AccountCommand) -> anyhow::Result<ExitCode> {
    match command {
        AccountCommand::Add {
            name,
            email,
            provider,
            host,
            port,
            no_verify,
        } => {
            let spec = AccountSpec {
                provider,
                host,
                port,
                ..AccountSpec::new(name, email)
            };
            add(relay, spec, !no_verify).await
        }
        AccountCommand::List => {
            for account in relay.accounts().list().await? {
                emit(&account)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        AccountCommand::Remove { name, force, yes } => {
            relay.accounts().remove(&name, force, yes).await?;
            emit(&json!({ "removed": name }))?;
            Ok(ExitCode::SUCCESS)
        }
        AccountCommand::Test { name } => test(relay, name).await,
    }
}

async fn add(relay: &Relay, spec: AccountSpec, verify: bool) -> anyhow::Result<ExitCode> {
    let password = read_password(
        std::env::var(PASSWORD_VAR).ok(),
        &mut std::io::stdin().lock(),
    )?;
    if verify {
        let candidate = spec.clone().resolve()?;
        let health = relay.sessions().probe(&candidate, &password).await;
        if !health.ok {
            emit(&health)?;
            return Ok(ExitCode::FAILURE);
        }
    }

    let account = relay.accounts().add(spec, password.expose()).await?;
    info!(account = %account.name, "account added");
    emit(&account)?;
    Ok(ExitCode::SUCCESS)
}

async fn test(relay: &Relay, name: Option<String>) -> anyhow::Result<ExitCode> {
    let names = match name {
        Some(name) => vec![name],
        None => relay
            .accounts()
            .list()
            .await?
            .into_iter()
            .map(|account| account.name)
            .collect(),
    };

    let mut healthy = true;
    for name in names {
        let health = relay.sessions().test(&name).await?;
        healthy &= health.ok;
        emit(&health)?;
    }
    Ok(if healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// The password from the environment, else the first line of `input`.
fn read_password(
    from_env: Option<String>,
    input: &mut impl BufRead,
) -> relay_core::Result<Secret> {
    if let Some(password) = from_env.filter(|p| !p.is_empty()) {
        return Ok(Secret::new(password));
    }
    let mut line = String::new();
    input.read_line(&mut line)?;
    let line = Secret::new(line);
    first_line(line.expose()).ok_or_else(|| {
        Error::Configuration(format!(
            "no password given; set {PASSWORD_VAR} or pipe it on stdin"
        ))
    })
}

fn first_line(input: &str) -> Option<Secret> {
    let line = input.lines().next()?.trim_end_matches('\r');
    (!line.is_empty()).then(|| Secret::new(line.to_string()))
}
