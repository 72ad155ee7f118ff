//! JSON-lines output.

use std::io::Write;

use serde::Serialize;
use serde_json::{Value, json};

/// Writes one record as a JSON line on stdout.
pub fn emit<T: Serialize>(record: &T) -> anyhow::Result<()> {
    let line = serde_json::to_string(record)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    Ok(())
}

/// Writes every record, one line each.
pub fn emit_all<T: Serialize>(records: &[T]) -> anyhow::Result<()> {
    records.iter().try_for_each(emit)
}

/// The `{"error": kind, "message": text}` record for a failed command.
pub fn error_record(err: &anyhow::Error) -> Value {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<relay_core::Error>())
        .map_or("internal", |e| e.kind().as_str());
    json!({ "error": kind, "message": format!("{err:#}") })
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn core_errors_keep_their_kind() {
        let err = anyhow::Error::from(relay_core::Error::AccountNotFound("work".into()));
        let record = error_record(&err);
        assert_eq!(record["error"], "not_found");
        assert_eq!(record["message"], "Account not found: work");
    }

    #[test]
    fn context_does_not_hide_the_kind() {
        let err = Err::<(), _>(relay_core::Error::Authentication("bad password".into()))
            .context("opening work")
            .unwrap_err();
        let record = error_record(&err);
        assert_eq!(record["error"], "authentication");
        assert_eq!(
            record["message"],
            "opening work: Authentication failed: bad password"
        );
    }

    #[test]
    fn other_errors_are_internal() {
        let record = error_record(&anyhow::anyhow!("stdout closed"));
        assert_eq!(record["error"], "internal");
    }
}
