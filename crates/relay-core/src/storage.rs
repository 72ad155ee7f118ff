//! SQLite pool shared by the account registry and the vault.

use std::path::Path;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::Result;

/// Opens (creating if needed) the database at `path`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the database
/// cannot be opened.
pub async fn open(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;
    debug!(path = %path.display(), "opened database");
    Ok(pool)
}

/// A private in-memory database, for tests and dry runs.
///
/// # Errors
///
/// Returns an error if `SQLite` cannot be initialised.
pub async fn in_memory() -> Result<SqlitePool> {
    // One connection: every connection to :memory: is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}
