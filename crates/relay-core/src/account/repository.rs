//! The `accounts` table.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::model::Account;
use crate::error::{Error, Result};
use crate::provider::{IMAP_TLS_PORT, ProviderKind};

/// Durable account records, one row per name.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates the repository on `pool`, creating the table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                provider TEXT NOT NULL,
                imap_host TEXT NOT NULL,
                imap_port INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All accounts, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r"
            SELECT name, email, provider, imap_host, imap_port
            FROM accounts
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_account).collect())
    }

    /// Looks up an account by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, name: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r"
            SELECT name, email, provider, imap_host, imap_port
            FROM accounts
            WHERE name = ?
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_account))
    }

    /// Inserts a new account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAccount`] if the name is taken.
    pub async fn insert(&self, account: &Account) -> Result<()> {
        let result = sqlx::query(
            r"
            INSERT INTO accounts (name, email, provider, imap_host, imap_port)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.provider.as_str())
        .bind(&account.imap_host)
        .bind(i64::from(account.imap_port))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(account = %account.name, "inserted account");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::DuplicateAccount(account.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes an account; returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Account {
    let provider: String = row.get("provider");
    let port: i64 = row.get("imap_port");
    Account {
        name: row.get("name"),
        email: row.get("email"),
        provider: provider.parse().unwrap_or(ProviderKind::Custom),
        imap_host: row.get("imap_host"),
        imap_port: u16::try_from(port).unwrap_or(IMAP_TLS_PORT),
    }
}
