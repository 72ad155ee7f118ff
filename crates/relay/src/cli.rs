//! Command-line definitions.

use clap::{Args, Parser, Subcommand};
use relay_core::ProviderKind;

/// Read, search and file mail from the terminal. Every record is printed
/// as one JSON line on stdout.
#[derive(Debug, Parser)]
#[command(name = "relay", version, about)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage registered accounts.
    #[command(subcommand)]
    Account(AccountCommand),
    /// Work with messages in a folder.
    #[command(subcommand)]
    Messages(MessagesCommand),
}

/// Account commands.
#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Register an account. The password is read from `RELAY_PASSWORD` or
    /// the first line of stdin.
    Add {
        /// Local name for the account.
        #[arg(long)]
        name: String,
        /// Login address.
        #[arg(long)]
        email: String,
        /// Provider; detected from the server or email domain when omitted.
        #[arg(long, value_parser = parse_provider)]
        provider: Option<ProviderKind>,
        /// IMAP host, required for custom providers.
        #[arg(long)]
        host: Option<String>,
        /// IMAP port.
        #[arg(long)]
        port: Option<u16>,
        /// Store the account without logging in first.
        #[arg(long)]
        no_verify: bool,
    },
    /// List registered accounts.
    List,
    /// Remove an account and its stored password.
    Remove {
        /// Account name.
        name: String,
        /// Remove without confirmation.
        #[arg(long)]
        force: bool,
        /// Confirm the removal.
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Log in and check the inbox is reachable; every account when no name
    /// is given.
    Test {
        /// Account name.
        name: Option<String>,
    },
}

/// Account and folder a message command runs against.
#[derive(Debug, Clone, Args)]
pub struct Location {
    /// Account name; optional when only one account exists.
    #[arg(short, long)]
    pub account: Option<String>,
    /// Folder; the provider's inbox when omitted.
    #[arg(short, long)]
    pub folder: Option<String>,
}

/// Message commands.
#[derive(Debug, Subcommand)]
pub enum MessagesCommand {
    /// Most recent messages, newest first.
    List {
        #[command(flatten)]
        location: Location,
        /// How many messages.
        #[arg(short, long)]
        count: Option<usize>,
        /// Only messages without `\Seen`.
        #[arg(short, long)]
        unread: bool,
    },
    /// Search subject, sender, recipients and snippet of recent messages.
    Search {
        /// Text to look for, case-insensitive.
        query: String,
        #[command(flatten)]
        location: Location,
        /// How many recent messages to search.
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Print one message without marking it read.
    Read {
        /// Message UID.
        uid: u32,
        #[command(flatten)]
        location: Location,
        /// Keep quoted replies in the body.
        #[arg(long)]
        quoted: bool,
    },
    /// Move a message to the trash folder.
    Trash {
        /// Message UID.
        uid: u32,
        #[command(flatten)]
        location: Location,
    },
    /// Move a message to the spam folder.
    Spam {
        /// Message UID.
        uid: u32,
        #[command(flatten)]
        location: Location,
    },
    /// Mark a message read or unread.
    Mark {
        /// Message UID.
        uid: u32,
        #[command(flatten)]
        location: Location,
        /// Set `\Seen`.
        #[arg(long, conflicts_with = "unread", required_unless_present = "unread")]
        read: bool,
        /// Clear `\Seen`.
        #[arg(long)]
        unread: bool,
    },
    /// Move a message to another folder.
    Move {
        /// Message UID.
        uid: u32,
        /// Destination folder.
        target: String,
        #[command(flatten)]
        location: Location,
    },
    /// Recent messages grouped into conversations.
    Threads {
        #[command(flatten)]
        location: Location,
        /// How many recent messages to group.
        #[arg(short, long)]
        count: Option<usize>,
    },
}

fn parse_provider(value: &str) -> Result<ProviderKind, String> {
    value.parse().map_err(|e: relay_core::Error| e.to_string())
}
