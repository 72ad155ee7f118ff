//! `relay messages ...`

use std::process::ExitCode;

use relay_core::{MailboxRepository, MessageDetail, Relay, Session, group_threads, search};
use serde::Serialize;

use super::{finish, open};
use crate::cli::MessagesCommand;
use crate::output::{emit, emit_all};

/// Result of a move, trash or spam.
#[derive(Debug, Serialize)]
struct Moved {
    uid: u32,
    new_uid: u32,
    folder: String,
}

/// Result of a mark.
#[derive(Debug, Serialize)]
struct Marked {
    uid: u32,
    read: bool,
}

pub async fn run(relay: &Relay, command: MessagesCommand) -> anyhow::Result<ExitCode> {
    let settings = relay.settings();
    match command {
        MessagesCommand::List {
            location,
            count,
            unread,
        } => {
            let session = open(relay, location).await?;
            let result = repository(relay, &session)
                .list(count.unwrap_or(settings.list_count), unread)
                .await;
            emit_all(&finish(session, result).await?)?;
        }
        MessagesCommand::Search {
            query,
            location,
            count,
        } => {
            let session = open(relay, location).await?;
            let result = repository(relay, &session)
                .list(count.unwrap_or(settings.search_window), false)
                .await;
            let window = finish(session, result).await?;
            emit_all(&search(&window, &query))?;
        }
        MessagesCommand::Read {
            uid,
            location,
            quoted,
        } => {
            let session = open(relay, location).await?;
            let result = repository(relay, &session).open(uid).await;
            let detail = finish(session, result).await?;
            emit(&reading(detail, quoted))?;
        }
        MessagesCommand::Trash { uid, location } => {
            let session = open(relay, location).await?;
            let folder = session.account().folders().trash.to_string();
            let result = repository(relay, &session).trash(uid).await;
            let new_uid = finish(session, result).await?;
            emit(&Moved {
                uid,
                new_uid,
                folder,
            })?;
        }
        MessagesCommand::Spam { uid, location } => {
            let session = open(relay, location).await?;
            let folder = session.account().folders().spam.to_string();
            let result = repository(relay, &session).spam(uid).await;
            let new_uid = finish(session, result).await?;
            emit(&Moved {
                uid,
                new_uid,
                folder,
            })?;
        }
        MessagesCommand::Mark {
            uid,
            location,
            read,
            unread: _,
        } => {
            let session = open(relay, location).await?;
            let result = repository(relay, &session).mark(uid, read).await;
            finish(session, result).await?;
            emit(&Marked { uid, read })?;
        }
        MessagesCommand::Move {
            uid,
            target,
            location,
        } => {
            let session = open(relay, location).await?;
            let result = repository(relay, &session).move_to(uid, &target).await;
            let new_uid = finish(session, result).await?;
            emit(&Moved {
                uid,
                new_uid,
                folder: target,
            })?;
        }
        MessagesCommand::Threads { location, count } => {
            let session = open(relay, location).await?;
            let result = repository(relay, &session)
                .list(count.unwrap_or(settings.list_count), false)
                .await;
            let messages = finish(session, result).await?;
            emit_all(&group_threads(messages))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn repository<'s>(relay: &Relay, session: &'s Session) -> MailboxRepository<'s> {
    MailboxRepository::new(session).with_snippet_length(relay.settings().snippet_length)
}

/// Without `quoted`, the body is the reply text alone.
fn reading(mut detail: MessageDetail, quoted: bool) -> MessageDetail {
    if !quoted {
        detail.body.clone_from(&detail.body_without_quotes);
    }
    detail
}

#[cfg(test)]
mod tests {
    use relay_core::MessageSummary;

    use super::*;

    fn detail() -> MessageDetail {
        let summary = MessageSummary {
            uid: 5,
            message_id: None,
            timestamp: None,
            from: Vec::new(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: "Re: lunch".to_string(),
            snippet: String::new(),
            flags: Vec::new(),
            unread: true,
            size: None,
            in_reply_to: None,
            references: Vec::new(),
        };
        MessageDetail {
            summary,
            headers: Vec::new(),
            body: "Sure.\n\n> Lunch?".to_string(),
            html_derived: false,
            body_without_quotes: "Sure.".to_string(),
            attachments: Vec::new(),
            thread_id: "uid:5".to_string(),
        }
    }

    #[test]
    fn quotes_are_dropped_unless_asked_for() {
        assert_eq!(reading(detail(), false).body, "Sure.");
        assert_eq!(reading(detail(), true).body, "Sure.\n\n> Lunch?");
    }
}
