//! Mailbox repository: list, open, flag and move messages in a session's
//! folder.
//!
//! Nothing is cached. Every call goes back to the server, which is the only
//! source of truth for flags and folder membership.

mod convert;
mod model;

use std::collections::HashMap;

use relay_imap::{
    Capability, FetchAttribute, FetchItem, FetchedMessage, Flag, Mailbox, SearchCriteria,
    StoreAction, Uid, UidSet,
};
use tracing::{debug, info};

pub use model::{FlagOp, MessageDetail, MessageSummary};

use crate::error::{Error, Result};
use crate::session::{ImapClient, Session};

/// Snippet length when none is configured.
pub const DEFAULT_SNIPPET_LENGTH: usize = 200;

/// Bytes of body text fetched per message for list snippets.
const PREVIEW_BYTES: u32 = 2048;

/// Message operations on one open session.
#[derive(Debug, Clone, Copy)]
pub struct MailboxRepository<'s> {
    session: &'s Session,
    snippet_length: usize,
}

impl<'s> MailboxRepository<'s> {
    /// Wraps an open session.
    #[must_use]
    pub const fn new(session: &'s Session) -> Self {
        Self {
            session,
            snippet_length: DEFAULT_SNIPPET_LENGTH,
        }
    }

    /// Sets the snippet length in characters.
    #[must_use]
    pub const fn with_snippet_length(mut self, snippet_length: usize) -> Self {
        self.snippet_length = snippet_length;
        self
    }

    /// The `limit` most recent messages, newest first.
    ///
    /// With `unread_only`, the server filters on `\Seen` before the list is
    /// cut to `limit`. Only headers and the start of the body are fetched.
    ///
    /// # Errors
    ///
    /// Returns connection or protocol errors.
    pub async fn list(&self, limit: usize, unread_only: bool) -> Result<Vec<MessageSummary>> {
        let mut client = self.session.lock().await;
        let criteria = if unread_only {
            SearchCriteria::Unseen
        } else {
            SearchCriteria::All
        };
        let mut uids = self.session.timed(client.uid_search(criteria)).await?;
        uids.sort_unstable();
        uids.dedup();
        let newest: Vec<Uid> = uids.into_iter().rev().take(limit).collect();
        let Some(set) = UidSet::from_uids(&newest) else {
            return Ok(Vec::new());
        };

        let attributes = vec![
            FetchAttribute::Uid,
            FetchAttribute::Flags,
            FetchAttribute::InternalDate,
            FetchAttribute::Rfc822Size,
            FetchAttribute::header(),
            FetchAttribute::text_preview(PREVIEW_BYTES),
        ];
        let fetched = self.session.timed(client.uid_fetch(&set, attributes)).await?;
        let mut by_uid: HashMap<Uid, FetchedMessage> = fetched
            .into_iter()
            .filter_map(|message| message.uid().map(|uid| (uid, message)))
            .collect();

        let summaries: Vec<MessageSummary> = newest
            .iter()
            .filter_map(|uid| by_uid.remove(uid).map(|message| (*uid, message)))
            .map(|(uid, message)| {
                convert::summary_from_preview(uid.get(), &message, self.snippet_length)
            })
            .collect();
        debug!(folder = %self.session.folder(), count = summaries.len(), "listed messages");
        Ok(summaries)
    }

    /// Fetches one message in full without marking it read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if `uid` is not in the folder.
    pub async fn open(&self, uid: u32) -> Result<MessageDetail> {
        let id = self.uid(uid)?;
        let mut client = self.session.lock().await;
        let attributes = vec![
            FetchAttribute::Uid,
            FetchAttribute::Flags,
            FetchAttribute::InternalDate,
            FetchAttribute::Rfc822Size,
            FetchAttribute::full_message(),
        ];
        let fetched = self
            .session
            .timed(client.uid_fetch(&UidSet::single(id), attributes))
            .await?;
        let message = fetched
            .into_iter()
            .find(|message| message.uid() == Some(id))
            .ok_or_else(|| self.not_found(uid))?;
        let raw = message
            .section("")
            .ok_or_else(|| Error::Protocol(format!("server sent no body for UID {uid}")))?;

        Ok(convert::detail_from_full(
            uid,
            &message,
            raw,
            self.snippet_length,
        ))
    }

    /// Adds or removes flags. Setting a flag that is already set, or
    /// clearing one that is not, changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if `uid` is not in the folder.
    pub async fn set_flags(&self, uid: u32, flags: &[Flag], op: FlagOp) -> Result<()> {
        let id = self.uid(uid)?;
        let set = UidSet::single(id);
        let mut client = self.session.lock().await;
        self.ensure_exists(&mut client, &set, uid).await?;
        if flags.is_empty() {
            return Ok(());
        }

        let action = match op {
            FlagOp::Add => StoreAction::Add(flags.to_vec()),
            FlagOp::Remove => StoreAction::Remove(flags.to_vec()),
        };
        self.session
            .timed(client.uid_store_silent(&set, action))
            .await?;
        debug!(uid, ?op, count = flags.len(), "flags updated");
        Ok(())
    }

    /// Marks a message read or unread.
    ///
    /// # Errors
    ///
    /// Same as [`MailboxRepository::set_flags`].
    pub async fn mark(&self, uid: u32, read: bool) -> Result<()> {
        let op = if read { FlagOp::Add } else { FlagOp::Remove };
        self.set_flags(uid, &[Flag::Seen], op).await
    }

    /// Moves a message to the provider's trash folder.
    ///
    /// # Errors
    ///
    /// Same as [`MailboxRepository::move_to`].
    pub async fn trash(&self, uid: u32) -> Result<u32> {
        let folder = self.session.account().folders().trash;
        self.move_to(uid, folder).await
    }

    /// Moves a message to the provider's spam folder.
    ///
    /// # Errors
    ///
    /// Same as [`MailboxRepository::move_to`].
    pub async fn spam(&self, uid: u32) -> Result<u32> {
        let folder = self.session.account().folders().spam;
        self.move_to(uid, folder).await
    }

    /// Moves a message to `target` and returns its UID there. The old UID is
    /// invalid afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::MessageNotFound`] if `uid` is not in the folder.
    /// - [`Error::FolderNotFound`] if the target does not exist.
    /// - [`Error::Configuration`] if `target` is the current folder.
    /// - [`Error::Protocol`] if the server moved the message but its new UID
    ///   cannot be determined.
    pub async fn move_to(&self, uid: u32, target: &str) -> Result<u32> {
        let source = self.session.folder();
        if source.same_as(target) {
            return Err(Error::Configuration(format!(
                "message {uid} is already in {target}"
            )));
        }
        let id = self.uid(uid)?;
        let set = UidSet::single(id);
        let destination = Mailbox::new(target);
        let mut client = self.session.lock().await;
        let message_id = self.ensure_exists(&mut client, &set, uid).await?;

        let copy_uid = if client.has_capability(&Capability::Move) {
            self.session
                .timed(client.uid_move(&set, &destination))
                .await
                .map_err(|e| target_error(e, target))?
        } else {
            let copy_uid = self
                .session
                .timed(client.uid_copy(&set, &destination))
                .await
                .map_err(|e| target_error(e, target))?;
            self.session
                .timed(client.uid_store_silent(&set, StoreAction::Add(vec![Flag::Deleted])))
                .await?;
            if client.has_capability(&Capability::UidPlus) {
                self.session.timed(client.uid_expunge(&set)).await?;
            } else {
                self.session.timed(client.expunge()).await?;
            }
            copy_uid
        };

        let new_uid = match copy_uid.and_then(|c| c.destination_of(id)) {
            Some(new_uid) => new_uid.get(),
            None => {
                self.locate(&mut client, &destination, message_id.as_deref())
                    .await?
            }
        };
        info!(uid, new_uid, from = %source, to = target, "message moved");
        Ok(new_uid)
    }

    /// Finds a moved message in `destination` by `Message-ID`, then goes
    /// back to the session's folder.
    async fn locate(
        &self,
        client: &mut ImapClient,
        destination: &Mailbox,
        message_id: Option<&str>,
    ) -> Result<u32> {
        let Some(message_id) = message_id else {
            return Err(Error::Protocol(
                "server sent no COPYUID and the message has no Message-ID".to_string(),
            ));
        };

        self.session.timed(client.examine(destination)).await?;
        let found = self
            .session
            .timed(client.uid_search(SearchCriteria::Header(
                "Message-ID".to_string(),
                message_id.to_string(),
            )))
            .await;
        self.session
            .timed(client.select(self.session.folder()))
            .await?;

        found?
            .into_iter()
            .max()
            .map(Uid::get)
            .ok_or_else(|| {
                Error::Protocol(format!("moved message {message_id} not found in {destination}"))
            })
    }

    /// Checks `set` names an existing message and returns its `Message-ID`.
    async fn ensure_exists(
        &self,
        client: &mut ImapClient,
        set: &UidSet,
        uid: u32,
    ) -> Result<Option<String>> {
        let attributes = vec![
            FetchAttribute::Uid,
            FetchAttribute::header_fields(&["MESSAGE-ID"]),
        ];
        let fetched = self.session.timed(client.uid_fetch(set, attributes)).await?;
        let message = fetched
            .into_iter()
            .find(|message| message.uid().is_some_and(|id| id.get() == uid))
            .ok_or_else(|| self.not_found(uid))?;
        Ok(message_id_field(&message))
    }

    fn uid(&self, uid: u32) -> Result<Uid> {
        Uid::new(uid).ok_or_else(|| self.not_found(uid))
    }

    fn not_found(&self, uid: u32) -> Error {
        Error::MessageNotFound {
            folder: self.session.folder().to_string(),
            uid,
        }
    }
}

/// `Message-ID` from a `HEADER.FIELDS` section, whatever case the server
/// echoed the section name in.
fn message_id_field(message: &FetchedMessage) -> Option<String> {
    message.items.iter().find_map(|item| match item {
        FetchItem::Body {
            section,
            data: Some(data),
            ..
        } if section.to_ascii_uppercase().starts_with("HEADER.FIELDS") => {
            let headers = relay_mime::Headers::parse(data);
            headers
                .get("Message-ID")
                .and_then(|value| relay_mime::message_ids(value).into_iter().next())
        }
        _ => None,
    })
}

/// Maps a failed COPY/MOVE: TRYCREATE or NONEXISTENT means the target is
/// missing.
fn target_error(err: relay_imap::Error, target: &str) -> Error {
    if err.response_code().is_some_and(|code| code.is_missing_mailbox()) {
        Error::FolderNotFound(target.to_string())
    } else {
        err.into()
    }
}
