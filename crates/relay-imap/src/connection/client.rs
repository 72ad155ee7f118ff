//! Async client over one connection.
//!
//! Every command goes through [`Client::execute`], which checks the
//! [`SessionState`], writes the command (waiting for `+` before each literal),
//! collects untagged data and turns the tagged completion into a result.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use super::framed::FramedStream;
use crate::command::{Command, FetchAttribute, SearchCriteria, StoreAction, TagGenerator};
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::state::SessionState;
use crate::types::{
    Capability, CopyUid, Flags, Mailbox, MailboxStatus, ResponseCode, Status, Uid, UidSet,
};
use crate::{Error, Result};

/// Untagged data and completion of one command.
#[derive(Debug, Default)]
struct Completion {
    untagged: Vec<UntaggedResponse>,
    code: Option<ResponseCode>,
}

/// One message's data from a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Message sequence number.
    pub seq: u32,
    /// Data items, in server order.
    pub items: Vec<FetchItem>,
}

impl FetchedMessage {
    /// The message UID.
    #[must_use]
    pub fn uid(&self) -> Option<Uid> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Uid(uid) => Some(*uid),
            _ => None,
        })
    }

    /// Current flags, if fetched.
    #[must_use]
    pub fn flags(&self) -> Option<&Flags> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Flags(flags) => Some(flags),
            _ => None,
        })
    }

    /// INTERNALDATE, unparsed.
    #[must_use]
    pub fn internal_date(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            FetchItem::InternalDate(date) => Some(date.as_str()),
            _ => None,
        })
    }

    /// RFC822.SIZE.
    #[must_use]
    pub fn size(&self) -> Option<u32> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Rfc822Size(size) => Some(*size),
            _ => None,
        })
    }

    /// Bytes of the body section named `section` (case-insensitive; `""` is
    /// the whole message). NIL sections yield `None`.
    #[must_use]
    pub fn section(&self, section: &str) -> Option<&[u8]> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Body {
                section: s,
                data: Some(data),
                ..
            } if s.eq_ignore_ascii_case(section) => Some(data.as_slice()),
            _ => None,
        })
    }
}

/// Client for one server connection.
///
/// Commands are strictly sequential; `&mut self` on every command enforces
/// that at compile time. A command whose future is dropped before completion
/// leaves the connection mid-response, so the next call fails with
/// [`Error::InvalidState`] and the client moves to
/// [`SessionState::Disconnected`].
pub struct Client<S> {
    stream: FramedStream<S>,
    tags: TagGenerator,
    capabilities: Vec<Capability>,
    state: SessionState,
    in_flight: bool,
}

impl<S> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting from a freshly connected stream.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, a BYE greeting, or anything that is not a greeting.
    pub async fn connect(stream: S) -> Result<Self> {
        let mut client = Self {
            stream: FramedStream::new(stream),
            tags: TagGenerator::default(),
            capabilities: Vec::new(),
            state: SessionState::Disconnected,
            in_flight: false,
        };

        let raw = client.stream.read_response().await?;
        match ResponseParser::parse(&raw)? {
            Response::Untagged(UntaggedResponse::Status { status, code, text }) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    client.capabilities = caps;
                }
                client.state = match status {
                    Status::Ok => SessionState::Connected,
                    Status::PreAuth => SessionState::Authenticated,
                    Status::Bye => return Err(Error::Bye(text)),
                    Status::No | Status::Bad => {
                        return Err(Error::Protocol(format!("greeting rejected: {text}")));
                    }
                };
                debug!(state = client.state.name(), "greeting received");
                Ok(client)
            }
            other => Err(Error::Protocol(format!("expected greeting, got {other:?}"))),
        }
    }

    /// Current connection state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Capabilities as last reported by the server.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns true if the server advertised `cap`.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Refreshes the capability list.
    ///
    /// # Errors
    ///
    /// Fails if the command fails or the state does not allow it.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        let completion = self.execute(Command::Capability).await?;
        for response in completion.untagged {
            if let UntaggedResponse::Capability(caps) = response {
                self.capabilities = caps;
            }
        }
        Ok(self.capabilities.clone())
    }

    /// NOOP; keeps the connection alive and polls for updates.
    ///
    /// # Errors
    ///
    /// Fails if the command fails or the state does not allow it.
    pub async fn noop(&mut self) -> Result<()> {
        self.execute(Command::Noop).await.map(drop)
    }

    /// Logs in with a username and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the server rejects the credentials.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if self.has_capability(&Capability::LoginDisabled) {
            return Err(Error::Auth("server has disabled LOGIN".to_string()));
        }

        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let completion = match self.execute(command).await {
            Ok(completion) => completion,
            Err(Error::No { text, .. }) => return Err(Error::Auth(text)),
            Err(err) => return Err(err),
        };
        self.state = SessionState::Authenticated;

        // Capabilities often change after login.
        if let Some(ResponseCode::Capability(caps)) = completion.code {
            self.capabilities = caps;
        } else {
            self.capability().await?;
        }
        debug!("logged in");
        Ok(())
    }

    /// Selects a mailbox read-write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] if the mailbox does not exist or cannot be
    /// selected; the previous selection is lost either way.
    pub async fn select(&mut self, mailbox: &Mailbox) -> Result<MailboxStatus> {
        self.open_mailbox(Command::Select(mailbox.clone()), mailbox, false)
            .await
    }

    /// Selects a mailbox read-only.
    ///
    /// # Errors
    ///
    /// Same as [`Client::select`].
    pub async fn examine(&mut self, mailbox: &Mailbox) -> Result<MailboxStatus> {
        self.open_mailbox(Command::Examine(mailbox.clone()), mailbox, true)
            .await
    }

    async fn open_mailbox(
        &mut self,
        command: Command,
        mailbox: &Mailbox,
        examine: bool,
    ) -> Result<MailboxStatus> {
        let completion = match self.execute(command).await {
            Ok(completion) => completion,
            Err(err) => {
                if matches!(err, Error::No { .. } | Error::Bad(_)) {
                    self.state = SessionState::Authenticated;
                }
                return Err(err);
            }
        };

        let mut status = MailboxStatus {
            read_only: examine || matches!(completion.code, Some(ResponseCode::ReadOnly)),
            ..MailboxStatus::default()
        };
        for response in completion.untagged {
            match response {
                UntaggedResponse::Exists(n) => status.exists = n,
                UntaggedResponse::Flags(flags) => status.flags = flags,
                UntaggedResponse::Status {
                    code: Some(code), ..
                } => match code {
                    ResponseCode::UidNext(uid) => status.uid_next = Some(uid),
                    ResponseCode::UidValidity(v) => status.uid_validity = Some(v),
                    ResponseCode::Unseen(n) => status.unseen = Some(n),
                    _ => {}
                },
                _ => {}
            }
        }

        self.state = SessionState::FolderSelected {
            mailbox: mailbox.clone(),
            read_only: status.read_only,
        };
        debug!(mailbox = %mailbox, exists = status.exists, read_only = status.read_only, "mailbox selected");
        Ok(status)
    }

    /// Searches the selected mailbox, returning UIDs in server order.
    ///
    /// # Errors
    ///
    /// Fails if no mailbox is selected or the command fails.
    pub async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<Vec<Uid>> {
        let completion = self.execute(Command::UidSearch(criteria)).await?;
        Ok(completion
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Search(uids) => Some(uids),
                _ => None,
            })
            .flatten()
            .collect())
    }

    /// Fetches data items for `uids`.
    ///
    /// Only FETCH responses carrying a UID are returned; unsolicited flag
    /// updates for other messages are dropped.
    ///
    /// # Errors
    ///
    /// Fails if no mailbox is selected or the command fails.
    pub async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        attributes: Vec<FetchAttribute>,
    ) -> Result<Vec<FetchedMessage>> {
        let command = Command::UidFetch {
            uids: uids.clone(),
            attributes,
        };
        let completion = self.execute(command).await?;
        Ok(collect_fetches(completion.untagged))
    }

    /// Changes flags on `uids`, returning the echoed flag state.
    ///
    /// # Errors
    ///
    /// Fails if the mailbox is read-only or the command fails.
    pub async fn uid_store(
        &mut self,
        uids: &UidSet,
        action: StoreAction,
    ) -> Result<Vec<FetchedMessage>> {
        let command = Command::UidStore {
            uids: uids.clone(),
            action,
            silent: false,
        };
        let completion = self.execute(command).await?;
        Ok(collect_fetches(completion.untagged))
    }

    /// Changes flags on `uids` without asking for the new flag state.
    ///
    /// # Errors
    ///
    /// Fails if the mailbox is read-only or the command fails.
    pub async fn uid_store_silent(&mut self, uids: &UidSet, action: StoreAction) -> Result<()> {
        let command = Command::UidStore {
            uids: uids.clone(),
            action,
            silent: true,
        };
        self.execute(command).await.map(drop)
    }

    /// Copies `uids` to `mailbox`, returning COPYUID data when the server
    /// supplies it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] with [`ResponseCode::TryCreate`] when the target
    /// does not exist.
    pub async fn uid_copy(&mut self, uids: &UidSet, mailbox: &Mailbox) -> Result<Option<CopyUid>> {
        let command = Command::UidCopy {
            uids: uids.clone(),
            mailbox: mailbox.clone(),
        };
        let completion = self.execute(command).await?;
        Ok(find_copy_uid(completion))
    }

    /// Moves `uids` to `mailbox` (RFC 6851), returning COPYUID data when the
    /// server supplies it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] with [`ResponseCode::TryCreate`] when the target
    /// does not exist.
    pub async fn uid_move(&mut self, uids: &UidSet, mailbox: &Mailbox) -> Result<Option<CopyUid>> {
        let command = Command::UidMove {
            uids: uids.clone(),
            mailbox: mailbox.clone(),
        };
        let completion = self.execute(command).await?;
        Ok(find_copy_uid(completion))
    }

    /// Expunges only the given `\Deleted` messages (RFC 4315).
    ///
    /// # Errors
    ///
    /// Fails if the mailbox is read-only or the command fails.
    pub async fn uid_expunge(&mut self, uids: &UidSet) -> Result<()> {
        self.execute(Command::UidExpunge(uids.clone())).await.map(drop)
    }

    /// Expunges every `\Deleted` message in the selected mailbox.
    ///
    /// # Errors
    ///
    /// Fails if the mailbox is read-only or the command fails.
    pub async fn expunge(&mut self) -> Result<()> {
        self.execute(Command::Expunge).await.map(drop)
    }

    /// Logs out and shuts the transport down.
    ///
    /// A connection dropped right after the server's BYE still counts as a
    /// clean logout.
    ///
    /// # Errors
    ///
    /// Fails if the state does not allow LOGOUT or the server rejects it.
    pub async fn logout(&mut self) -> Result<()> {
        let result = match self.execute(Command::Logout).await {
            Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(()),
            other => other.map(drop),
        };
        self.state = SessionState::Closed;
        if let Err(err) = self.stream.shutdown().await {
            trace!(%err, "shutdown after logout failed");
        }
        result
    }

    /// Sends one command and waits for its completion.
    async fn execute(&mut self, command: Command) -> Result<Completion> {
        if self.in_flight {
            self.state = SessionState::Disconnected;
            return Err(Error::InvalidState(
                "previous command was abandoned mid-response".to_string(),
            ));
        }
        self.state.check(&command)?;

        self.in_flight = true;
        let result = self.round_trip(&command).await;
        self.in_flight = false;

        if let Err(err) = &result
            && err.is_fatal()
        {
            warn!(command = command.name(), %err, "connection lost");
            self.state = SessionState::Disconnected;
        }
        result
    }

    async fn round_trip(&mut self, command: &Command) -> Result<Completion> {
        let tag = self.tags.next_tag();
        debug!(tag = %tag, command = command.name(), "sending command");

        let encoded = command.encode(&tag);
        let chunks = encoded.chunks();
        let mut completion = Completion::default();

        for (i, chunk) in chunks.iter().enumerate() {
            self.stream.write_all(chunk).await?;
            if i + 1 < chunks.len() {
                self.await_continuation(&tag, &mut completion).await?;
            }
        }

        let is_logout = matches!(command, Command::Logout);
        loop {
            let raw = self.stream.read_response().await?;
            if let Some(result) = tagged_result(&raw, &tag)? {
                return result.map(|code| Completion { code, ..completion });
            }
            match ResponseParser::parse(&raw) {
                Ok(Response::Untagged(UntaggedResponse::Status {
                    status: Status::Bye,
                    text,
                    ..
                })) if !is_logout => return Err(Error::Bye(text)),
                Ok(Response::Untagged(response)) => completion.untagged.push(response),
                Ok(other) => debug!(?other, "ignoring unexpected response"),
                Err(err) => debug!(%err, "skipping unparseable untagged response"),
            }
        }
    }

    async fn await_continuation(&mut self, tag: &str, completion: &mut Completion) -> Result<()> {
        loop {
            let raw = self.stream.read_response().await?;
            if let Some(result) = tagged_result(&raw, tag)? {
                // Completed without asking for the literal: that is a refusal.
                result?;
                return Err(Error::Protocol(
                    "command completed before its literal was sent".to_string(),
                ));
            }
            match ResponseParser::parse(&raw)? {
                Response::Continuation { .. } => return Ok(()),
                Response::Untagged(response) => completion.untagged.push(response),
                Response::Tagged { .. } => {}
            }
        }
    }
}

/// Outcome of a tagged completion: the response code on OK, the error otherwise.
type TaggedOutcome = Result<Option<ResponseCode>>;

/// Returns the completion for `tag` if `raw` is its tagged response.
fn tagged_result(raw: &[u8], tag: &str) -> Result<Option<TaggedOutcome>> {
    let is_ours = raw.starts_with(tag.as_bytes()) && raw.get(tag.len()) == Some(&b' ');
    if !is_ours {
        return Ok(None);
    }
    let Response::Tagged {
        status, code, text, ..
    } = ResponseParser::parse(raw)?
    else {
        return Err(Error::Protocol("malformed tagged response".to_string()));
    };
    let result = match status {
        Status::Ok => Ok(code),
        Status::No => Err(Error::No { code, text }),
        Status::Bad => Err(Error::Bad(text)),
        Status::PreAuth | Status::Bye => Err(Error::Protocol(format!(
            "invalid completion status {status:?}: {text}"
        ))),
    };
    Ok(Some(result))
}

fn collect_fetches(untagged: Vec<UntaggedResponse>) -> Vec<FetchedMessage> {
    untagged
        .into_iter()
        .filter_map(|response| match response {
            UntaggedResponse::Fetch { seq, items } => Some(FetchedMessage { seq, items }),
            _ => None,
        })
        .filter(|message| message.uid().is_some())
        .collect()
}

fn find_copy_uid(completion: Completion) -> Option<CopyUid> {
    let untagged_codes = completion
        .untagged
        .into_iter()
        .filter_map(|response| match response {
            UntaggedResponse::Status { code, .. } => code,
            _ => None,
        });
    completion
        .code
        .into_iter()
        .chain(untagged_codes)
        .find_map(|code| match code {
            ResponseCode::CopyUid(copy) => Some(copy),
            _ => None,
        })
}
