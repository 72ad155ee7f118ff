//! Integration tests for the IMAP client.
//!
//! A scripted stream replays canned server output and records everything the
//! client sends, so whole sessions run through the public API without a server.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use relay_imap::{
    Capability, Client, Error, FetchAttribute, Flag, Mailbox, SearchCriteria, SessionState,
    StoreAction, Uid, UidSet,
};

/// Replays `responses` and captures writes into a shared buffer.
struct ScriptedStream {
    responses: Cursor<Vec<u8>>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedStream {
    fn new(responses: &str) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            responses: Cursor::new(responses.as_bytes().to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.responses.position()).unwrap();
        let data = self.responses.get_ref();
        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }
        let n = (data.len() - pos).min(buf.remaining());
        buf.put_slice(&data[pos..pos + n]);
        self.responses.set_position((pos + n) as u64);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn sent_lines(sent: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
    String::from_utf8(sent.lock().unwrap().clone())
        .unwrap()
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn uid(n: u32) -> Uid {
    Uid::new(n).unwrap()
}

#[tokio::test]
async fn read_and_mark_session() {
    let script = concat!(
        "* OK [CAPABILITY IMAP4rev1 UIDPLUS] Dovecot ready.\r\n",
        "A0001 OK [CAPABILITY IMAP4rev1 UIDPLUS MOVE] Logged in\r\n",
        "* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n",
        "* OK [PERMANENTFLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft \\*)] Flags permitted.\r\n",
        "* 5 EXISTS\r\n",
        "* 0 RECENT\r\n",
        "* OK [UIDVALIDITY 1700000000] UIDs valid\r\n",
        "* OK [UIDNEXT 106] Predicted next UID\r\n",
        "A0002 OK [READ-WRITE] Select completed.\r\n",
        "* SEARCH 104 105\r\n",
        "A0003 OK Search completed.\r\n",
        "* 5 FETCH (UID 105 FLAGS (\\Seen))\r\n",
        "A0004 OK Store completed.\r\n",
        "* BYE Logging out\r\n",
        "A0005 OK Logout completed.\r\n",
    );
    let (stream, sent) = ScriptedStream::new(script);

    let mut client = Client::connect(stream).await.unwrap();
    client.login("alice@example.com", "app password").await.unwrap();
    assert!(client.has_capability(&Capability::Move));

    let status = client.select(&Mailbox::new("INBOX")).await.unwrap();
    assert_eq!(status.exists, 5);
    assert_eq!(status.uid_validity.map(|v| v.get()), Some(1_700_000_000));
    assert!(status.flags.contains(&Flag::Draft));

    let unread = client.uid_search(SearchCriteria::Unseen).await.unwrap();
    assert_eq!(unread, vec![uid(104), uid(105)]);

    let echoed = client
        .uid_store(&UidSet::single(uid(105)), StoreAction::Add(vec![Flag::Seen]))
        .await
        .unwrap();
    assert_eq!(echoed.len(), 1);
    assert!(echoed[0].flags().unwrap().is_seen());

    client.logout().await.unwrap();
    assert_eq!(client.state(), &SessionState::Closed);

    assert_eq!(
        sent_lines(&sent),
        vec![
            "A0001 LOGIN alice@example.com \"app password\"",
            "A0002 SELECT INBOX",
            "A0003 UID SEARCH UNSEEN",
            "A0004 UID STORE 105 +FLAGS (\\Seen)",
            "A0005 LOGOUT",
        ]
    );
}

#[tokio::test]
async fn list_window_fetch() {
    let script = concat!(
        "* PREAUTH ready\r\n",
        "A0001 OK [READ-ONLY] Examined\r\n",
        "* 1 FETCH (UID 7 FLAGS () INTERNALDATE \" 2-Mar-2024 09:15:00 +0000\" ",
        "RFC822.SIZE 321 BODY[HEADER] {18}\r\nSubject: Lunch\r\n\r\n",
        " BODY[TEXT]<0> {9}\r\nSee you a)\r\n",
        "A0002 OK Fetch completed.\r\n",
    );
    let (stream, sent) = ScriptedStream::new(script);

    let mut client = Client::connect(stream).await.unwrap();
    client.examine(&Mailbox::new("Archive")).await.unwrap();

    let fetched = client
        .uid_fetch(
            &UidSet::from_uids(&[uid(7)]).unwrap(),
            vec![
                FetchAttribute::Uid,
                FetchAttribute::Flags,
                FetchAttribute::InternalDate,
                FetchAttribute::Rfc822Size,
                FetchAttribute::header(),
                FetchAttribute::text_preview(9),
            ],
        )
        .await
        .unwrap();

    let message = &fetched[0];
    assert_eq!(message.uid(), Some(uid(7)));
    assert!(message.flags().unwrap().is_empty());
    assert_eq!(message.internal_date(), Some(" 2-Mar-2024 09:15:00 +0000"));
    assert_eq!(message.size(), Some(321));
    assert!(message.section("header").unwrap().starts_with(b"Subject: Lunch"));
    assert_eq!(message.section("TEXT"), Some(&b"See you a"[..]));

    assert_eq!(
        sent_lines(&sent)[1],
        "A0002 UID FETCH 7 (UID FLAGS INTERNALDATE RFC822.SIZE BODY.PEEK[HEADER] BODY.PEEK[TEXT]<0.9>)"
    );
}

#[tokio::test]
async fn copy_to_missing_folder_reports_trycreate() {
    let script = concat!(
        "* PREAUTH ready\r\n",
        "A0001 OK [READ-WRITE] ok\r\n",
        "A0002 NO [TRYCREATE] Mailbox doesn't exist: Junk\r\n",
    );
    let (stream, _sent) = ScriptedStream::new(script);

    let mut client = Client::connect(stream).await.unwrap();
    client.select(&Mailbox::new("INBOX")).await.unwrap();
    let err = client
        .uid_copy(&UidSet::single(uid(3)), &Mailbox::new("Junk"))
        .await
        .unwrap_err();

    assert!(err.response_code().is_some_and(|code| code.is_missing_mailbox()));
    assert!(!err.is_fatal());
    // A rejected command leaves the folder selected.
    assert!(client.state().selected().is_some());
}

#[tokio::test]
async fn unsolicited_bye_disconnects() {
    let script = concat!(
        "* PREAUTH ready\r\n",
        "* BYE Autologout; idle for too long\r\n",
    );
    let (stream, _sent) = ScriptedStream::new(script);

    let mut client = Client::connect(stream).await.unwrap();
    let err = client.noop().await.unwrap_err();
    assert!(matches!(err, Error::Bye(_)));
    assert_eq!(client.state(), &SessionState::Disconnected);

    let err = client.noop().await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}
