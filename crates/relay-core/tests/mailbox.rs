//! Mailbox repository against the fake server.

#![allow(clippy::unwrap_used)]

mod common;

use common::FakeServer;
use relay_core::{Error, FlagOp, MailboxRepository, group_threads, search};
use relay_imap::Flag;

fn mail(day: u32, id: &str, subject: &str, extra: &str, body: &str) -> String {
    format!(
        "From: Alice <alice@corp.example>\n\
         To: me@corp.example\n\
         Subject: {subject}\n\
         Date: {day:02} Jul 2024 10:00:00 +0000\n\
         Message-ID: {id}\n\
         {extra}\n{body}\n"
    )
}

const SLIDES: &str = "From: Carol <carol@corp.example>
To: me@corp.example
Subject: Slides
Date: Thu, 04 Jul 2024 10:00:00 +0000
Message-ID: <m4@corp.example>
MIME-Version: 1.0
Content-Type: multipart/mixed; boundary=\"XYZ\"

--XYZ
Content-Type: text/html; charset=utf-8

<p>See the <b>slides</b> attached.</p>
--XYZ
Content-Type: application/pdf; name=\"deck.pdf\"
Content-Disposition: attachment; filename=\"deck.pdf\"
Content-Transfer-Encoding: base64

SGVsbG8=
--XYZ--
";

/// Five messages in INBOX; 2 and 5 unread.
fn populated(capabilities: &[&'static str]) -> FakeServer {
    let server = FakeServer::new(capabilities);
    server.add(
        "INBOX",
        &mail(1, "<m1@corp.example>", "Meeting Notes", "", "Agenda attached."),
        true,
    );
    server.add(
        "INBOX",
        &mail(2, "<m2@corp.example>", "Lunch?", "", "Noon at the usual place?"),
        false,
    );
    server.add(
        "INBOX",
        &mail(
            3,
            "<m3@corp.example>",
            "Re: Meeting Notes",
            "In-Reply-To: <m1@corp.example>\nReferences: <m1@corp.example>\n",
            "Thanks for the notes.",
        ),
        true,
    );
    server.add("INBOX", SLIDES, true);
    server.add(
        "INBOX",
        &mail(
            5,
            "<m5@corp.example>",
            "Quarterly report",
            "",
            "Sounds good, see you then.\n\nOn Tue, 4 Jul 2024, Bob <bob@corp.example> wrote:\n> Shall we meet at noon?",
        ),
        false,
    );
    server
}

#[tokio::test]
async fn unread_list_is_filtered_before_the_limit() {
    let server = populated(&["MOVE", "UIDPLUS"]);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();

    let unread = MailboxRepository::new(&session).list(2, true).await.unwrap();
    let uids: Vec<u32> = unread.iter().map(|m| m.uid).collect();
    assert_eq!(uids, vec![5, 2]);
    assert!(unread.iter().all(|m| m.unread));
    session.close().await.unwrap();
}

#[tokio::test]
async fn list_fetches_headers_and_snippets_only() {
    let server = populated(&["MOVE", "UIDPLUS"]);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();

    let messages = MailboxRepository::new(&session)
        .with_snippet_length(10)
        .list(3, false)
        .await
        .unwrap();
    let uids: Vec<u32> = messages.iter().map(|m| m.uid).collect();
    assert_eq!(uids, vec![5, 4, 3]);

    let reply = &messages[2];
    assert_eq!(reply.subject, "Re: Meeting Notes");
    assert_eq!(reply.from[0].email, "alice@corp.example");
    assert_eq!(reply.from[0].name.as_deref(), Some("Alice"));
    assert_eq!(reply.references, vec!["<m1@corp.example>"]);
    assert_eq!(reply.snippet, "Thanks for...");
    assert!(!reply.unread);
    assert!(reply.timestamp.is_some());

    assert!(
        server
            .commands()
            .iter()
            .all(|c| !c.to_ascii_uppercase().contains("BODY.PEEK[]"))
    );
    session.close().await.unwrap();
}

#[tokio::test]
async fn open_converts_html_and_lists_attachments() {
    let server = populated(&["MOVE", "UIDPLUS"]);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();
    let mailbox = MailboxRepository::new(&session);

    let slides = mailbox.open(4).await.unwrap();
    assert!(slides.html_derived);
    assert!(slides.body.contains("slides"));
    assert_eq!(slides.attachments.len(), 1);
    assert_eq!(slides.attachments[0].filename.as_deref(), Some("deck.pdf"));
    assert_eq!(slides.attachments[0].size, 5);
    assert_eq!(slides.thread_id, "<m4@corp.example>");

    let report = mailbox.open(5).await.unwrap();
    assert!(report.body.contains("> Shall we meet"));
    assert_eq!(report.body_without_quotes, "Sounds good, see you then.");
    assert!(report.summary.unread);
    assert_eq!(server.flags("INBOX", 5).unwrap(), Vec::<String>::new());

    session.close().await.unwrap();
}

#[tokio::test]
async fn open_unknown_uid() {
    let server = populated(&["MOVE", "UIDPLUS"]);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();

    let err = MailboxRepository::new(&session).open(99).await.unwrap_err();
    assert!(matches!(err, Error::MessageNotFound { uid: 99, .. }));
    session.close().await.unwrap();
}

#[tokio::test]
async fn flag_changes_are_idempotent() {
    let server = populated(&["MOVE", "UIDPLUS"]);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();
    let mailbox = MailboxRepository::new(&session);

    mailbox.mark(2, true).await.unwrap();
    mailbox.mark(2, true).await.unwrap();
    assert_eq!(server.flags("INBOX", 2).unwrap(), vec!["\\Seen"]);

    mailbox
        .set_flags(2, &[Flag::Flagged], FlagOp::Add)
        .await
        .unwrap();
    mailbox.mark(2, false).await.unwrap();
    mailbox.mark(2, false).await.unwrap();
    assert_eq!(server.flags("INBOX", 2).unwrap(), vec!["\\Flagged"]);

    let err = mailbox.mark(42, true).await.unwrap_err();
    assert!(matches!(err, Error::MessageNotFound { uid: 42, .. }));
    session.close().await.unwrap();
}

#[tokio::test]
async fn trash_with_move_returns_the_new_uid() {
    let server = populated(&["MOVE", "UIDPLUS"]);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();
    let mailbox = MailboxRepository::new(&session);

    let new_uid = mailbox.trash(1).await.unwrap();
    assert_eq!(server.uids("Trash"), vec![new_uid]);
    assert_eq!(server.uids("INBOX"), vec![2, 3, 4, 5]);
    assert!(matches!(
        mailbox.open(1).await.unwrap_err(),
        Error::MessageNotFound { uid: 1, .. }
    ));
    assert!(server.commands().iter().any(|c| c.starts_with("UID MOVE")));
    session.close().await.unwrap();
}

#[tokio::test]
async fn move_without_extensions_falls_back_to_copy() {
    let server = populated(&[]);
    server.add("Junk", &mail(9, "<old@corp.example>", "Old spam", "", "x"), false);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();
    let mailbox = MailboxRepository::new(&session);

    let new_uid = mailbox.spam(2).await.unwrap();
    assert_eq!(new_uid, 2);
    assert_eq!(server.uids("Junk"), vec![1, 2]);
    assert_eq!(server.uids("INBOX"), vec![1, 3, 4, 5]);

    let commands = server.commands();
    assert!(commands.iter().any(|c| c.starts_with("UID COPY")));
    assert!(commands.iter().any(|c| c == "EXPUNGE"));
    assert!(commands.iter().any(|c| c.starts_with("UID SEARCH HEADER")));

    // Back in INBOX afterwards.
    assert_eq!(mailbox.open(3).await.unwrap().summary.subject, "Re: Meeting Notes");
    session.close().await.unwrap();
}

#[tokio::test]
async fn move_to_missing_folder() {
    let server = populated(&["MOVE", "UIDPLUS"]);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();

    let err = MailboxRepository::new(&session)
        .move_to(1, "Archive")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FolderNotFound(name) if name == "Archive"));
    assert_eq!(server.uids("INBOX"), vec![1, 2, 3, 4, 5]);
    session.close().await.unwrap();
}

#[tokio::test]
async fn search_and_threads_over_a_fetched_window() {
    let server = populated(&["MOVE", "UIDPLUS"]);
    let relay = common::relay(&server).await;
    let session = relay.sessions().open("work", None).await.unwrap();

    let window = MailboxRepository::new(&session).list(100, false).await.unwrap();
    let hits: Vec<u32> = search(&window, "meeting")
        .into_iter()
        .map(|m| m.candidate.uid)
        .collect();
    assert_eq!(hits, vec![3, 1]);

    let threads = group_threads(window);
    let meeting = threads
        .iter()
        .find(|t| t.id == "<m1@corp.example>")
        .unwrap();
    let uids: Vec<u32> = meeting.messages.iter().map(|m| m.uid).collect();
    assert_eq!(uids, vec![1, 3]);
    assert_eq!(threads[0].id, "<m5@corp.example>");
    session.close().await.unwrap();
}
