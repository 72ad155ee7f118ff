//! Conversation grouping.

use std::collections::HashMap;

use serde::Serialize;

use crate::mailbox::MessageSummary;

/// Messages sharing a thread id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thread {
    /// See [`MessageSummary::thread_id`].
    pub id: String,
    /// Subject of the first message.
    pub subject: String,
    /// Messages, oldest first.
    pub messages: Vec<MessageSummary>,
}

impl Thread {
    /// Count of messages without `\Seen`.
    #[must_use]
    pub fn unread(&self) -> usize {
        self.messages.iter().filter(|m| m.unread).count()
    }
}

/// Groups messages into threads. Threads are ordered by their newest
/// message, newest first.
#[must_use]
pub fn group_threads(messages: Vec<MessageSummary>) -> Vec<Thread> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<MessageSummary>> = HashMap::new();
    for message in messages {
        let id = message.thread_id();
        if !groups.contains_key(&id) {
            order.push(id.clone());
        }
        groups.entry(id).or_default().push(message);
    }

    let mut threads: Vec<Thread> = order
        .into_iter()
        .filter_map(|id| {
            let mut messages = groups.remove(&id)?;
            messages.sort_by_key(|m| m.timestamp);
            let subject = messages.first().map(|m| m.subject.clone()).unwrap_or_default();
            Some(Thread {
                id,
                subject,
                messages,
            })
        })
        .collect();
    threads.sort_by(|a, b| {
        let newest = |t: &Thread| t.messages.last().and_then(|m| m.timestamp);
        newest(b).cmp(&newest(a))
    });
    threads
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn message(uid: u32, id: &str, refs: &[&str], secs: i64) -> MessageSummary {
        MessageSummary {
            uid,
            message_id: Some(id.to_string()),
            timestamp: Some(Utc.timestamp_opt(secs, 0).unwrap()),
            from: Vec::new(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: format!("subject {uid}"),
            snippet: String::new(),
            flags: Vec::new(),
            unread: uid % 2 == 0,
            size: None,
            in_reply_to: refs.last().map(ToString::to_string),
            references: refs.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn replies_join_their_root() {
        let threads = group_threads(vec![
            message(3, "<c@x>", &["<a@x>", "<b@x>"], 300),
            message(1, "<a@x>", &[], 100),
            message(4, "<d@x>", &[], 250),
            message(2, "<b@x>", &["<a@x>"], 200),
        ]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, "<a@x>");
        let uids: Vec<u32> = threads[0].messages.iter().map(|m| m.uid).collect();
        assert_eq!(uids, vec![1, 2, 3]);
        assert_eq!(threads[0].subject, "subject 1");
        assert_eq!(threads[0].unread(), 1);
        assert_eq!(threads[1].id, "<d@x>");
    }

    #[test]
    fn messages_without_ids_stay_alone() {
        let mut a = message(1, "", &[], 100);
        a.message_id = None;
        let mut b = message(2, "", &[], 200);
        b.message_id = None;
        let threads = group_threads(vec![a, b]);
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, "uid:2");
    }
}
