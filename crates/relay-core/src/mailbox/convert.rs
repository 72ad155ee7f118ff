//! Turning fetched data into message views.

use relay_imap::FetchedMessage;
use relay_mime::encoding::decode_header_value;
use relay_mime::text::{parse_date, parse_internal_date, snippet, strip_quotes};
use relay_mime::{Headers, Message, message_ids, parse_address_list, split_header_body};

use super::model::{MessageDetail, MessageSummary};

fn first_id(headers: &Headers, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| message_ids(value).into_iter().next())
}

fn addresses(headers: &Headers, name: &str) -> Vec<relay_mime::Address> {
    headers
        .get_all(name)
        .into_iter()
        .flat_map(parse_address_list)
        .collect()
}

/// Builds a summary from parsed headers plus the fetch metadata.
pub(crate) fn summarize(
    uid: u32,
    headers: &Headers,
    fetched: &FetchedMessage,
    text: &str,
    snippet_length: usize,
) -> MessageSummary {
    let subject = headers
        .get_decoded("Thread-Topic")
        .filter(|topic| !topic.trim().is_empty())
        .or_else(|| headers.get_decoded("Subject"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let timestamp = headers
        .get("Date")
        .and_then(parse_date)
        .or_else(|| fetched.internal_date().and_then(parse_internal_date));
    let flags = fetched.flags();

    MessageSummary {
        uid,
        message_id: first_id(headers, "Message-ID"),
        timestamp,
        from: addresses(headers, "From"),
        to: addresses(headers, "To"),
        cc: addresses(headers, "Cc"),
        bcc: addresses(headers, "Bcc"),
        subject,
        snippet: snippet(text, snippet_length),
        flags: flags
            .map(|f| f.iter().map(ToString::to_string).collect())
            .unwrap_or_default(),
        unread: !flags.is_some_and(relay_imap::Flags::is_seen),
        size: fetched.size(),
        in_reply_to: first_id(headers, "In-Reply-To"),
        references: headers
            .get("References")
            .map(message_ids)
            .unwrap_or_default(),
    }
}

/// Summary from a `HEADER` + partial `TEXT` fetch.
pub(crate) fn summary_from_preview(
    uid: u32,
    fetched: &FetchedMessage,
    snippet_length: usize,
) -> MessageSummary {
    let headers = Headers::parse(fetched.section("HEADER").unwrap_or_default());
    let preview = Message::preview(&headers, fetched.section("TEXT").unwrap_or_default());
    summarize(uid, &headers, fetched, &preview, snippet_length)
}

/// Detail from a full `BODY.PEEK[]` fetch.
pub(crate) fn detail_from_full(
    uid: u32,
    fetched: &FetchedMessage,
    raw: &[u8],
    snippet_length: usize,
) -> MessageDetail {
    let message = Message::parse(raw).unwrap_or_else(|e| {
        tracing::debug!(uid, error = %e, "unparseable MIME structure, showing raw body");
        let (head, body) = split_header_body(raw);
        Message {
            headers: Headers::parse(head),
            text: Some(String::from_utf8_lossy(body).into_owned()),
            ..Message::default()
        }
    });

    let body = message.plain_text().unwrap_or_default();
    let summary = summarize(uid, &message.headers, fetched, &body, snippet_length);
    let thread_id = summary.thread_id();
    MessageDetail {
        headers: message
            .headers
            .iter()
            .map(|(name, value)| (name.to_string(), decode_header_value(value)))
            .collect(),
        body_without_quotes: strip_quotes(&body),
        html_derived: message.is_html_derived(),
        attachments: message.attachments,
        body,
        summary,
        thread_id,
    }
}
