//! Local search over fetched messages.
//!
//! Never talks to the server: callers fetch a window of recent messages
//! and hand it in.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::mailbox::{MessageDetail, MessageSummary};

/// A field a query can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Subject line.
    Subject,
    /// Sender names and addresses.
    From,
    /// Recipient names and addresses.
    To,
    /// Snippet or full body text.
    Body,
}

/// Something the search engine can look into.
pub trait Searchable: Clone {
    /// Sort key; `None` sorts last.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Text of `field`.
    fn field_text(&self, field: Field) -> String;
}

fn join_addresses(addresses: &[relay_mime::Address]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Searchable for MessageSummary {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn field_text(&self, field: Field) -> String {
        match field {
            Field::Subject => self.subject.clone(),
            Field::From => join_addresses(&self.from),
            Field::To => {
                let mut all = self.to.clone();
                all.extend(self.cc.iter().cloned());
                join_addresses(&all)
            }
            Field::Body => self.snippet.clone(),
        }
    }
}

impl Searchable for MessageDetail {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.summary.timestamp
    }

    fn field_text(&self, field: Field) -> String {
        match field {
            Field::Body => self.body.clone(),
            other => self.summary.field_text(other),
        }
    }
}

/// A matching candidate and the fields that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match<T> {
    /// The candidate.
    pub candidate: T,
    /// Fields containing the query; empty for an empty query.
    pub fields: Vec<Field>,
}

const FIELDS: [Field; 4] = [Field::Subject, Field::From, Field::To, Field::Body];

/// Case-insensitive substring search, newest first.
///
/// A whitespace-only query matches everything. Equal timestamps keep their
/// input order.
#[must_use]
pub fn search<T: Searchable>(candidates: &[T], query: &str) -> Vec<Match<T>> {
    let needle = query.trim().to_lowercase();
    let mut matches: Vec<Match<T>> = candidates
        .iter()
        .filter_map(|candidate| {
            if needle.is_empty() {
                return Some(Match {
                    candidate: candidate.clone(),
                    fields: Vec::new(),
                });
            }
            let fields: Vec<Field> = FIELDS
                .into_iter()
                .filter(|field| candidate.field_text(*field).to_lowercase().contains(&needle))
                .collect();
            (!fields.is_empty()).then(|| Match {
                candidate: candidate.clone(),
                fields,
            })
        })
        .collect();

    // Stable: ties keep fetch order. `None` sorts after every date.
    matches.sort_by(|a, b| b.candidate.timestamp().cmp(&a.candidate.timestamp()));
    matches
}
