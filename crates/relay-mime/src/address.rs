//! `From` / `To` / `Cc` address lists.

use std::fmt;

use crate::encoding::decode_header_value;

/// A mailbox: optional display name plus address.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Display name, RFC 2047 decoded.
    pub name: Option<String>,
    /// The `local@domain` part.
    pub email: String,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// Parses an address-list header value.
///
/// Handles quoted display names containing commas, angle-bracketed
/// addresses, `(comments)`, and groups (`Team: a@x, b@y;`), whose members
/// are flattened into the result. Entries without an `@` are dropped.
#[must_use]
pub fn parse_address_list(value: &str) -> Vec<Address> {
    split_mailboxes(value)
        .iter()
        .filter_map(|entry| parse_mailbox(entry))
        .collect()
}

/// Splits on top-level commas and group delimiters.
fn split_mailboxes(value: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut comment_depth = 0u32;
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes || comment_depth > 0 => {
                current.push(c);
                escaped = true;
            }
            '"' if comment_depth == 0 => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '(' if !in_quotes => {
                comment_depth += 1;
                current.push(c);
            }
            ')' if !in_quotes && comment_depth > 0 => {
                comment_depth -= 1;
                current.push(c);
            }
            '<' if !in_quotes && comment_depth == 0 => {
                in_angle = true;
                current.push(c);
            }
            '>' if !in_quotes && comment_depth == 0 => {
                in_angle = false;
                current.push(c);
            }
            ',' | ';' if !in_quotes && !in_angle && comment_depth == 0 => {
                entries.push(std::mem::take(&mut current));
            }
            // Group display name: everything before it is discarded.
            ':' if !in_quotes && !in_angle && comment_depth == 0 => current.clear(),
            _ => current.push(c),
        }
    }
    entries.push(current);
    entries
}

fn parse_mailbox(entry: &str) -> Option<Address> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    if let (Some(open), Some(close)) = (entry.rfind('<'), entry.rfind('>')) {
        if open < close {
            let email = entry[open + 1..close].trim();
            let name = clean_display_name(&entry[..open]);
            return valid_email(email).then(|| Address {
                name,
                email: email.to_string(),
            });
        }
    }

    // Bare address, possibly followed by a comment holding the name.
    let (email, comment) = match entry.find('(') {
        Some(i) => (entry[..i].trim(), Some(&entry[i..])),
        None => (entry, None),
    };
    let name = comment.and_then(|c| {
        clean_display_name(c.trim_start_matches('(').trim_end_matches(')'))
    });
    valid_email(email).then(|| Address {
        name,
        email: email.to_string(),
    })
}

fn clean_display_name(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut in_quotes = false;
    let mut comment_depth = 0u32;
    let mut chars = raw.trim().chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' if comment_depth == 0 => in_quotes = !in_quotes,
            '(' if !in_quotes => comment_depth += 1,
            ')' if !in_quotes && comment_depth > 0 => comment_depth -= 1,
            _ if comment_depth > 0 => {}
            _ => out.push(c),
        }
    }
    let name = decode_header_value(out.trim());
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn valid_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !email.contains(char::is_whitespace)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_name_forms() {
        let list = parse_address_list(
            "\"Doe, Jane\" <jane@example.com>, Bob <bob@example.org>, carol@example.net",
        );
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].name.as_deref(), Some("Doe, Jane"));
        assert_eq!(list[0].email, "jane@example.com");
        assert_eq!(list[1].to_string(), "Bob <bob@example.org>");
        assert_eq!(list[2], Address::new("carol@example.net"));
    }

    #[test]
    fn encoded_display_name() {
        let list = parse_address_list("=?utf-8?Q?Jos=C3=A9?= <jose@example.com>");
        assert_eq!(list[0].name.as_deref(), Some("José"));
    }

    #[test]
    fn groups_are_flattened() {
        let list = parse_address_list("Team: a@x.io, b@y.io;, c@z.io");
        let emails: Vec<_> = list.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.io", "b@y.io", "c@z.io"]);

        assert!(parse_address_list("undisclosed-recipients:;").is_empty());
    }

    #[test]
    fn comments() {
        let list = parse_address_list("ann@example.com (Ann Lee), Max (work) <max@example.com>");
        assert_eq!(list[0].name.as_deref(), Some("Ann Lee"));
        assert_eq!(list[1].name.as_deref(), Some("Max"));
        assert_eq!(list[1].email, "max@example.com");
    }

    #[test]
    fn junk_is_dropped() {
        assert!(parse_address_list("").is_empty());
        assert!(parse_address_list("not an address, <>").is_empty());
    }

    proptest::proptest! {
        #[test]
        fn never_panics(s in "\\PC{0,80}") {
            let _ = parse_address_list(&s);
        }
    }
}
