//! Message and part headers.

use std::fmt;

use crate::encoding::decode_header_value;

/// Headers in the order they appear in the message.
///
/// Names keep their original spelling; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header block.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a header.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Parses a header block.
    ///
    /// Folded lines are joined with a single space. Parsing stops at the
    /// first empty line; lines without a colon are skipped. Bytes that are
    /// not UTF-8 are replaced.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }
            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = current.as_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = current.take() {
                headers.push(name, value);
            }
            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim().to_string()));
            }
        }
        if let Some((name, value)) = current {
            headers.push(name, value);
        }
        headers
    }

    /// First raw value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every raw value for `name`, in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// First value for `name` with encoded words decoded.
    #[must_use]
    pub fn get_decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(decode_header_value)
    }

    /// Iterates `(name, raw value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

/// Splits raw message bytes at the blank line ending the header block.
///
/// A message with no blank line is all header.
#[must_use]
pub fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut i = 0;
    while i < raw.len() {
        if raw[i..].starts_with(b"\r\n\r\n") {
            return (&raw[..i + 2], &raw[i + 4..]);
        }
        if raw[i..].starts_with(b"\n\n") {
            return (&raw[..=i], &raw[i + 2..]);
        }
        if i == 0 && (raw.starts_with(b"\r\n") || raw.starts_with(b"\n")) {
            let skip = if raw.starts_with(b"\r\n") { 2 } else { 1 };
            return (&raw[..0], &raw[skip..]);
        }
        i += 1;
    }
    (raw, &raw[raw.len()..])
}

/// Extracts the `<id>` tokens of a `Message-ID`, `In-Reply-To` or
/// `References` value, brackets included.
#[must_use]
pub fn message_ids(value: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let id = &rest[start..=start + len];
        if id.len() > 2 {
            ids.push(id.to_string());
        }
        rest = &rest[start + len + 1..];
    }
    if ids.is_empty() && !value.contains('<') {
        let bare = value.trim();
        if !bare.is_empty() && !bare.contains(char::is_whitespace) {
            ids.push(format!("<{bare}>"));
        }
    }
    ids
}
