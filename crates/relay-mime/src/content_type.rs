//! `Content-Type` and `Content-Disposition` values.

use std::fmt;

use crate::encoding::{decode_charset, decode_header_value};
use crate::error::{Error, Result};

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type, lowercased (`text`, `multipart`, ...).
    pub main_type: String,
    /// Subtype, lowercased (`plain`, `mixed`, ...).
    pub sub_type: String,
    /// Parameters with lowercased names, in order.
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a content type without parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// `text/plain; charset=us-ascii`, the RFC 2045 default.
    #[must_use]
    pub fn default_text() -> Self {
        let mut ct = Self::new("text", "plain");
        ct.parameters
            .push(("charset".to_string(), "us-ascii".to_string()));
        ct
    }

    /// Parses `type/subtype; name=value; ...`.
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let (essence, params) = s.split_once(';').unwrap_or((s, ""));
        let (main, sub) = essence
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(s.trim().to_string()))?;
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() {
            return Err(Error::InvalidContentType(s.trim().to_string()));
        }
        Ok(Self {
            main_type: main.to_ascii_lowercase(),
            sub_type: sub.to_ascii_lowercase(),
            parameters: parse_parameters(params),
        })
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        lookup(&self.parameters, name)
    }

    /// The `charset` parameter.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// The `boundary` parameter.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// The legacy `name` parameter some clients use for attachment names.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameter("name")
    }

    /// Returns true for `multipart/*`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Returns true for `message/rfc822`.
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.main_type == "message" && self.sub_type == "rfc822"
    }

    /// Returns true if the type is `main/sub`.
    #[must_use]
    pub fn is(&self, main: &str, sub: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main) && self.sub_type.eq_ignore_ascii_case(sub)
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::default_text()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (key, value) in &self.parameters {
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }
        Ok(())
    }
}

/// Whether a part is shown inline or offered as a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionKind {
    /// `inline`
    Inline,
    /// `attachment`
    Attachment,
}

/// A parsed `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    /// Disposition kind. Unknown kinds are treated as attachments.
    pub kind: DispositionKind,
    /// Parameters with lowercased names, in order.
    pub parameters: Vec<(String, String)>,
}

impl Disposition {
    /// Parses a `Content-Disposition` value. Never fails.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let (kind, params) = s.split_once(';').unwrap_or((s, ""));
        let kind = if kind.trim().eq_ignore_ascii_case("inline") {
            DispositionKind::Inline
        } else {
            DispositionKind::Attachment
        };
        Self {
            kind,
            parameters: parse_parameters(params),
        }
    }

    /// The `filename` parameter.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        lookup(&self.parameters, "filename")
    }

    /// Returns true for `attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind == DispositionKind::Attachment
    }
}

fn lookup<'a>(parameters: &'a [(String, String)], name: &str) -> Option<&'a str> {
    parameters
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Parses a `; name=value` list.
///
/// Quoted values may contain `;`. RFC 2231 extended values (`name*=`) and
/// continuations (`name*0=`, `name*1*=`) are decoded and merged under the
/// bare name. Plain values also get RFC 2047 decoding, which many clients
/// emit in filenames despite the RFC.
fn parse_parameters(s: &str) -> Vec<(String, String)> {
    let mut plain: Vec<(String, String)> = Vec::new();
    // (name, section, extended, raw value)
    let mut sections: Vec<(String, u32, bool, String)> = Vec::new();

    for raw in split_unquoted(s) {
        let Some((key, value)) = raw.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = unquote(value.trim());
        if key.is_empty() {
            continue;
        }
        match key.split_once('*') {
            None => plain.push((key, decode_header_value(&value))),
            Some((name, suffix)) => {
                let extended = suffix.ends_with('*') || suffix.is_empty();
                let index = suffix.trim_end_matches('*').parse().unwrap_or(0);
                sections.push((name.to_string(), index, extended, value));
            }
        }
    }

    sections.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    let mut merged: Vec<(String, String)> = Vec::new();
    let mut charset: Option<String> = None;
    for (name, index, extended, value) in sections {
        if index == 0 {
            charset = None;
        }
        let text = if extended {
            let encoded = if index == 0 {
                // charset'language'value
                let mut fields = value.splitn(3, '\'');
                match (fields.next(), fields.next(), fields.next()) {
                    (Some(cs), Some(_lang), Some(rest)) => {
                        if !cs.is_empty() {
                            charset = Some(cs.to_string());
                        }
                        rest.to_string()
                    }
                    _ => value.clone(),
                }
            } else {
                value
            };
            decode_charset(&percent_decode(&encoded), charset.as_deref())
        } else {
            value
        };
        match merged.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => existing.push_str(&text),
            None => merged.push((name, text)),
        }
    }

    for (name, value) in merged {
        // An extended value wins over a plain one of the same name.
        plain.retain(|(k, _)| *k != name);
        plain.push((name, value));
    }
    plain
}

fn split_unquoted(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"') else {
        return value.to_string();
    };
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(b) = s.get(i + 1..i + 3).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}
