//! Text helpers for display: HTML conversion, quote stripping, snippets
//! and dates.

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Converts an HTML body to readable text (Markdown-flavoured).
///
/// # Errors
///
/// Returns an error if the converter rejects the document; callers
/// usually fall back to [`strip_tags`].
pub fn html_to_text(html: &str) -> Result<String> {
    let text = htmd::convert(html)?;
    Ok(text.trim().to_string())
}

/// Crude tag removal with the common entities decoded.
///
/// `<script>` and `<style>` contents are dropped.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('>') else {
            rest = "";
            break;
        };
        let tag = after[1..close].trim().to_ascii_lowercase();
        rest = &after[close + 1..];
        for skipped in ["script", "style"] {
            if tag == skipped || tag.starts_with(&format!("{skipped} ")) {
                let end = format!("</{skipped}");
                rest = find_ignore_case(rest, &end).map_or("", move |i| {
                    let tail = &rest[i..];
                    tail.find('>').map_or("", |gt| &tail[gt + 1..])
                });
            }
        }
        if matches!(tag.as_str(), "br" | "br/" | "br /" | "/p" | "/div" | "/li" | "/tr") {
            out.push('\n');
        }
    }
    out.push_str(rest);
    decode_entities(&out)
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Removes quoted reply text.
///
/// The quoted block starts at the first line holding an `<local@domain>`
/// address (the `On ... <a@b> wrote:` attribution); the cut backs up over
/// the attribution's preceding lines to the previous blank line. Remaining
/// `>`-prefixed lines are dropped too.
#[must_use]
pub fn strip_quotes(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let cut = lines
        .iter()
        .position(|line| has_bracketed_address(line))
        .map_or(lines.len(), |idx| {
            lines[..idx]
                .iter()
                .rposition(|line| line.trim().is_empty())
                .map_or(idx, |blank| blank + 1)
        });

    let kept: Vec<&str> = lines[..cut]
        .iter()
        .copied()
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect();
    kept.join("\n").trim_end().to_string()
}

fn has_bracketed_address(line: &str) -> bool {
    let mut rest = line;
    while let Some(open) = rest.find('<') {
        let tail = &rest[open + 1..];
        let Some(close) = tail.find('>') else {
            return false;
        };
        let inner = &tail[..close];
        if let Some((local, domain)) = inner.split_once('@') {
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !inner.contains(char::is_whitespace)
            {
                return true;
            }
        }
        rest = &tail[close + 1..];
    }
    false
}

/// Collapses whitespace and truncates to `max_chars` characters, appending
/// `...` when anything was cut.
#[must_use]
pub fn snippet(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(max_chars).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

/// Parses a `Date` header into UTC.
///
/// Trailing comments such as `(PST)` are ignored, as is a missing weekday.
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let mut value = value.trim();
    if let Some(open) = value.rfind('(') {
        if value.ends_with(')') {
            value = value[..open].trim_end();
        }
    }
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_str(value, "%d %b %Y %H:%M:%S %z"))
        .or_else(|_| DateTime::parse_from_str(value, "%a, %d %b %Y %H:%M %z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses an IMAP `INTERNALDATE` (`02-Mar-2024 09:15:00 +0000`) into UTC.
#[must_use]
pub fn parse_internal_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    // Day may be space-padded: " 2-Mar-2024".
    let padded = if value.find('-') == Some(1) {
        format!("0{value}")
    } else {
        value.to_string()
    };
    DateTime::parse_from_str(&padded, "%d-%b-%Y %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
