//! Read-side message parsing.
//!
//! Walks the MIME tree once and keeps what a reader needs: the first plain
//! and HTML bodies, and metadata (never bytes) for everything else.

use crate::content_type::{ContentType, Disposition};
use crate::encoding::{decode_charset, decode_transfer};
use crate::error::{Error, Result};
use crate::header::{Headers, split_header_body};
use crate::text::{html_to_text, strip_tags};

const MAX_DEPTH: usize = 16;

/// Metadata for one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttachmentInfo {
    /// File name from `Content-Disposition` or the `name` parameter.
    pub filename: Option<String>,
    /// `type/subtype`.
    pub content_type: String,
    /// Size in bytes after transfer decoding.
    pub size: usize,
}

/// A parsed message.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Top-level headers.
    pub headers: Headers,
    /// First `text/plain` body, charset-decoded.
    pub text: Option<String>,
    /// First `text/html` body, charset-decoded.
    pub html: Option<String>,
    /// Every non-body part.
    pub attachments: Vec<AttachmentInfo>,
}

impl Message {
    /// Parses a complete RFC 5322 message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBoundary`] if a multipart entity has no
    /// boundary parameter.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (head, body) = split_header_body(raw);
        let headers = Headers::parse(head);
        let mut message = Self {
            headers,
            ..Self::default()
        };
        let headers = message.headers.clone();
        walk(&headers, body, 0, &mut message)?;
        Ok(message)
    }

    /// Builds a preview from headers and a possibly truncated body.
    ///
    /// Used for list views, where only the first bytes of the body were
    /// fetched. Never fails: anything unparseable degrades to the raw text.
    #[must_use]
    pub fn preview(headers: &Headers, partial_body: &[u8]) -> String {
        let mut message = Self::default();
        if walk(headers, partial_body, 0, &mut message).is_err() {
            return String::from_utf8_lossy(partial_body).into_owned();
        }
        message.plain_text().unwrap_or_default()
    }

    /// Decoded `Subject`.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers.get_decoded("Subject")
    }

    /// Plain-text body, converting HTML when there is no plain part.
    #[must_use]
    pub fn plain_text(&self) -> Option<String> {
        if let Some(text) = &self.text {
            return Some(text.clone());
        }
        self.html
            .as_deref()
            .map(|html| html_to_text(html).unwrap_or_else(|_| strip_tags(html)))
    }

    /// Returns true when the plain text had to be derived from HTML.
    #[must_use]
    pub const fn is_html_derived(&self) -> bool {
        self.text.is_none() && self.html.is_some()
    }
}

fn walk(headers: &Headers, body: &[u8], depth: usize, out: &mut Message) -> Result<()> {
    let content_type = headers
        .get("Content-Type")
        .and_then(|v| ContentType::parse(v).ok())
        .unwrap_or_default();
    let disposition = headers.get("Content-Disposition").map(Disposition::parse);

    if content_type.is_multipart() {
        if depth >= MAX_DEPTH {
            return Ok(());
        }
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        for part in split_multipart(body, boundary) {
            let (head, part_body) = split_header_body(part);
            walk(&Headers::parse(head), part_body, depth + 1, out)?;
        }
        return Ok(());
    }

    let filename = disposition
        .as_ref()
        .and_then(Disposition::filename)
        .or_else(|| content_type.name())
        .map(str::to_string);
    let encoding = headers.get("Content-Transfer-Encoding");
    // A damaged part should not sink the whole message.
    let decoded = decode_transfer(body, encoding).unwrap_or_else(|_| body.to_vec());

    let is_body = filename.is_none()
        && !disposition.as_ref().is_some_and(Disposition::is_attachment)
        && content_type.main_type == "text";
    if is_body {
        let slot = match content_type.sub_type.as_str() {
            "plain" => Some(&mut out.text),
            "html" => Some(&mut out.html),
            _ => None,
        };
        if let Some(slot) = slot {
            if slot.is_none() {
                *slot = Some(decode_charset(&decoded, content_type.charset()));
            }
            return Ok(());
        }
    }

    out.attachments.push(AttachmentInfo {
        filename,
        content_type: content_type.essence(),
        size: decoded.len(),
    });
    Ok(())
}

/// Splits a multipart body into its parts.
///
/// A missing close delimiter (truncated body) keeps whatever follows the
/// last delimiter as a final part.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut line_start = 0;

    while line_start < body.len() {
        let line_end = body[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| line_start + i + 1);
        let line = &body[line_start..line_end];

        if let Some(rest) = line.strip_prefix(delimiter) {
            let closing = rest.starts_with(b"--");
            if closing || rest.iter().all(u8::is_ascii_whitespace) {
                if let Some(s) = start {
                    parts.push(trim_final_newline(&body[s..line_start]));
                }
                if closing {
                    return parts;
                }
                start = Some(line_end);
            }
        }
        line_start = line_end;
    }

    if let Some(s) = start {
        if s < body.len() {
            parts.push(&body[s..]);
        }
    }
    parts
}

fn trim_final_newline(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MIXED: &str = concat!(
        "From: Alice <alice@example.com>\r\n",
        "Subject: =?utf-8?Q?Q3_r=C3=A9view?=\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "preamble\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "Caf=C3=A9 at noon?\r\n",
        "--inner\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "\r\n",
        "<p>Caf\u{e9} at noon?</p>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: application/pdf; name=\"agenda.pdf\"\r\n",
        "Content-Disposition: attachment; filename=\"agenda.pdf\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "JVBERi0xLjQK\r\n",
        "--outer--\r\n",
        "epilogue\r\n",
    );

    #[test]
    fn nested_multipart() {
        let message = Message::parse(MIXED.as_bytes()).unwrap();
        assert_eq!(message.subject().unwrap(), "Q3 réview");
        assert_eq!(message.text.as_deref(), Some("Café at noon?"));
        assert!(message.html.as_deref().unwrap().contains("<p>"));
        assert!(!message.is_html_derived());
        assert_eq!(
            message.attachments,
            vec![AttachmentInfo {
                filename: Some("agenda.pdf".to_string()),
                content_type: "application/pdf".to_string(),
                size: 9,
            }]
        );
    }

    #[test]
    fn single_part_defaults_to_plain_text() {
        let message = Message::parse(b"Subject: hi\n\nJust a line.\n").unwrap();
        assert_eq!(message.plain_text().unwrap(), "Just a line.\n");
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn html_only_is_converted() {
        let raw = "Content-Type: text/html\r\n\r\n<div>Quarterly <em>numbers</em></div>";
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert!(message.is_html_derived());
        let text = message.plain_text().unwrap();
        assert!(text.contains("Quarterly"));
        assert!(!text.contains("<div>"));
    }

    #[test]
    fn latin1_body() {
        let raw = b"Content-Type: text/plain; charset=iso-8859-1\r\n\r\nna\xefve";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.text.as_deref(), Some("naïve"));
    }

    #[test]
    fn inline_image_is_an_attachment() {
        let raw = concat!(
            "Content-Type: multipart/related; boundary=b\r\n\r\n",
            "--b\r\nContent-Type: text/plain\r\n\r\nsee logo\r\n",
            "--b\r\nContent-Type: image/png\r\nContent-Disposition: inline\r\n\r\nPNG\r\n",
            "--b--\r\n",
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.text.as_deref(), Some("see logo"));
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(message.attachments[0].filename, None);
        assert_eq!(message.attachments[0].content_type, "image/png");
        assert_eq!(message.attachments[0].size, 3);
    }

    #[test]
    fn missing_boundary() {
        let err = Message::parse(b"Content-Type: multipart/mixed\r\n\r\nbody").unwrap_err();
        assert!(matches!(err, Error::MissingBoundary));
    }

    #[test]
    fn preview_of_truncated_multipart() {
        let headers = Headers::parse(b"Content-Type: multipart/alternative; boundary=x\r\n");
        let partial = b"--x\r\nContent-Type: text/plain\r\n\r\nFirst words of a long";
        assert_eq!(Message::preview(&headers, partial), "First words of a long");

        let plain = Headers::parse(b"Subject: s\r\n");
        assert_eq!(Message::preview(&plain, b"hello"), "hello");

        let broken = Headers::parse(b"Content-Type: multipart/mixed\r\n");
        assert_eq!(Message::preview(&broken, b"raw"), "raw");
    }
}
