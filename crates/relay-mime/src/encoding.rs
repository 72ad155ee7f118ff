//! Transfer and header decoding.
//!
//! Base64 and quoted-printable bodies (RFC 2045), encoded words in headers
//! (RFC 2047), and the handful of charsets mail actually arrives in.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// Decodes Base64, ignoring embedded line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes quoted-printable bytes.
///
/// Soft line breaks are removed. A malformed `=XX` escape is kept verbatim
/// rather than failing the whole body.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] != b'=' {
            out.push(data[i]);
            i += 1;
            continue;
        }
        match data.get(i + 1..i + 3) {
            Some(b"\r\n") => i += 3,
            Some([b'\n', ..]) => i += 2,
            Some(&[hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                out.push((hex_value(hi) << 4) | hex_value(lo));
                i += 3;
            }
            _ if data.get(i + 1) == Some(&b'\n') => i += 2,
            _ => {
                out.push(b'=');
                i += 1;
            }
        }
    }
    out
}

const fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

/// Decodes bytes in `charset` to a string.
///
/// UTF-8, US-ASCII, ISO-8859-1 and Windows-1252 are decoded exactly; any
/// other charset is treated as UTF-8 with replacement characters.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let charset = charset.unwrap_or("utf-8").trim().to_ascii_lowercase();
    match charset.as_str() {
        "iso-8859-1" | "latin1" | "latin-1" | "iso8859-1" => {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
        "windows-1252" | "cp1252" => bytes.iter().map(|&b| windows_1252(b)).collect(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Windows-1252 differs from Latin-1 only in 0x80..=0x9F.
fn windows_1252(b: u8) -> char {
    const HIGH: [char; 32] = [
        '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8D}', 'Ž',
        '\u{8F}', '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '•', '–', '—', '˜',
        '™', 'š', '›', 'œ', '\u{9D}', 'ž', 'Ÿ',
    ];
    if (0x80..=0x9F).contains(&b) {
        HIGH[usize::from(b - 0x80)]
    } else {
        char::from(b)
    }
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped, as the RFC
/// requires; words that fail to decode are left as written.
#[must_use]
pub fn decode_header_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut last_was_encoded = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        match decode_encoded_word(candidate) {
            Some((decoded, consumed)) => {
                if !(last_was_encoded && before.trim().is_empty()) {
                    out.push_str(before);
                }
                out.push_str(&decoded);
                rest = &candidate[consumed..];
                last_was_encoded = true;
            }
            None => {
                out.push_str(before);
                out.push_str("=?");
                rest = &candidate[2..];
                last_was_encoded = false;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes one `=?charset?enc?text?=` at the start of `input`, returning the
/// text and the number of bytes consumed.
fn decode_encoded_word(input: &str) -> Option<(String, usize)> {
    let body = input.strip_prefix("=?")?;
    let (charset_field, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let end = body.find("?=")?;
    let text = &body[..end];
    if text.contains(char::is_whitespace) {
        return None;
    }
    // RFC 2231 language suffix: utf-8*en
    let charset = charset_field.split('*').next().unwrap_or(charset_field);

    let bytes = match encoding {
        "B" | "b" => decode_base64(text.as_bytes()).ok()?,
        "Q" | "q" => decode_quoted_printable(text.replace('_', " ").as_bytes()),
        _ => return None,
    };
    let consumed = 2 + charset_field.len() + 1 + encoding.len() + 1 + end + 2;
    Some((decode_charset(&bytes, Some(charset)), consumed))
}

/// Decodes a body according to its `Content-Transfer-Encoding`.
///
/// # Errors
///
/// Returns an error for malformed Base64.
pub fn decode_transfer(body: &[u8], encoding: Option<&str>) -> Result<Vec<u8>> {
    let encoding = encoding.map(|e| e.trim().to_ascii_lowercase());
    match encoding.as_deref() {
        Some("base64") => decode_base64(body),
        Some("quoted-printable") => Ok(decode_quoted_printable(body)),
        None | Some("7bit" | "8bit" | "binary" | "") => Ok(body.to_vec()),
        Some(other) => Err(Error::InvalidEncoding(format!(
            "unknown transfer encoding {other}"
        ))),
    }
}
