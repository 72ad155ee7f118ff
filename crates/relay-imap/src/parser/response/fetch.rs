//! FETCH response parsing.

use crate::parser::lexer::{Lexer, Token, is_atom_char};
use crate::types::Uid;
use crate::{Error, Result};

use super::helpers::{parse_flag_list, skip_spaces, skip_value};
use super::types::FetchItem;

/// Parses the parenthesized item list of `* n FETCH (...)`.
///
/// Items the client never asks for (BODYSTRUCTURE, MODSEQ, X-GM-*) are
/// skipped.
pub fn parse_fetch_items(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;
    let mut items = Vec::new();

    loop {
        skip_spaces(lexer);
        if lexer.eat(b')') {
            break;
        }
        let name = read_item_name(lexer);
        if name.is_empty() {
            return Err(parse_error(lexer, "expected fetch item name"));
        }

        match name.to_ascii_uppercase().as_str() {
            "UID" => {
                lexer.expect_space()?;
                let n = lexer.read_number()?;
                let uid = Uid::new(n).ok_or_else(|| parse_error(lexer, "UID 0"))?;
                items.push(FetchItem::Uid(uid));
            }
            "FLAGS" => {
                lexer.expect_space()?;
                items.push(FetchItem::Flags(parse_flag_list(lexer)?));
            }
            "INTERNALDATE" => {
                lexer.expect_space()?;
                items.push(FetchItem::InternalDate(lexer.read_astring()?));
            }
            "RFC822.SIZE" => {
                lexer.expect_space()?;
                items.push(FetchItem::Rfc822Size(lexer.read_number()?));
            }
            "BODY" | "BODY.PEEK" | "BINARY" if lexer.peek() == Some(b'[') => {
                items.push(parse_body_section(lexer)?);
            }
            "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                let section = name
                    .to_ascii_uppercase()
                    .strip_prefix("RFC822.")
                    .unwrap_or_default()
                    .to_string();
                lexer.expect_space()?;
                items.push(FetchItem::Body {
                    section,
                    origin: None,
                    data: read_nstring_bytes(lexer)?,
                });
            }
            _ => {
                tracing::trace!(item = %name, "skipping fetch item");
                lexer.expect_space()?;
                skip_value(lexer)?;
            }
        }
    }

    Ok(items)
}

fn read_item_name(lexer: &mut Lexer<'_>) -> String {
    let mut name = Vec::new();
    while let Some(b) = lexer.peek() {
        if !is_atom_char(b) {
            break;
        }
        name.push(b);
        lexer.advance();
    }
    String::from_utf8_lossy(&name).into_owned()
}

/// Parses `[section]<origin> value` after a BODY item name.
fn parse_body_section(lexer: &mut Lexer<'_>) -> Result<FetchItem> {
    lexer.expect(Token::LBracket)?;

    // Sections may carry parenthesized field lists; read raw up to `]`.
    let mut raw = Vec::new();
    loop {
        match lexer.advance() {
            Some(b']') => break,
            Some(b) => raw.push(b),
            None => return Err(parse_error(lexer, "unterminated body section")),
        }
    }
    let section = String::from_utf8_lossy(&raw).into_owned();

    let origin = if lexer.eat(b'<') {
        let mut digits = String::new();
        while let Some(b) = lexer.peek().filter(u8::is_ascii_digit) {
            digits.push(char::from(b));
            lexer.advance();
        }
        if !lexer.eat(b'>') {
            return Err(parse_error(lexer, "unterminated partial origin"));
        }
        digits.parse().ok()
    } else {
        None
    };

    lexer.expect_space()?;
    Ok(FetchItem::Body {
        section,
        origin,
        data: read_nstring_bytes(lexer)?,
    })
}

fn read_nstring_bytes(lexer: &mut Lexer<'_>) -> Result<Option<Vec<u8>>> {
    match lexer.next_token()? {
        Token::Literal(data) => Ok(Some(data)),
        Token::Quoted(s) => Ok(Some(s.into_bytes())),
        Token::Nil => Ok(None),
        token => Err(parse_error(lexer, &format!("expected nstring, got {token:?}"))),
    }
}

fn parse_error(lexer: &Lexer<'_>, message: &str) -> Error {
    Error::Parse {
        position: lexer.position(),
        message: message.to_string(),
    }
}
