//! Parser helper functions shared by the response and FETCH parsers.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{Capability, CopyUid, Flag, Flags, ResponseCode, Uid, UidSet, UidValidity};
use crate::{Error, Result};

/// Reads raw bytes up to a space, `]`, `)`, CR or the end of input.
pub fn read_word(lexer: &mut Lexer<'_>) -> String {
    let mut word = Vec::new();
    while let Some(b) = lexer.peek() {
        if matches!(b, b' ' | b']' | b')' | b'\r') {
            break;
        }
        word.push(b);
        lexer.advance();
    }
    String::from_utf8_lossy(&word).into_owned()
}

/// Skips any run of spaces.
pub fn skip_spaces(lexer: &mut Lexer<'_>) {
    while lexer.eat(b' ') {}
}

/// Parses `[CODE args]`, leaving the lexer after the closing bracket.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;
    let name = read_word(lexer);

    let code = match name.to_ascii_uppercase().as_str() {
        "ALERT" => ResponseCode::Alert,
        "AUTHENTICATIONFAILED" => ResponseCode::AuthenticationFailed,
        "NONEXISTENT" => ResponseCode::Nonexistent,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "UIDNEXT" => number_arg(lexer)
            .and_then(Uid::new)
            .map_or_else(|| ResponseCode::Other(name.clone()), ResponseCode::UidNext),
        "UIDVALIDITY" => number_arg(lexer)
            .and_then(UidValidity::new)
            .map_or_else(|| ResponseCode::Other(name.clone()), ResponseCode::UidValidity),
        "UNSEEN" => number_arg(lexer)
            .map_or_else(|| ResponseCode::Other(name.clone()), ResponseCode::Unseen),
        "CAPABILITY" => ResponseCode::Capability(parse_capabilities(lexer)),
        "COPYUID" => parse_copy_uid(lexer)
            .map_or_else(|| ResponseCode::Other(name.clone()), ResponseCode::CopyUid),
        _ => ResponseCode::Other(name),
    };

    lexer.skip_until(b']');
    lexer.expect(Token::RBracket)?;
    Ok(code)
}

fn number_arg(lexer: &mut Lexer<'_>) -> Option<u32> {
    skip_spaces(lexer);
    read_word(lexer).parse().ok()
}

fn parse_copy_uid(lexer: &mut Lexer<'_>) -> Option<CopyUid> {
    let uid_validity = number_arg(lexer).and_then(UidValidity::new)?;
    skip_spaces(lexer);
    let source = UidSet::parse(&read_word(lexer))?;
    skip_spaces(lexer);
    let destination = UidSet::parse(&read_word(lexer))?;
    Some(CopyUid {
        uid_validity,
        source,
        destination,
    })
}

/// Parses space-separated capability atoms up to `]`, CRLF or the end.
pub fn parse_capabilities(lexer: &mut Lexer<'_>) -> Vec<Capability> {
    let mut caps = Vec::new();
    loop {
        skip_spaces(lexer);
        let word = read_word(lexer);
        if word.is_empty() {
            break;
        }
        caps.push(Capability::parse(&word));
    }
    caps
}

/// Parses a parenthesized flag list.
///
/// The `\*` wildcard of PERMANENTFLAGS is accepted and dropped.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;
    let mut flags = Flags::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space | Token::Asterisk => {}
            Token::Atom("\\") => {
                lexer.eat(b'*');
            }
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            Token::Number(n) => flags.insert(Flag::Keyword(n.to_string())),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected {token:?} in flag list"),
                });
            }
        }
    }
    Ok(flags)
}

/// Skips one value: an atom, number, string, NIL or balanced list.
pub fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        let token = lexer.next_token()?;
        match token {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket if depth > 0 => depth -= 1,
            Token::Eof | Token::Crlf | Token::RParen | Token::RBracket => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unbalanced value, got {token:?}"),
                });
            }
            _ => {}
        }
        if depth == 0 && token != Token::Space {
            return Ok(());
        }
    }
}
