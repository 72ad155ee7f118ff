//! Response parser.

mod fetch;
mod helpers;
mod types;

pub use types::{FetchItem, Response, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, Status, Uid};
use crate::{Error, Result};

use helpers::{parse_capabilities, parse_flag_list, parse_response_code, read_word, skip_spaces};

/// Parser for complete server responses.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one response as returned by the framed reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the input is not a well-formed response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);
        match lexer.next_token()? {
            Token::Asterisk => {
                lexer.expect_space()?;
                Self::parse_untagged(&mut lexer).map(Response::Untagged)
            }
            Token::Plus => {
                skip_spaces(&mut lexer);
                Ok(Response::Continuation {
                    text: lexer.rest_of_line(),
                })
            }
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            Token::Number(n) => Self::parse_tagged(&mut lexer, &n.to_string()),
            token => Err(Error::Parse {
                position: lexer.position(),
                message: format!("unexpected {token:?} at start of response"),
            }),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Response> {
        lexer.expect_space()?;
        let status = Self::parse_status(lexer)?;
        let (code, text) = Self::parse_resp_text(lexer)?;
        Ok(Response::Tagged {
            tag: tag.to_string(),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
        match lexer.next_token()? {
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom()?.to_ascii_uppercase();
                match keyword.as_str() {
                    "EXISTS" => Ok(UntaggedResponse::Exists(n)),
                    "RECENT" => Ok(UntaggedResponse::Recent(n)),
                    "EXPUNGE" => Ok(UntaggedResponse::Expunge(n)),
                    "FETCH" => {
                        lexer.expect_space()?;
                        let items = fetch::parse_fetch_items(lexer)?;
                        Ok(UntaggedResponse::Fetch { seq: n, items })
                    }
                    _ => Ok(UntaggedResponse::Other(keyword)),
                }
            }
            Token::Atom(atom) => {
                if let Some(status) = Status::parse(atom) {
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    return Ok(UntaggedResponse::Status { status, code, text });
                }
                let keyword = atom.to_ascii_uppercase();
                match keyword.as_str() {
                    "CAPABILITY" => Ok(UntaggedResponse::Capability(parse_capabilities(lexer))),
                    "FLAGS" => {
                        lexer.expect_space()?;
                        Ok(UntaggedResponse::Flags(parse_flag_list(lexer)?))
                    }
                    "SEARCH" => Ok(UntaggedResponse::Search(Self::parse_search(lexer))),
                    _ => Ok(UntaggedResponse::Other(keyword)),
                }
            }
            token => Err(Error::Parse {
                position: lexer.position(),
                message: format!("unexpected {token:?} in untagged response"),
            }),
        }
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let word = lexer.read_atom()?;
        Status::parse(word).ok_or_else(|| Error::Parse {
            position: lexer.position(),
            message: format!("invalid status {word:?}"),
        })
    }

    /// `[SP] ["[" code "]" SP] text`. Some servers omit the text entirely.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        skip_spaces(lexer);
        let code = if lexer.peek() == Some(b'[') {
            let code = parse_response_code(lexer)?;
            skip_spaces(lexer);
            Some(code)
        } else {
            None
        };
        Ok((code, lexer.rest_of_line()))
    }

    /// Collects numbers; trailing `(MODSEQ n)` and the like are ignored.
    fn parse_search(lexer: &mut Lexer<'_>) -> Vec<Uid> {
        let mut uids = Vec::new();
        loop {
            skip_spaces(lexer);
            let word = read_word(lexer);
            if word.is_empty() {
                break;
            }
            if let Some(uid) = word.parse().ok().and_then(Uid::new) {
                uids.push(uid);
            }
        }
        uids
    }
}
