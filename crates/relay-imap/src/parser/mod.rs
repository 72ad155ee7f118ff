//! Sans-I/O parser for server responses.
//!
//! The lexer tokenizes one framed response; the response parser turns the
//! tokens into [`Response`] values.
//!
//! ```
//! use relay_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 12 EXISTS\r\n").unwrap();
//! assert_eq!(response, Response::Untagged(UntaggedResponse::Exists(12)));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{FetchItem, Response, ResponseParser, UntaggedResponse};
