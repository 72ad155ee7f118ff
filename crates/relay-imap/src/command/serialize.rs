//! Wire encoding for command arguments.

use super::types::{FetchAttribute, SearchCriteria, StoreAction};

/// Command bytes split at synchronizing literals.
///
/// Every chunk but the last ends with `{n}\r\n`; the client must wait for a
/// `+` continuation before sending the next chunk.
#[derive(Debug, Default)]
pub struct Encoded {
    chunks: Vec<Vec<u8>>,
}

impl Encoded {
    pub(crate) fn new() -> Self {
        Self {
            chunks: vec![Vec::new()],
        }
    }

    /// Returns the chunks to send, in order.
    #[must_use]
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Returns the whole command as one byte string, literals inlined.
    #[must_use]
    pub fn concat(&self) -> Vec<u8> {
        self.chunks.concat()
    }

    fn current(&mut self) -> &mut Vec<u8> {
        if self.chunks.is_empty() {
            self.chunks.push(Vec::new());
        }
        let last = self.chunks.len() - 1;
        &mut self.chunks[last]
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.current().extend_from_slice(s.as_bytes());
    }

    pub(crate) fn push_byte(&mut self, b: u8) {
        self.current().push(b);
    }

    /// Writes an astring: a bare atom, a quoted string, or a literal.
    pub(crate) fn push_astring(&mut self, s: &str) {
        if needs_literal(s) {
            let header = format!("{{{}}}\r\n", s.len());
            self.push_str(&header);
            self.chunks.push(s.as_bytes().to_vec());
        } else if s.is_empty() || s.bytes().any(needs_quoting) {
            let buf = self.current();
            buf.push(b'"');
            for b in s.bytes() {
                if b == b'"' || b == b'\\' {
                    buf.push(b'\\');
                }
                buf.push(b);
            }
            buf.push(b'"');
        } else {
            self.push_str(s);
        }
    }

    pub(crate) fn push_fetch_attributes(&mut self, attrs: &[FetchAttribute]) {
        self.push_byte(b'(');
        for (i, attr) in attrs.iter().enumerate() {
            if i > 0 {
                self.push_byte(b' ');
            }
            match attr {
                FetchAttribute::Uid => self.push_str("UID"),
                FetchAttribute::Flags => self.push_str("FLAGS"),
                FetchAttribute::InternalDate => self.push_str("INTERNALDATE"),
                FetchAttribute::Rfc822Size => self.push_str("RFC822.SIZE"),
                FetchAttribute::BodyPeek { section, partial } => {
                    self.push_str("BODY.PEEK[");
                    self.push_str(section);
                    self.push_byte(b']');
                    if let Some((start, len)) = partial {
                        self.push_str(&format!("<{start}.{len}>"));
                    }
                }
            }
        }
        self.push_byte(b')');
    }

    pub(crate) fn push_search(&mut self, criteria: &SearchCriteria) {
        match criteria {
            SearchCriteria::All => self.push_str("ALL"),
            SearchCriteria::Unseen => self.push_str("UNSEEN"),
            SearchCriteria::Header(name, value) => {
                self.push_str("HEADER ");
                self.push_astring(name);
                self.push_byte(b' ');
                self.push_astring(value);
            }
        }
    }

    pub(crate) fn push_store(&mut self, action: &StoreAction, silent: bool) {
        let (prefix, flags) = match action {
            StoreAction::Add(f) => ("+FLAGS", f),
            StoreAction::Remove(f) => ("-FLAGS", f),
        };
        self.push_str(prefix);
        if silent {
            self.push_str(".SILENT");
        }
        self.push_str(" (");
        for (i, flag) in flags.iter().enumerate() {
            if i > 0 {
                self.push_byte(b' ');
            }
            self.push_str(flag.as_str());
        }
        self.push_byte(b')');
    }
}

/// Returns true if the byte cannot appear in a bare atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b == 0x7F
}

/// Quoted strings cannot carry CR, LF, NUL or 8-bit bytes.
fn needs_literal(s: &str) -> bool {
    s.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0 || b >= 0x80)
}
