//! CRLF + literal framing.
//!
//! A server response is one or more CRLF-terminated lines; a line ending in
//! `{n}` is followed by exactly `n` raw bytes before the response continues.
//! [`FramedStream::read_response`] returns the whole thing, literals inlined,
//! ready for the parser.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const READ_BUFFER_SIZE: usize = 8192;

/// Longest line accepted before giving up on the server.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Largest literal accepted; bigger messages are refused rather than buffered.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// Buffered, framed view of a server connection.
pub struct FramedStream<S> {
    reader: BufReader<S>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, stream),
        }
    }

    /// Reads one complete response, literals included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on read failure or EOF, and [`Error::Protocol`]
    /// when a line or literal exceeds the size limits.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = BytesMut::new();

        loop {
            let line_start = response.len();
            self.read_line_into(&mut response).await?;

            let Some(size) = literal_size(&response[line_start..]) else {
                break;
            };
            if size > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {size} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            let start = response.len();
            response.resize(start + size, 0);
            self.reader.read_exact(&mut response[start..]).await?;
        }

        Ok(response.to_vec())
    }

    async fn read_line_into(&mut self, out: &mut BytesMut) -> Result<()> {
        let mut line_len = 0usize;
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )));
            }

            // A CR at the end of one buffer may pair with an LF in the next.
            let pending_cr = out.last() == Some(&b'\r') && line_len > 0;
            if pending_cr && buf[0] == b'\n' {
                out.extend_from_slice(&buf[..1]);
                self.reader.consume(1);
                return Ok(());
            }

            if let Some(pos) = find_crlf(buf) {
                out.extend_from_slice(&buf[..pos + 2]);
                self.reader.consume(pos + 2);
                return Ok(());
            }

            let len = buf.len();
            out.extend_from_slice(buf);
            self.reader.consume(len);
            line_len += len;
            if line_len > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }
    }

    /// Writes bytes and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Shuts down the write half of the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the shutdown fails.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Returns `n` if the line ends in `{n}\r\n` or `{n+}\r\n`.
fn literal_size(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;
    let line = line.strip_suffix(b"}")?;
    let line = line.strip_suffix(b"+").unwrap_or(line);
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn literal_size_forms() {
        assert_eq!(literal_size(b"BODY[] {123}\r\n"), Some(123));
        assert_eq!(literal_size(b"A LOGIN {5+}\r\n"), Some(5));
        assert_eq!(literal_size(b"{0}\r\n"), Some(0));
        assert_eq!(literal_size(b"no literal\r\n"), None);
        assert_eq!(literal_size(b"{12"), None);
        assert_eq!(literal_size(b"{abc}\r\n"), None);
        assert_eq!(literal_size(b"{}\r\n"), None);
    }

    #[tokio::test]
    async fn reads_single_line() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(framed.read_response().await.unwrap(), b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn reads_literal_across_chunks() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (UID 4 BODY[] {11}\r\n")
            .read(b"hello")
            .read(b" world UID)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        let response = framed.read_response().await.unwrap();
        assert_eq!(
            response,
            b"* 1 FETCH (UID 4 BODY[] {11}\r\nhello world UID)\r\n"
        );
    }

    #[tokio::test]
    async fn crlf_split_between_reads() {
        let mock = Builder::new()
            .read(b"A0001 OK done\r")
            .read(b"\n* 2 EXISTS\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(framed.read_response().await.unwrap(), b"A0001 OK done\r\n");
        assert_eq!(framed.read_response().await.unwrap(), b"* 2 EXISTS\r\n");
    }

    #[tokio::test]
    async fn oversized_literal_is_refused() {
        let header = format!("* 1 FETCH (BODY[] {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);
        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn eof_is_an_io_error() {
        let mock = Builder::new().read(b"* OK partial").build();
        let mut framed = FramedStream::new(mock);
        let err = framed.read_response().await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn writes_and_flushes() {
        let mock = Builder::new().write(b"A0001 NOOP\r\n").build();
        let mut framed = FramedStream::new(mock);
        framed.write_all(b"A0001 NOOP\r\n").await.unwrap();
    }
}
