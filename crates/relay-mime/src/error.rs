//! MIME parsing errors.

/// Shorthand for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a header, body part or text conversion could not be read.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `Content-Type` value without a `type/subtype`.
    #[error("Malformed Content-Type: {0}")]
    InvalidContentType(String),

    /// Unknown or broken transfer encoding, or an encoded word that does not
    /// decode.
    #[error("Cannot decode {0}")]
    InvalidEncoding(String),

    /// Bad base64 payload.
    #[error("Bad base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// `multipart/*` without a `boundary` parameter.
    #[error("Multipart body has no boundary")]
    MissingBoundary,

    /// The HTML converter gave up.
    #[error("Cannot convert HTML to text: {0}")]
    Html(#[from] std::io::Error),
}
