//! Decrypted secret with a short, explicit lifetime.

use std::fmt;

/// A decrypted password.
///
/// The bytes are overwritten when the value is dropped and `Debug` never
/// prints them. Not `Clone`: a secret has exactly one owner.
pub struct Secret(String);

impl Secret {
    /// Wraps a plaintext secret.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Borrows the plaintext.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Plaintext as sent on LOGIN: non-breaking spaces from copy-paste
    /// become plain spaces.
    #[must_use]
    pub fn for_login(&self) -> Self {
        Self(self.0.replace('\u{a0}', " "))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.fill(0);
        std::hint::black_box(&bytes);
    }
}
