//! Account name and address validation.

use crate::error::{Error, Result};

/// Longest accepted account name.
const MAX_NAME_LEN: usize = 50;

/// Checks an account name: 1-50 ASCII alphanumerics, `-`, `_` or `.`.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] otherwise.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// Checks an email address.
///
/// # Errors
///
/// Returns [`Error::InvalidEmail`] unless the address has exactly one `@`,
/// a non-empty local part and a dotted domain without empty labels.
pub fn validate_email(email: &str) -> Result<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(Error::InvalidEmail(email.to_string()))
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name+tag@example.com"));
        assert!(is_valid_email("user@sub.example.com"));
    }

    #[test]
    fn invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn names() {
        assert!(validate_name("work").is_ok());
        assert!(validate_name("home.mail_2-x").is_ok());
        assert!(validate_name(&"a".repeat(50)).is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"a".repeat(51)).is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("ünï").is_err());
    }
}
