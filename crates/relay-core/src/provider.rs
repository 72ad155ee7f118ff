//! Provider catalog: server defaults and well-known folder names for the
//! big mail providers. Pure lookups, no state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Implicit-TLS IMAP port.
pub const IMAP_TLS_PORT: u16 = 993;

/// Implicit-TLS SMTP submission port.
pub const SMTP_TLS_PORT: u16 = 465;

/// Mail provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Mail.
    Gmail,
    /// Outlook.com / Microsoft 365.
    Outlook,
    /// Yahoo Mail.
    Yahoo,
    /// iCloud Mail.
    Icloud,
    /// Anything else; host and port come from the user.
    Custom,
}

/// A server address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

/// Well-known folders of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Folders {
    /// Incoming mail.
    pub inbox: &'static str,
    /// Deleted mail.
    pub trash: &'static str,
    /// Junk mail.
    pub spam: &'static str,
    /// Sent mail.
    pub sent: &'static str,
    /// Drafts.
    pub drafts: &'static str,
}

impl ProviderKind {
    /// Every kind, in catalog order.
    pub const ALL: [Self; 5] = [
        Self::Gmail,
        Self::Outlook,
        Self::Yahoo,
        Self::Icloud,
        Self::Custom,
    ];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Outlook => "outlook",
            Self::Yahoo => "yahoo",
            Self::Icloud => "icloud",
            Self::Custom => "custom",
        }
    }

    /// Default IMAP endpoint; `None` for [`ProviderKind::Custom`].
    #[must_use]
    pub fn resolve(self) -> Option<Endpoint> {
        let host = match self {
            Self::Gmail => "imap.gmail.com",
            Self::Outlook => "outlook.office365.com",
            Self::Yahoo => "imap.mail.yahoo.com",
            Self::Icloud => "imap.mail.me.com",
            Self::Custom => return None,
        };
        Some(Endpoint::new(host, IMAP_TLS_PORT))
    }

    /// Outbound SMTP endpoint, recorded for send support; never dialed here.
    #[must_use]
    pub fn smtp(self) -> Option<Endpoint> {
        let host = match self {
            Self::Gmail => "smtp.gmail.com",
            Self::Outlook => "smtp-mail.outlook.com",
            Self::Yahoo => "smtp.mail.yahoo.com",
            Self::Icloud => "smtp.mail.me.com",
            Self::Custom => return None,
        };
        Some(Endpoint::new(host, SMTP_TLS_PORT))
    }

    /// Well-known folder names.
    #[must_use]
    pub const fn folders(self) -> Folders {
        match self {
            Self::Gmail => Folders {
                inbox: "INBOX",
                trash: "[Gmail]/Trash",
                spam: "[Gmail]/Spam",
                sent: "[Gmail]/Sent Mail",
                drafts: "[Gmail]/Drafts",
            },
            Self::Outlook => Folders {
                inbox: "INBOX",
                trash: "Deleted Items",
                spam: "Junk Email",
                sent: "Sent Items",
                drafts: "Drafts",
            },
            Self::Yahoo => Folders {
                inbox: "INBOX",
                trash: "Trash",
                spam: "Bulk Mail",
                sent: "Sent",
                drafts: "Draft",
            },
            Self::Icloud => Folders {
                inbox: "INBOX",
                trash: "Deleted Messages",
                spam: "Junk",
                sent: "Sent Messages",
                drafts: "Drafts",
            },
            Self::Custom => Folders {
                inbox: "INBOX",
                trash: "Trash",
                spam: "Junk",
                sent: "Sent",
                drafts: "Drafts",
            },
        }
    }

    /// Guesses the provider, first from the IMAP server name, then from
    /// the address domain.
    #[must_use]
    pub fn detect(server: Option<&str>, email: &str) -> Self {
        if let Some(kind) = server.and_then(Self::from_server) {
            return kind;
        }
        let domain = email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_ascii_lowercase())
            .unwrap_or_default();
        match domain.as_str() {
            "gmail.com" | "googlemail.com" => Self::Gmail,
            "outlook.com" | "hotmail.com" | "hotmail.fr" | "live.com" => Self::Outlook,
            "yahoo.com" | "yahoo.co.uk" | "yahoo.ca" => Self::Yahoo,
            "icloud.com" | "me.com" | "mac.com" => Self::Icloud,
            _ => Self::Custom,
        }
    }

    fn from_server(server: &str) -> Option<Self> {
        let server = server.to_ascii_lowercase();
        let on = |domain: &str| server == domain || server.ends_with(&format!(".{domain}"));
        if on("gmail.com") {
            Some(Self::Gmail)
        } else if on("outlook.com") || on("office365.com") {
            Some(Self::Outlook)
        } else if on("yahoo.com") {
            Some(Self::Yahoo)
        } else if on("icloud.com") || on("me.com") {
            Some(Self::Icloud)
        } else {
            None
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Configuration(format!("unknown provider: {s}")))
    }
}
