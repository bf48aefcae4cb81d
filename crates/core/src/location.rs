use std::fmt;

use url::Url;

use crate::error::{GatewayError, Result};

/// Absolute URL of a repository root, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    raw: String,
    url: Url,
}

impl RepositoryLocation {
    /// Parse a caller-supplied repository URL.
    ///
    /// Percent-encoded input is accepted as-is; anything that is not an
    /// absolute, hierarchical URL is reported as unreachable.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| GatewayError::unreachable(raw, e))?;
        if url.cannot_be_a_base() {
            return Err(GatewayError::unreachable(raw, "URL has no hierarchical path"));
        }
        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// The string the caller sent, unmodified.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Per-request username/password pair.
///
/// Not `Clone`: the pair moves into the session and is dropped with it.
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new("", "")
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Empty username and password mean no authentication is attempted.
    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_location() {
        let loc = RepositoryLocation::parse("https://svn.example.com/repo").unwrap();
        assert_eq!(loc.scheme(), "https");
        assert_eq!(loc.as_str(), "https://svn.example.com/repo");
        assert_eq!(loc.url().path(), "/repo");
    }

    #[test]
    fn keeps_percent_encoded_input() {
        let loc = RepositoryLocation::parse("https://svn.example.com/my%20repo").unwrap();
        assert_eq!(loc.url().path(), "/my%20repo");
    }

    #[test]
    fn rejects_relative_text() {
        let err = RepositoryLocation::parse("not a url").unwrap_err();
        assert!(matches!(err, GatewayError::RepositoryUnreachable { .. }));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn rejects_non_hierarchical_url() {
        let err = RepositoryLocation::parse("mailto:dev@example.com").unwrap_err();
        assert!(matches!(err, GatewayError::RepositoryUnreachable { .. }));
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn empty_pair_is_anonymous() {
        assert!(Credentials::anonymous().is_anonymous());
        assert!(!Credentials::new("alice", "").is_anonymous());
    }
}
