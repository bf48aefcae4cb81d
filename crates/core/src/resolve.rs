use std::fmt;

/// A path relative to the repository root, derived from a caller URL.
///
/// Exactly one leading `/` is dropped from the remainder, so a well-formed
/// `target/suffix` URL never yields a leading separator. An empty string is
/// the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    url: String,
    relative: String,
}

impl ResolvedPath {
    /// Strip `target_url` from `url`.
    ///
    /// This is a literal substring removal of the first occurrence, not URL
    /// decomposition. When `target_url` does not occur in `url` the input is
    /// kept and treated as already relative.
    pub fn resolve(url: &str, target_url: &str) -> Self {
        let stripped = if target_url.is_empty() {
            url.to_string()
        } else {
            url.replacen(target_url, "", 1)
        };
        let relative = match stripped.strip_prefix('/') {
            Some(rest) => rest.to_string(),
            None => stripped,
        };
        Self {
            url: url.to_string(),
            relative,
        }
    }

    /// The caller URL this path was resolved from.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        &self.relative
    }

    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}
