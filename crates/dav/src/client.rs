use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::debug;
use url::Url;

use svngate_core::{
    BackendError, Credentials, DirEntry, FileContent, NodeKind, RepositoryBackend,
    RepositoryLocation, RepositorySession, Revision, SchemeRegistry,
};

use crate::multistatus::{self, PROPFIND_BODY, PropEntry};

const DEFAULT_USER_AGENT: &str = concat!("svngate/", env!("CARGO_PKG_VERSION"));

/// HTTP client settings applied to every session.
#[derive(Debug, Clone)]
pub struct DavOptions {
    pub user_agent: String,
    /// TCP connect timeout. `None` keeps the transport default.
    pub connect_timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
}

impl Default for DavOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: None,
            accept_invalid_certs: false,
        }
    }
}

/// Backend for repositories served by `mod_dav_svn` over `http(s)://`.
#[derive(Debug, Clone, Default)]
pub struct DavBackend {
    options: DavOptions,
}

impl DavBackend {
    pub fn new(options: DavOptions) -> Self {
        Self { options }
    }

    fn build_client(&self) -> Result<reqwest::Client, BackendError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.options.user_agent.as_str())
            .danger_accept_invalid_certs(self.options.accept_invalid_certs);
        if let Some(timeout) = self.options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder.build().map_err(BackendError::transport)
    }
}

impl RepositoryBackend for DavBackend {
    type Session = DavSession;

    fn register_schemes(&self, registry: &mut SchemeRegistry) {
        registry.register("http");
        registry.register("https");
    }

    async fn open(
        &self,
        location: RepositoryLocation,
        credentials: Credentials,
    ) -> Result<DavSession, BackendError> {
        // One client per session: connections are never shared between requests.
        let client = self.build_client()?;
        Ok(DavSession {
            client,
            location,
            credentials,
        })
    }
}

/// A session against one repository. The HTTP client and its connections
/// are released when the session is dropped.
pub struct DavSession {
    client: reqwest::Client,
    location: RepositoryLocation,
    credentials: Credentials,
}

#[derive(Debug, Clone, Copy)]
enum Depth {
    Zero,
    One,
}

impl Depth {
    fn header(self) -> HeaderValue {
        match self {
            Self::Zero => HeaderValue::from_static("0"),
            Self::One => HeaderValue::from_static("1"),
        }
    }
}

/// URL of `path` under the repository root at `rev`.
///
/// Head is the plain public URL. Older revisions go through the
/// `!svn/bc/<rev>/` baseline collection under the root.
pub fn node_url(root: &Url, path: &str, rev: Revision) -> Result<Url, BackendError> {
    let mut url = root.clone();
    url.set_query(None);
    url.set_fragment(None);
    let rev_segment = rev.as_i64().to_string();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| BackendError::Protocol(format!("{root} cannot be a base URL")))?;
        segments.pop_if_empty();
        if !rev.is_head() {
            segments.extend(["!svn", "bc", rev_segment.as_str()]);
        }
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            // Segments may still carry the caller's percent-encoding.
            match urlencoding::decode(segment) {
                Ok(decoded) => segments.push(&decoded),
                Err(_) => segments.push(segment),
            };
        }
    }
    Ok(url)
}

fn check_status(status: StatusCode) -> Result<(), BackendError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
        StatusCode::FORBIDDEN => Err(BackendError::Forbidden),
        s => Err(BackendError::Status(s.as_u16())),
    }
}

fn decode_lossy(value: &str) -> String {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// Path component of an `href`, which may be absolute or server-relative.
fn href_path(href: &str) -> String {
    let path = match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.to_string(),
    };
    decode_lossy(path.trim_end_matches('/'))
}

fn entry_name(href: &str) -> String {
    href_path(href)
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

impl DavSession {
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        if self.credentials.is_anonymous() {
            builder
        } else {
            builder.basic_auth(
                self.credentials.username(),
                Some(self.credentials.password()),
            )
        }
    }

    /// Issue a `PROPFIND`. `Ok(None)` means the node does not exist.
    async fn propfind(&self, url: Url, depth: Depth) -> Result<Option<Vec<PropEntry>>, BackendError> {
        let method = Method::from_bytes(b"PROPFIND").map_err(BackendError::transport)?;
        debug!("PROPFIND {url} (depth {depth:?})");
        let resp = self
            .request(method, url)
            .header("Depth", depth.header())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(PROPFIND_BODY)
            .send()
            .await
            .map_err(BackendError::transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(resp.status())?;
        let body = resp.text().await.map_err(BackendError::transport)?;
        multistatus::parse(&body).map(Some)
    }

    async fn get(&self, url: Url) -> Result<Response, BackendError> {
        debug!("GET {url}");
        let resp = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(BackendError::transport)?;
        check_status(resp.status())?;
        Ok(resp)
    }
}

impl RepositorySession for DavSession {
    fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    async fn check_path(&self, path: &str, rev: Revision) -> Result<NodeKind, BackendError> {
        let url = node_url(self.location.url(), path, rev)?;
        let Some(entries) = self.propfind(url, Depth::Zero).await? else {
            return Ok(NodeKind::Missing);
        };
        let entry = entries
            .first()
            .ok_or_else(|| BackendError::Protocol("empty PROPFIND response".to_string()))?;
        Ok(if entry.collection {
            NodeKind::Directory
        } else {
            NodeKind::File
        })
    }

    async fn get_dir(&self, path: &str, rev: Revision) -> Result<Vec<DirEntry>, BackendError> {
        let url = node_url(self.location.url(), path, rev)?;
        let self_path = decode_lossy(url.path().trim_end_matches('/'));
        let entries = self
            .propfind(url, Depth::One)
            .await?
            .ok_or(BackendError::Status(StatusCode::NOT_FOUND.as_u16()))?;

        Ok(entries
            .into_iter()
            .filter(|entry| href_path(&entry.href) != self_path)
            .map(|entry| {
                let kind = if entry.collection {
                    NodeKind::Directory
                } else {
                    NodeKind::File
                };
                DirEntry::new(entry_name(&entry.href), kind)
            })
            .filter(|entry| !entry.name.is_empty())
            .collect())
    }

    async fn get_file(&self, path: &str, rev: Revision) -> Result<FileContent, BackendError> {
        let url = node_url(self.location.url(), path, rev)?;
        let props = self
            .propfind(url.clone(), Depth::Zero)
            .await?
            .ok_or(BackendError::Status(StatusCode::NOT_FOUND.as_u16()))?
            .into_iter()
            .next()
            .unwrap_or_default();

        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(BackendError::transport)?
            .to_vec();

        Ok(FileContent {
            bytes,
            committed_date: props.creation_date,
            committed_rev: props.version_name.and_then(|v| v.parse().ok()),
        })
    }
}

impl Drop for DavSession {
    fn drop(&mut self) {
        debug!("closing repository session for {}", self.location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://svn.example.com/repo").unwrap()
    }

    #[test]
    fn head_url_appends_path() {
        let url = node_url(&root(), "trunk/src", Revision::HEAD).unwrap();
        assert_eq!(url.as_str(), "https://svn.example.com/repo/trunk/src");
    }

    #[test]
    fn root_path_keeps_repository_url() {
        let url = node_url(&root(), "", Revision::HEAD).unwrap();
        assert_eq!(url.as_str(), "https://svn.example.com/repo");
    }

    #[test]
    fn trailing_slash_on_root_is_not_doubled() {
        let root = Url::parse("https://svn.example.com/repo/").unwrap();
        let url = node_url(&root, "trunk", Revision::HEAD).unwrap();
        assert_eq!(url.as_str(), "https://svn.example.com/repo/trunk");
    }

    #[test]
    fn pinned_revision_uses_baseline_collection() {
        let url = node_url(&root(), "trunk/README.md", Revision::number(42)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://svn.example.com/repo/!svn/bc/42/trunk/README.md"
        );
    }

    #[test]
    fn segments_are_encoded_once() {
        let raw = node_url(&root(), "docs/my file.txt", Revision::HEAD).unwrap();
        let pre_encoded = node_url(&root(), "docs/my%20file.txt", Revision::HEAD).unwrap();
        assert_eq!(raw.as_str(), "https://svn.example.com/repo/docs/my%20file.txt");
        assert_eq!(raw, pre_encoded);
    }

    #[test]
    fn query_on_root_is_dropped() {
        let root = Url::parse("https://svn.example.com/repo?p=1#frag").unwrap();
        let url = node_url(&root, "trunk", Revision::HEAD).unwrap();
        assert_eq!(url.as_str(), "https://svn.example.com/repo/trunk");
    }

    #[test]
    fn entry_names_come_from_last_href_segment() {
        assert_eq!(entry_name("/repo/trunk/src/lib/"), "lib");
        assert_eq!(entry_name("/repo/trunk/my%20file.txt"), "my file.txt");
        assert_eq!(
            entry_name("https://svn.example.com/repo/trunk/main.c"),
            "main.c"
        );
    }

    #[test]
    fn status_mapping() {
        assert!(check_status(StatusCode::MULTI_STATUS).is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(BackendError::Unauthorized)
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN),
            Err(BackendError::Forbidden)
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(BackendError::Status(502))
        ));
    }

    #[test]
    fn default_user_agent_names_the_gateway() {
        assert!(DavOptions::default().user_agent.starts_with("svngate/"));
    }
}
