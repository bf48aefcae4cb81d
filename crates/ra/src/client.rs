use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use svngate_core::{
    BackendError, Credentials, DirEntry, FileContent, NodeKind, RepositoryBackend,
    RepositoryLocation, RepositorySession, Revision, SchemeRegistry,
};

const DEFAULT_CLIENT_NAME: &str = concat!("svngate/", env!("CARGO_PKG_VERSION"));

const COMMITTED_DATE_PROP: &str = "svn:entry:committed-date";
const COMMITTED_REV_PROP: &str = "svn:entry:committed-rev";

/// Connection settings applied to every session.
#[derive(Debug, Clone)]
pub struct RaOptions {
    /// Client name announced in the `ra_svn` handshake.
    pub client_name: String,
    /// TCP connect timeout. `None` keeps the client default.
    pub connect_timeout: Option<Duration>,
}

impl Default for RaOptions {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            connect_timeout: None,
        }
    }
}

/// Backend for repositories served by `svnserve` over `svn://`.
#[derive(Debug, Clone, Default)]
pub struct RaBackend {
    options: RaOptions,
}

impl RaBackend {
    pub fn new(options: RaOptions) -> Self {
        Self { options }
    }

    fn build_client(
        &self,
        location: &RepositoryLocation,
        credentials: &Credentials,
    ) -> Result<svn::RaSvnClient, BackendError> {
        let url = svn::SvnUrl::parse(location.as_str())
            .map_err(|e| BackendError::Protocol(format!("invalid svn:// URL: {e}")))?;
        let (username, password) = if credentials.is_anonymous() {
            (None, None)
        } else {
            (
                Some(credentials.username().to_string()),
                Some(credentials.password().to_string()),
            )
        };

        let mut client = svn::RaSvnClient::new(url, username, password)
            .with_ra_client(self.options.client_name.clone());
        if let Some(timeout) = self.options.connect_timeout {
            client = client.with_connect_timeout(timeout);
        }
        Ok(client)
    }
}

impl RepositoryBackend for RaBackend {
    type Session = RaSession;

    fn register_schemes(&self, registry: &mut SchemeRegistry) {
        registry.register("svn");
    }

    async fn open(
        &self,
        location: RepositoryLocation,
        credentials: Credentials,
    ) -> Result<RaSession, BackendError> {
        let client = self.build_client(&location, &credentials)?;
        Ok(RaSession {
            client,
            location,
            conn: Mutex::new(None),
        })
    }
}

/// A session against one `svnserve` repository.
///
/// Holds at most one connection, opened by the first call. Calls on the same
/// session run one at a time. The connection closes when the session drops.
pub struct RaSession {
    client: svn::RaSvnClient,
    location: RepositoryLocation,
    conn: Mutex<Option<svn::RaSvnSession>>,
}

/// Root-relative path in the form `svnserve` expects.
///
/// Empty segments are dropped and each segment is percent-decoded, since the
/// path was cut out of a URL.
pub fn repo_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `None` asks the server for its youngest revision.
fn rev_arg(rev: Revision) -> Option<u64> {
    if rev.is_head() {
        None
    } else {
        u64::try_from(rev.as_i64()).ok()
    }
}

fn node_kind(kind: svn::NodeKind) -> Result<NodeKind, BackendError> {
    match kind {
        svn::NodeKind::Dir => Ok(NodeKind::Directory),
        svn::NodeKind::File => Ok(NodeKind::File),
        svn::NodeKind::None => Ok(NodeKind::Missing),
        other => Err(BackendError::Protocol(format!(
            "server reported node kind {other:?}"
        ))),
    }
}

fn svn_error(err: svn::SvnError) -> BackendError {
    match err {
        svn::SvnError::Io(e) => BackendError::transport(e),
        other => BackendError::Protocol(other.to_string()),
    }
}

fn not_connected() -> BackendError {
    BackendError::Protocol("svn:// session is not connected".to_string())
}

fn prop_string(props: &svn::PropertyList, name: &str) -> Option<String> {
    props
        .get(name)
        .map(|value| String::from_utf8_lossy(value).into_owned())
}

impl RaSession {
    /// Lock the connection slot, connecting and authenticating on first use.
    async fn connection(
        &self,
    ) -> Result<MutexGuard<'_, Option<svn::RaSvnSession>>, BackendError> {
        let mut conn = self.conn.lock().await;
        if conn.is_none() {
            debug!("connecting to {}", self.location);
            *conn = Some(self.client.open_session().await.map_err(svn_error)?);
        }
        Ok(conn)
    }
}

impl RepositorySession for RaSession {
    fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    async fn check_path(&self, path: &str, rev: Revision) -> Result<NodeKind, BackendError> {
        let path = repo_path(path);
        let mut conn = self.connection().await?;
        let session = conn.as_mut().ok_or_else(not_connected)?;
        debug!("check-path '{path}' at {rev}");
        let kind = session
            .check_path(&path, rev_arg(rev))
            .await
            .map_err(svn_error)?;
        node_kind(kind)
    }

    async fn get_dir(&self, path: &str, rev: Revision) -> Result<Vec<DirEntry>, BackendError> {
        let path = repo_path(path);
        let mut conn = self.connection().await?;
        let session = conn.as_mut().ok_or_else(not_connected)?;
        debug!("get-dir '{path}' at {rev}");
        let listing = session
            .list_dir(&path, rev_arg(rev))
            .await
            .map_err(svn_error)?;
        listing
            .entries
            .into_iter()
            .map(|entry| Ok(DirEntry::new(entry.name, node_kind(entry.kind)?)))
            .collect()
    }

    async fn get_file(&self, path: &str, rev: Revision) -> Result<FileContent, BackendError> {
        let path = repo_path(path);
        let mut conn = self.connection().await?;
        let session = conn.as_mut().ok_or_else(not_connected)?;

        // get-file needs a concrete revision.
        let rev = match rev_arg(rev) {
            Some(rev) => rev,
            None => session.get_latest_rev().await.map_err(svn_error)?,
        };
        debug!("get-file '{path}' at r{rev}");

        let mut bytes = Vec::new();
        let result = session
            .get_file_with_result(&path, rev, true, &mut bytes, u64::MAX)
            .await
            .map_err(svn_error)?;

        Ok(FileContent {
            bytes,
            committed_date: prop_string(&result.props, COMMITTED_DATE_PROP),
            committed_rev: prop_string(&result.props, COMMITTED_REV_PROP)
                .and_then(|v| v.trim().parse().ok()),
        })
    }
}

impl Drop for RaSession {
    fn drop(&mut self) {
        debug!("closing repository session for {}", self.location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_path_drops_empty_segments() {
        assert_eq!(repo_path(""), "");
        assert_eq!(repo_path("/trunk//src/"), "trunk/src");
    }

    #[test]
    fn repo_path_decodes_percent_escapes() {
        assert_eq!(repo_path("docs/my%20file.txt"), "docs/my file.txt");
        assert_eq!(repo_path("docs/my file.txt"), "docs/my file.txt");
        assert_eq!(repo_path("bad%ZZ"), "bad%ZZ");
    }

    #[test]
    fn head_is_sent_as_no_revision() {
        assert_eq!(rev_arg(Revision::HEAD), None);
        assert_eq!(rev_arg(Revision::number(12)), Some(12));
    }

    #[test]
    fn node_kinds_map_onto_gateway_kinds() {
        assert_eq!(node_kind(svn::NodeKind::Dir).unwrap(), NodeKind::Directory);
        assert_eq!(node_kind(svn::NodeKind::File).unwrap(), NodeKind::File);
        assert_eq!(node_kind(svn::NodeKind::None).unwrap(), NodeKind::Missing);
        assert!(matches!(
            node_kind(svn::NodeKind::Unknown),
            Err(BackendError::Protocol(_))
        ));
    }

    #[test]
    fn io_failures_are_transport_errors() {
        let err = svn_error(svn::SvnError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )));
        assert!(matches!(err, BackendError::Transport(_)));

        let err = svn_error(svn::SvnError::Protocol("bad greeting".to_string()));
        assert!(matches!(err, BackendError::Protocol(msg) if msg.contains("bad greeting")));
    }

    #[test]
    fn registers_svn_only() {
        let mut registry = SchemeRegistry::default();
        RaBackend::default().register_schemes(&mut registry);
        assert_eq!(registry.schemes().collect::<Vec<_>>(), vec!["svn"]);
    }

    #[test]
    fn default_client_name_names_the_gateway() {
        assert!(RaOptions::default().client_name.starts_with("svngate/"));
    }
}
