//! Dispatch by URL scheme across the repository protocol backends.

use svngate_core::{
    BackendError, Credentials, DirEntry, FileContent, NodeKind, RepositoryBackend,
    RepositoryLocation, RepositorySession, Revision, SchemeRegistry,
};
use svngate_dav::{DavBackend, DavSession};
use svngate_ra::{RaBackend, RaSession};

/// WebDAV for `http(s)://`, `ra_svn` for `svn://`.
pub struct ProtocolBackend {
    dav: DavBackend,
    ra: RaBackend,
    ra_schemes: SchemeRegistry,
}

impl ProtocolBackend {
    pub fn new(dav: DavBackend, ra: RaBackend) -> Self {
        let mut ra_schemes = SchemeRegistry::default();
        ra.register_schemes(&mut ra_schemes);
        Self {
            dav,
            ra,
            ra_schemes,
        }
    }
}

pub enum ProtocolSession {
    Dav(DavSession),
    Ra(RaSession),
}

impl RepositoryBackend for ProtocolBackend {
    type Session = ProtocolSession;

    fn register_schemes(&self, registry: &mut SchemeRegistry) {
        self.dav.register_schemes(registry);
        self.ra.register_schemes(registry);
    }

    async fn open(
        &self,
        location: RepositoryLocation,
        credentials: Credentials,
    ) -> Result<ProtocolSession, BackendError> {
        if self.ra_schemes.supports(location.scheme()) {
            self.ra
                .open(location, credentials)
                .await
                .map(ProtocolSession::Ra)
        } else {
            self.dav
                .open(location, credentials)
                .await
                .map(ProtocolSession::Dav)
        }
    }
}

impl RepositorySession for ProtocolSession {
    fn location(&self) -> &RepositoryLocation {
        match self {
            Self::Dav(s) => s.location(),
            Self::Ra(s) => s.location(),
        }
    }

    async fn check_path(&self, path: &str, rev: Revision) -> Result<NodeKind, BackendError> {
        match self {
            Self::Dav(s) => s.check_path(path, rev).await,
            Self::Ra(s) => s.check_path(path, rev).await,
        }
    }

    async fn get_dir(&self, path: &str, rev: Revision) -> Result<Vec<DirEntry>, BackendError> {
        match self {
            Self::Dav(s) => s.get_dir(path, rev).await,
            Self::Ra(s) => s.get_dir(path, rev).await,
        }
    }

    async fn get_file(&self, path: &str, rev: Revision) -> Result<FileContent, BackendError> {
        match self {
            Self::Dav(s) => s.get_file(path, rev).await,
            Self::Ra(s) => s.get_file(path, rev).await,
        }
    }
}
