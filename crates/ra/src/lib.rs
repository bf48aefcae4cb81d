//! Subversion `svn://` backend.
//!
//! Speaks the `ra_svn` protocol to `svnserve` through the `svn` crate. The
//! TCP connection and handshake are deferred to the first call on a session,
//! so bad credentials surface there, the same as with the WebDAV backend.

pub mod client;

pub use client::{RaBackend, RaOptions, RaSession, repo_path};
