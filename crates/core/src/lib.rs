//! Request-to-repository resolution pipeline for svngate.
//!
//! A request goes through three steps: [`Gateway::open_session`] opens an
//! authenticated session, [`ResolvedPath::resolve`] turns the caller URL into
//! a root-relative path, and the [`query`] functions classify that path and
//! list or fetch it. Protocol clients plug in through [`RepositoryBackend`].

pub mod error;
pub mod location;
pub mod query;
pub mod repo;
pub mod resolve;
pub mod session;

pub use error::{BackendError, GatewayError, Operation, Result};
pub use location::{Credentials, RepositoryLocation};
pub use repo::{
    DirEntry, DirectoryListing, FileContent, NodeKind, RepositoryBackend, RepositorySession,
    Revision,
};
pub use resolve::ResolvedPath;
pub use session::{Gateway, SchemeRegistry};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
