//! Subversion-over-WebDAV backend.
//!
//! Talks to `mod_dav_svn` servers with plain `PROPFIND`/`GET` requests:
//! `PROPFIND` depth 0 classifies a node, depth 1 lists a directory, and `GET`
//! returns file contents. Credentials go out as HTTP Basic auth.

pub mod client;
pub mod multistatus;

pub use client::{DavBackend, DavOptions, DavSession, node_url};
