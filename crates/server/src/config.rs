use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use svngate_dav::DavOptions;
use svngate_ra::RaOptions;

/// Server configuration, from flags or environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "svngate-server",
    version,
    about = "HTTP gateway for listing and reading Subversion repositories"
)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "SVNGATE_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// User-Agent (HTTP) or client name (svn://) sent to repository servers
    #[arg(long, env = "SVNGATE_USER_AGENT")]
    pub user_agent: Option<String>,

    /// TCP connect timeout for repository requests, in seconds
    #[arg(long, env = "SVNGATE_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Accept self-signed or otherwise invalid repository TLS certificates
    #[arg(long, env = "SVNGATE_ACCEPT_INVALID_CERTS")]
    pub accept_invalid_certs: bool,

    /// Allow cross-origin requests from any origin
    #[arg(long, env = "SVNGATE_CORS")]
    pub cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agent
            .clone()
            .filter(|ua| !ua.trim().is_empty())
    }

    fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// HTTP client settings for the WebDAV backend.
    pub fn dav_options(&self) -> DavOptions {
        DavOptions {
            user_agent: self
                .user_agent()
                .unwrap_or_else(|| DavOptions::default().user_agent),
            connect_timeout: self.connect_timeout(),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }

    /// Connection settings for the `svn://` backend.
    pub fn ra_options(&self) -> RaOptions {
        RaOptions {
            client_name: self
                .user_agent()
                .unwrap_or_else(|| RaOptions::default().client_name),
            connect_timeout: self.connect_timeout(),
        }
    }
}
