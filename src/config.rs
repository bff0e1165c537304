//! Listener configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 8000;

/// Where the HTTP server binds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Load from ARENA_HOST / ARENA_PORT. Blank or unparsable values fall
    /// back to the defaults with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = match std::env::var("ARENA_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid ARENA_HOST {:?}", raw);
                defaults.host
            }),
            None => defaults.host,
        };

        let port = match std::env::var("ARENA_PORT")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid ARENA_PORT {:?}", raw);
                defaults.port
            }),
            None => defaults.port,
        };

        Self { host, port }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
