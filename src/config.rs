use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use tracing::Level;

use crate::codec::{OversizePolicy, DEFAULT_BUFFER_SIZE};

/// Name of the binary.
pub const APP_NAME: &str = "xcloud-listener";

/// Log file name, kept stable for deployments that tail it.
pub const LOG_FILE_NAME: &str = "xcloudListener.log";

/// Port of the HTTP trigger endpoint.
pub const DEFAULT_PORT: u16 = 9000;

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log file, opened in append mode. Falls back to stderr if it cannot be opened.
    pub file: PathBuf,
    /// Default maximum level. `RUST_LOG` overrides it when set.
    pub max_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(LOG_FILE_NAME),
            max_level: Level::INFO,
        }
    }
}

/// Runtime settings of the host process.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Largest incoming payload read per frame.
    pub buffer_size: usize,
    pub oversize: OversizePolicy,
    pub log: LogConfig,
}

impl HostConfig {
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            oversize: OversizePolicy::default(),
            log: LogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_compiled_in_constants() {
        let config = HostConfig::default();
        assert_eq!(config.http_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.oversize, OversizePolicy::Skip);
        assert_eq!(config.log.file, PathBuf::from("xcloudListener.log"));
    }
}
