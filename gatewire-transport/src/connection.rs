/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Connection establishment.
//!
//! This module parses venue endpoints and dials them with a bounded
//! connect timeout. Nagle's algorithm is disabled on every connection.

use gatewire_core::error::{ConfigError, ConnectionError};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// A venue endpoint as host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    ///
    /// # Arguments
    /// * `host` - Host name or address
    /// * `port` - TCP port
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidEndpoint {
            value: s.to_string(),
        };

        let (host, port) = s.rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse().map_err(|_| invalid())?;
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Dials an endpoint with a bounded connect timeout.
///
/// # Arguments
/// * `endpoint` - The endpoint to dial
/// * `timeout` - Connect timeout
///
/// # Errors
/// Returns `ConnectionError::ConnectTimeout` when the timeout elapses,
/// `ConnectionError::ConnectFailed` on any other failure.
pub async fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream, ConnectionError> {
    let addr = (endpoint.host.as_str(), endpoint.port);

    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| ConnectionError::ConnectTimeout {
            endpoint: endpoint.to_string(),
        })?
        .map_err(|e| ConnectionError::ConnectFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    stream
        .set_nodelay(true)
        .map_err(|e| ConnectionError::ConnectFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    debug!(%endpoint, "connected");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_endpoint_parse() {
        let ep: Endpoint = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(ep.host, "127.0.0.1");
        assert_eq!(ep.port, 9000);
        assert_eq!(ep.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_endpoint_parse_invalid() {
        assert!("no-port".parse::<Endpoint>().is_err());
        assert!(":9000".parse::<Endpoint>().is_err());
        assert!("host:notaport".parse::<Endpoint>().is_err());
        assert!("host:99999".parse::<Endpoint>().is_err());
    }

    #[tokio::test]
    async fn test_connect_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = Endpoint::new("127.0.0.1", addr.port());

        let stream = connect(&endpoint, Duration::from_secs(1)).await.unwrap();
        assert!(stream.peer_addr().is_ok());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Endpoint::new("127.0.0.1", addr.port());
        let result = connect(&endpoint, Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(ConnectionError::ConnectFailed { .. })
        ));
    }
}
