//! TCP connect probing of a single port.
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::{
    io::{self, AsyncWriteExt},
    net::TcpStream,
    time,
};

use super::outcome::ScanResult;

/// Decides whether one port on one host accepts connections.
///
/// Every call yields exactly one [`ScanResult`]; failures are folded into
/// `open = false`.
#[async_trait]
pub trait PortProbe: Send + Sync {
    async fn probe(&self, host: Ipv4Addr, port: u16, timeout: Duration) -> ScanResult;
}

/// Full TCP handshake against the port, closed again right away.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnectProbe;

impl TcpConnectProbe {
    /// Performs the connection to the socket with timeout
    /// # Example
    ///
    /// ```compile_fail
    /// let socket = SocketAddr::from(([127, 0, 0, 1], 80));
    /// TcpConnectProbe::connect(socket, Duration::from_millis(500));
    /// // returns Ok(stream) for an open port, Err for a closed one or after the timeout.
    /// ```
    async fn connect(socket: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
        time::timeout(timeout, async move { TcpStream::connect(socket).await }).await?
    }
}

#[async_trait]
impl PortProbe for TcpConnectProbe {
    async fn probe(&self, host: Ipv4Addr, port: u16, timeout: Duration) -> ScanResult {
        let socket = SocketAddr::V4(SocketAddrV4::new(host, port));

        match Self::connect(socket, timeout).await {
            Ok(tcp_stream) => {
                debug!("Connection was successful, shutting down stream {socket}");
                if let Err(e) = { tcp_stream }.shutdown().await {
                    debug!("Shutdown stream error {e}");
                }
                ScanResult::new(host, port, true)
            }
            Err(e) => {
                if e.to_string().to_lowercase().contains("too many open files") {
                    warn!(
                        "Too many open files while probing {socket}. Lower --max-in-flight or raise --ulimit."
                    );
                } else {
                    debug!("Port {socket} closed: {e}");
                }
                ScanResult::new(host, port, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PortProbe, TcpConnectProbe};
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = TcpConnectProbe
            .probe(Ipv4Addr::LOCALHOST, port, Duration::from_millis(500))
            .await;

        assert!(result.is_open());
        assert_eq!(result.host(), Ipv4Addr::LOCALHOST);
        assert_eq!(result.port(), port);
    }

    #[tokio::test]
    async fn refused_port_is_closed() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = TcpConnectProbe
            .probe(Ipv4Addr::LOCALHOST, port, Duration::from_millis(500))
            .await;

        assert!(!result.is_open());
        assert_eq!(result.port(), port);
    }

    #[tokio::test]
    async fn unreachable_host_times_out_as_closed() {
        let result = TcpConnectProbe
            .probe(Ipv4Addr::new(192, 0, 2, 1), 80, Duration::from_millis(100))
            .await;

        assert!(!result.is_open());
    }
}
