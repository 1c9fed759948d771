use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Connection-level liveness probe for an editor instance.
///
/// Implementations must never fail: refusal, errors and timeouts all map to
/// `false`. A false negative only causes a respawn, so a cheap probe is
/// preferred over an application-level request.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Whether something accepts TCP connections on `localhost:port` within `timeout`.
    async fn is_alive(&self, port: u16, timeout: Duration) -> bool;
}

/// Probes by opening a TCP connection to the loopback address.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpHealthChecker;

impl TcpHealthChecker {
    /// Create a new TCP health checker
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HealthProbe for TcpHealthChecker {
    async fn is_alive(&self, port: u16, probe_timeout: Duration) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        match timeout(probe_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => {
                tracing::debug!(port, "Health probe succeeded");
                true
            }
            Ok(Err(e)) => {
                tracing::debug!(port, error = %e, "Health probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(port, timeout = ?probe_timeout, "Health probe timed out");
                false
            }
        }
    }
}
