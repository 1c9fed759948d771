use crate::error::{Error, Result};
use std::fmt;
use tokio::net::TcpListener;

/// Inclusive range of candidate ports for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    /// Create a range, rejecting `start > end`.
    ///
    /// The bounds come from external configuration, so an inverted range is a
    /// configuration error rather than a bug.
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start > end {
            return Err(Error::ConfigInvalid(format!(
                "Port range start {} is greater than end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// A range containing only `port`.
    pub fn pinned(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// First port of the range
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Last port of the range (inclusive)
    pub fn end(&self) -> u16 {
        self.end
    }

    /// Whether the range names exactly one port
    pub fn is_pinned(&self) -> bool {
        self.start == self.end
    }

    /// Whether `port` lies within the range
    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Check whether `port` can currently be bound on all interfaces.
pub async fn is_port_free(port: u16) -> bool {
    // The listener is dropped immediately; this only observes the port at
    // probe time.
    TcpListener::bind(("0.0.0.0", port)).await.is_ok()
}

/// Pick a port for a new editor instance.
///
/// A pinned range returns its port without probing; whether it can actually
/// be bound is discovered when the editor is launched and health-checked.
/// Otherwise ports are probed in ascending order and the first one free at
/// probe time is returned. The answer is advisory: another process may bind
/// the port before the editor does.
///
/// # Errors
///
/// Returns [`Error::NoPortAvailable`] if every port in the range is occupied.
#[tracing::instrument(skip(range), fields(range = %range))]
pub async fn allocate(range: PortRange) -> Result<u16> {
    if range.is_pinned() {
        tracing::debug!(port = range.start, "Using pinned port without probing");
        return Ok(range.start);
    }

    for port in range.start..=range.end {
        if is_port_free(port).await {
            tracing::debug!(port, "Found free port");
            return Ok(port);
        }
        tracing::trace!(port, "Port occupied");
    }

    tracing::warn!("No free port in range");
    Err(Error::NoPortAvailable {
        start: range.start,
        end: range.end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn occupy() -> (TcpListener, u16) {
        let listener = TcpListener::bind(("0.0.0.0", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn test_range_validation() {
        assert!(PortRange::new(8080, 8180).is_ok());
        assert!(PortRange::new(8080, 8080).unwrap().is_pinned());
        assert!(matches!(
            PortRange::new(8181, 8180),
            Err(Error::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_range_display_and_contains() {
        let range = PortRange::new(8080, 8090).unwrap();
        assert_eq!(range.to_string(), "8080-8090");
        assert!(range.contains(8080));
        assert!(range.contains(8090));
        assert!(!range.contains(8091));
    }

    #[tokio::test]
    async fn test_pinned_range_skips_probe() {
        let (_guard, port) = occupy().await;

        let allocated = allocate(PortRange::pinned(port)).await.unwrap();
        assert_eq!(allocated, port);
    }

    #[tokio::test]
    async fn test_skips_occupied_port() {
        let (_guard, port) = occupy().await;
        let end = port.saturating_add(50);

        let allocated = allocate(PortRange::new(port, end).unwrap()).await.unwrap();
        assert!(allocated > port);
        assert!(allocated <= end);
    }

    #[tokio::test]
    async fn test_exhausted_range() {
        let (_first, port) = occupy().await;
        let Some(next) = port.checked_add(1) else {
            return;
        };
        // If the neighbour is already taken by someone else it is occupied all the same.
        let _second = TcpListener::bind(("0.0.0.0", next)).await.ok();

        let err = allocate(PortRange::new(port, next).unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::NoPortAvailable { start, end } if start == port && end == next));
    }
}
