/// Process management building blocks for the editor supervisor.
///
/// This module provides the pieces the supervisor composes: choosing a port,
/// launching and terminating the editor process, probing it for liveness,
/// and recording what happened to each instance.
///
/// # Components
///
/// * `port` - Port range validation and free-port allocation
/// * `health` - Connection-level liveness probe
/// * `process` - Launching the editor and owning its OS process
/// * `lifecycle` - Bounded history of instance events
///
/// # Examples
///
/// Probing a port:
///
/// ```no_run
/// use editor_supervisor::server::{HealthProbe, TcpHealthChecker};
/// use std::time::Duration;
///
/// # async fn run() {
/// let alive = TcpHealthChecker::new().is_alive(8080, Duration::from_millis(100)).await;
/// println!("editor on 8080 alive: {}", alive);
/// # }
/// ```
///
/// Allocating a port from a range:
///
/// ```no_run
/// use editor_supervisor::server::{allocate, PortRange};
///
/// # async fn run() -> editor_supervisor::Result<()> {
/// let port = allocate(PortRange::new(8080, 8180)?).await?;
/// println!("editor will bind {}", port);
/// # Ok(())
/// # }
/// ```
pub mod health;
pub mod lifecycle;
pub mod port;
mod process;

pub use health::{HealthProbe, TcpHealthChecker};
pub use lifecycle::{InstanceEvent, InstanceEventKind, InstanceLifecycle};
pub use port::{allocate, is_port_free, PortRange};
pub use process::{EditorLauncher, InstanceId, Launcher, ProcessHandle};
