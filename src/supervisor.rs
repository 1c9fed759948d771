//! The shared editor instance and the lock that serializes access to it.
use crate::access::AccessUrl;
use crate::config::{validate_config, EditorConfig};
use crate::error::{Error, Result};
use crate::server::{
    allocate, is_port_free, EditorLauncher, HealthProbe, InstanceEvent, InstanceEventKind,
    InstanceId, InstanceLifecycle, Launcher, PortRange, ProcessHandle, TcpHealthChecker,
};
use async_process::ExitStatus;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::Instrument;
use url::Url;

/// Delay between readiness probes while a fresh instance starts up.
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Snapshot of the running instance, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceStatus {
    /// Instance ID, new for every spawn
    pub id: InstanceId,
    /// Bound port
    pub port: u16,
    /// OS process id
    pub pid: u32,
    /// When the instance was started
    pub started_at: Instant,
    /// Time since start
    pub uptime: Duration,
}

/// Supervises the single code-server instance shared by every folder.
///
/// The host builds one supervisor at startup and hands clones of it to its
/// request handlers; clones share the same instance and lock. The instance
/// is spawned lazily by the first [`ensure_running`](Self::ensure_running),
/// reused while it accepts connections, respawned once when it does not,
/// and terminated by [`shutdown`](Self::shutdown) or when the last clone is
/// dropped.
///
/// # Examples
///
/// ```no_run
/// use editor_supervisor::{EditorConfig, EditorSupervisor};
///
/// #[tokio::main]
/// async fn main() -> editor_supervisor::Result<()> {
///     let supervisor = EditorSupervisor::new(EditorConfig::from_env()?)?;
///
///     let url = supervisor.ensure_running("/work/proj1").await?;
///     println!("open {}", url);
///
///     supervisor.shutdown().await;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EditorSupervisor {
    inner: Arc<Inner>,
}

struct Inner {
    config: EditorConfig,
    base_url: Url,
    range: PortRange,
    launcher: Arc<dyn Launcher>,
    probe: Arc<dyn HealthProbe>,
    /// `None` is the empty state; held for the whole of `ensure_running`.
    state: Mutex<Option<ProcessHandle>>,
    lifecycle: InstanceLifecycle,
}

impl EditorSupervisor {
    /// Create a supervisor that launches code-server and probes it over TCP.
    ///
    /// This method is instrumented with `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the configuration fails validation.
    #[tracing::instrument(skip(config), fields(executable = %config.executable_path))]
    pub fn new(config: EditorConfig) -> Result<Self> {
        Self::with_components(
            config,
            Arc::new(EditorLauncher::new()),
            Arc::new(TcpHealthChecker::new()),
        )
    }

    /// Create a supervisor with a custom launcher and health probe.
    pub fn with_components(
        config: EditorConfig,
        launcher: Arc<dyn Launcher>,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Self> {
        validate_config(&config)?;
        let range = config.port_range()?;
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::ConfigInvalid(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;

        tracing::info!(
            base_url = %base_url,
            range = %range,
            data_dir = %config.data_dir.display(),
            "Created editor supervisor"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                base_url,
                range,
                launcher,
                probe,
                state: Mutex::new(None),
                lifecycle: InstanceLifecycle::new(),
            }),
        })
    }

    /// The configuration the supervisor was built with
    pub fn config(&self) -> &EditorConfig {
        &self.inner.config
    }

    /// Get an access URL opening `folder` in the shared editor instance.
    ///
    /// Spawns the editor if none is running, reuses it if it accepts
    /// connections, and otherwise kills and respawns it once. The folder is
    /// neither checked for existence nor normalized.
    ///
    /// Concurrent callers are serialized behind one lock, so at most one
    /// instance is ever spawned for them. The work runs on its own task:
    /// dropping the returned future does not abort a spawn in progress, and
    /// the outcome still becomes the shared state for every other caller.
    ///
    /// This method is instrumented with `tracing`.
    ///
    /// # Errors
    ///
    /// * [`Error::NoPortAvailable`] if every port in the range is taken
    /// * [`Error::Spawn`] if the editor fails to start or become reachable,
    ///   including when the single respawn after a failed probe fails
    #[tracing::instrument(skip(self, folder), fields(folder = %folder.as_ref().display()))]
    pub async fn ensure_running(&self, folder: impl AsRef<Path>) -> Result<AccessUrl> {
        let folder = folder.as_ref().to_string_lossy().into_owned();

        let inner = Arc::clone(&self.inner);
        let port = tokio::spawn(async move { inner.ensure_running().await }.in_current_span())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Supervisor task failed");
                Error::Other(format!("Supervisor task failed: {}", e))
            })??;

        let url = AccessUrl::new(&self.inner.base_url, port, &folder)?;
        tracing::debug!(url = %url, "Built access URL");
        Ok(url)
    }

    /// Terminate the running instance, if any.
    ///
    /// Idempotent: with no instance this does nothing. Kill failures are
    /// logged, never returned.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        match state.take() {
            Some(mut handle) => {
                tracing::info!(instance_id = %handle.id(), port = handle.port(), "Shutting down editor");
                handle.kill().await;
                self.inner.lifecycle.record(
                    Some(handle.id()),
                    handle.port(),
                    InstanceEventKind::Killed,
                    Some("shutdown".to_string()),
                );
            }
            None => {
                tracing::debug!("No editor running, nothing to shut down");
            }
        }
    }

    /// Snapshot of the running instance, or `None` when empty.
    ///
    /// Waits for the lock, so it reflects any `ensure_running` in flight.
    pub async fn status(&self) -> Option<InstanceStatus> {
        let state = self.inner.state.lock().await;
        state.as_ref().map(|handle| InstanceStatus {
            id: handle.id(),
            port: handle.port(),
            pid: handle.pid(),
            started_at: handle.started_at(),
            uptime: handle.uptime(),
        })
    }

    /// Recent lifecycle events, newest first
    pub fn events(&self, limit: Option<usize>) -> Vec<InstanceEvent> {
        self.inner.lifecycle.recent(limit)
    }

    /// The lifecycle history shared by all clones
    pub fn lifecycle(&self) -> &InstanceLifecycle {
        &self.inner.lifecycle
    }
}

impl Inner {
    async fn ensure_running(&self) -> Result<u16> {
        let mut state = self.state.lock().await;

        let mut reason = "failed health probe";
        if let Some(handle) = state.as_mut() {
            if let Some(status) = handle.exit_status() {
                // Whatever answers on the port now is not our editor.
                tracing::warn!(
                    instance_id = %handle.id(),
                    port = handle.port(),
                    status = %status,
                    "Editor process has exited"
                );
                reason = "process exited";
            } else if self.probe.is_alive(handle.port(), self.config.probe_timeout()).await {
                tracing::debug!(
                    instance_id = %handle.id(),
                    port = handle.port(),
                    uptime = ?handle.uptime(),
                    "Reusing running editor"
                );
                self.lifecycle
                    .record(Some(handle.id()), handle.port(), InstanceEventKind::Reused, None);
                return Ok(handle.port());
            }
        }

        if let Some(mut dead) = state.take() {
            tracing::warn!(
                instance_id = %dead.id(),
                port = dead.port(),
                uptime = ?dead.uptime(),
                "Editor is not responding, respawning"
            );
            dead.kill().await;
            self.lifecycle.record(
                Some(dead.id()),
                dead.port(),
                InstanceEventKind::Killed,
                Some(reason.to_string()),
            );

            let handle = self.spawn(Some(dead.port())).await?;
            let port = handle.port();
            self.lifecycle.record(
                Some(handle.id()),
                port,
                InstanceEventKind::Respawned,
                Some(format!("replaced {}", dead.id())),
            );
            *state = Some(handle);
            return Ok(port);
        }

        let handle = self.spawn(None).await?;
        let port = handle.port();
        self.lifecycle
            .record(Some(handle.id()), port, InstanceEventKind::Spawned, None);
        *state = Some(handle);
        Ok(port)
    }

    /// Prefer the previous instance's port so open editor tabs stay valid.
    async fn choose_port(&self, previous: Option<u16>) -> Result<u16> {
        if let Some(port) = previous {
            if self.range.is_pinned() || (self.range.contains(port) && is_port_free(port).await) {
                return Ok(port);
            }
            tracing::debug!(port, "Previous port unavailable, allocating a new one");
        }
        allocate(self.range).await
    }

    async fn spawn(&self, previous: Option<u16>) -> Result<ProcessHandle> {
        let port = match self.choose_port(previous).await {
            Ok(port) => port,
            Err(e) => {
                let port = previous.unwrap_or(self.range.start());
                self.lifecycle
                    .record(None, port, InstanceEventKind::SpawnFailed, Some(e.to_string()));
                return Err(e);
            }
        };

        tracing::info!(port, executable = %self.config.executable_path, "Spawning editor");
        let child = match self.launcher.launch(&self.config, port).await {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(port, error = %e, "Failed to launch editor");
                self.lifecycle
                    .record(None, port, InstanceEventKind::SpawnFailed, Some(e.to_string()));
                return Err(e);
            }
        };

        let mut handle = ProcessHandle::new(port, child);
        if let Err(e) = self.wait_until_ready(&mut handle).await {
            tracing::error!(instance_id = %handle.id(), port, error = %e, "Editor failed to start");
            handle.kill().await;
            self.lifecycle.record(
                Some(handle.id()),
                port,
                InstanceEventKind::SpawnFailed,
                Some(e.to_string()),
            );
            return Err(e);
        }

        tracing::info!(instance_id = %handle.id(), port, pid = handle.pid(), "Editor started");
        Ok(handle)
    }

    /// Wait out the startup grace period, probing until the instance accepts
    /// connections.
    ///
    /// A successful probe alone is not enough: with a pinned port something
    /// else may already be listening there, and the editor only fails once it
    /// tries to bind. The child must still be running when the grace period
    /// ends.
    async fn wait_until_ready(&self, handle: &mut ProcessHandle) -> Result<()> {
        let grace = self.config.startup_grace();
        let deadline = Instant::now() + grace;
        let mut accepting = false;

        loop {
            if let Some(status) = handle.exit_status() {
                return Err(exited_during_startup(handle.port(), status));
            }

            if !accepting {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let probe_timeout = self.config.probe_timeout().min(remaining);
                accepting = self.probe.is_alive(handle.port(), probe_timeout).await;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(STARTUP_POLL_INTERVAL.min(remaining)).await;
        }

        if let Some(status) = handle.exit_status() {
            return Err(exited_during_startup(handle.port(), status));
        }
        if !accepting {
            return Err(Error::Spawn(format!(
                "Editor did not accept connections on port {} within {:?}",
                handle.port(),
                grace
            )));
        }
        Ok(())
    }
}

fn exited_during_startup(port: u16, status: ExitStatus) -> Error {
    Error::Spawn(format!(
        "Editor exited during startup on port {} ({})",
        port, status
    ))
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The handle's own drop signals the process.
        if let Some(handle) = self.state.get_mut().take() {
            tracing::info!(
                instance_id = %handle.id(),
                port = handle.port(),
                "Supervisor dropped with editor running"
            );
        }
    }
}
