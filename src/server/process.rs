// src/server/process.rs
use crate::config::EditorConfig;
use crate::error::{Error, Result};
use async_process::{Child, Command, ExitStatus, Stdio};
use async_trait::async_trait;
use std::fmt;
use std::time::{Duration, Instant, SystemTime};
use uuid::Uuid;

/// How long `kill` waits for the process to be reaped.
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Unique identifier for one spawned editor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Starts the editor executable bound to a given port.
///
/// The supervisor only ever calls this while holding its lock, so an
/// implementation never races itself.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Launch the editor listening on `port`.
    async fn launch(&self, config: &EditorConfig, port: u16) -> Result<Child>;
}

/// Launches code-server with authentication disabled for local-only access.
///
/// The command line is
/// `<executable> --auth none --bind-addr 0.0.0.0:<port> --user-data-dir <data_dir> [extra_args...]`.
/// `PORT` is removed from the child environment because code-server would
/// otherwise prefer it over `--bind-addr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditorLauncher;

impl EditorLauncher {
    /// Create a new launcher
    pub fn new() -> Self {
        Self
    }

    /// The arguments passed to the executable for `port`.
    pub fn args(config: &EditorConfig, port: u16) -> Vec<String> {
        let mut args = vec![
            "--auth".to_string(),
            "none".to_string(),
            "--bind-addr".to_string(),
            format!("0.0.0.0:{}", port),
            "--user-data-dir".to_string(),
            config.data_dir.to_string_lossy().into_owned(),
        ];
        args.extend(config.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl Launcher for EditorLauncher {
    async fn launch(&self, config: &EditorConfig, port: u16) -> Result<Child> {
        tokio::fs::create_dir_all(&config.data_dir).await.map_err(|e| {
            Error::Spawn(format!(
                "Failed to create data dir {}: {}",
                config.data_dir.display(),
                e
            ))
        })?;

        let mut command = Command::new(&config.executable_path);
        command
            .args(Self::args(config, port))
            .env_remove("PORT")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        command.spawn().map_err(|e| {
            Error::Spawn(format!(
                "Failed to start '{}': {}",
                config.executable_path, e
            ))
        })
    }
}

/// One live editor process together with the port it was told to bind.
///
/// Dropping a handle that was not explicitly killed signals the process, so
/// no exit path can leave the editor running unowned.
pub struct ProcessHandle {
    id: InstanceId,
    port: u16,
    child: Child,
    started_at: Instant,
    started_at_wall: SystemTime,
    killed: bool,
}

impl ProcessHandle {
    /// Wrap a freshly spawned child bound to `port`
    pub fn new(port: u16, child: Child) -> Self {
        Self {
            id: InstanceId::new(),
            port,
            child,
            started_at: Instant::now(),
            started_at_wall: SystemTime::now(),
            killed: false,
        }
    }

    /// Get the instance ID
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Get the bound port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the OS process id
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// When the process was started
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Wall-clock start time, for reporting
    pub fn started_at_wall(&self) -> SystemTime {
        self.started_at_wall
    }

    /// Time since the process was started
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The exit status if the process has already exited, without blocking
    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        match self.child.try_status() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(instance_id = %self.id, error = %e, "Failed to query process status");
                None
            }
        }
    }

    /// Terminate the process.
    ///
    /// Best-effort: failures are logged and swallowed because the handle is
    /// being discarded either way. The exit is awaited for a bounded time so
    /// the process does not linger as a zombie.
    pub async fn kill(&mut self) {
        self.killed = true;

        if let Err(e) = self.child.kill() {
            tracing::warn!(
                instance_id = %self.id,
                port = self.port,
                error = %e,
                "Failed to kill editor process"
            );
            return;
        }

        match tokio::time::timeout(REAP_TIMEOUT, self.child.status()).await {
            Ok(Ok(status)) => {
                tracing::info!(
                    instance_id = %self.id,
                    port = self.port,
                    status = %status,
                    uptime = ?self.uptime(),
                    "Editor process terminated"
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(instance_id = %self.id, error = %e, "Failed to reap editor process");
            }
            Err(_) => {
                tracing::warn!(instance_id = %self.id, "Editor process did not exit after kill");
            }
        }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.id)
            .field("port", &self.port)
            .field("pid", &self.child.id())
            .field("uptime", &self.uptime())
            .finish()
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if self.killed {
            return;
        }
        match self.child.kill() {
            Ok(()) => {
                tracing::info!(instance_id = %self.id, port = self.port, "Killed editor process on drop");
            }
            Err(e) => {
                tracing::warn!(instance_id = %self.id, error = %e, "Failed to kill editor process on drop");
            }
        }
    }
}
