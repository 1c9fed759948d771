/*!
 # Editor Supervisor

 Runs one browser-based code editor (code-server) on demand and shares it
 across every "open in editor" request of a host application.

 ## Overview

 The supervisor provides functionality to:
 - Spawn the editor lazily on the first request
 - Reuse the same instance for every folder, selecting the folder through the URL
 - Probe the instance for liveness before handing it out
 - Kill and respawn a dead instance, once per request
 - Terminate the instance when the host shuts down

 ## Basic Usage

 ```no_run
 use editor_supervisor::{EditorConfig, EditorSupervisor, Result};

 #[tokio::main]
 async fn main() -> Result<()> {
     // Resolve CODE_SERVER_* settings, falling back to defaults
     let config = EditorConfig::from_env()?;

     // Build once and share clones with every request handler
     let supervisor = EditorSupervisor::new(config)?;

     // Spawns on first use
     let url = supervisor.ensure_running("/work/proj1").await?;
     println!("Open {}", url);

     // Same instance, different folder
     let url = supervisor.ensure_running("/work/proj2").await?;
     println!("Open {}", url);

     // Host teardown
     supervisor.shutdown().await;
     Ok(())
 }
 ```

 ## Features

 - **Single instance**: One lock serializes callers, so concurrent requests never spawn twice
 - **Health probing**: Bounded TCP connect check on every request
 - **Respawn**: A dead instance is replaced within the same call
 - **Guaranteed cleanup**: Explicit shutdown, and process termination on drop
 - **Diagnostics**: Instance status and a bounded lifecycle event history
*/

pub mod access;
pub mod config;
pub mod error;
pub mod server;
pub mod supervisor;

pub use access::AccessUrl;
pub use config::EditorConfig;
pub use error::{Error, Result};
pub use server::{InstanceEvent, InstanceEventKind, InstanceId};
pub use supervisor::{EditorSupervisor, InstanceStatus};
