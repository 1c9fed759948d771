use editor_supervisor::{EditorConfig, EditorSupervisor};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG=editor_supervisor=debug` shows probes and spawns.
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let folders: Vec<String> = std::env::args().skip(1).collect();
    if folders.is_empty() {
        anyhow::bail!("usage: open_folder <folder> [<folder>...]");
    }

    let config = EditorConfig::from_env()?;
    tracing::info!(executable = %config.executable_path, "Starting open_folder demo");
    let supervisor = EditorSupervisor::new(config)?;

    for folder in &folders {
        match supervisor.ensure_running(folder).await {
            Ok(url) => println!("{} -> {}", folder, url),
            Err(e) => println!("{} -> failed: {}", folder, e),
        }
    }

    if let Some(status) = supervisor.status().await {
        println!(
            "editor {} (pid {}) on port {}, up {:?}",
            status.id, status.pid, status.port, status.uptime
        );
    }

    println!("Press Ctrl-C to stop the editor");
    tokio::signal::ctrl_c().await?;

    supervisor.shutdown().await;
    for event in supervisor.events(None) {
        println!("{:?} port={} {}", event.kind, event.port, event.details.unwrap_or_default());
    }
    Ok(())
}
