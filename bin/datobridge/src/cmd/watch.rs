//! Watch command - keep a snapshot file in sync with the CMS

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use color_eyre::eyre::{Result, WrapErr};
use datobridge_core::Config;
use datobridge_loader::RepositoryHandle;
use tokio::runtime::{Handle, RuntimeFlavor};

use super::fetch::write_snapshot;
use crate::integration::{BuildHost, Integration, RunMode};

/// Build host that rewrites the snapshot file on every change.
struct SnapshotHost {
    repository: RepositoryHandle,
    path: PathBuf,
    pretty: bool,
}

impl BuildHost for SnapshotHost {
    fn rebuild_resource_list(&self, group: &str) {
        let snapshot = self.repository.snapshot();
        let write = || write_snapshot(&snapshot, &self.path, self.pretty);
        // Called from a runtime worker; file I/O must not stall it.
        let written = match Handle::try_current().map(|h| h.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(write),
            _ => write(),
        };
        match written {
            Ok(()) => println!(
                "  ↻ {group}: {} records written to {}",
                snapshot.len(),
                self.path.display()
            ),
            Err(e) => tracing::warn!(error = %e, path = ?self.path, "failed to rewrite snapshot"),
        }
    }
}

/// Run the watch command.
///
/// Loads content, writes the snapshot, then polls the CMS until Ctrl+C.
pub async fn run(config_path: &Path, output: Option<&Path>) -> Result<()> {
    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    let output = output.unwrap_or(&config.output.snapshot).to_path_buf();

    tracing::info!(?config_path, ?output, "Starting watch mode");

    let mut integration = Integration::new(&config.cms).wrap_err("Failed to set up CMS client")?;
    integration
        .load()
        .await
        .wrap_err("Failed to load content")?;

    let host = SnapshotHost {
        repository: integration.repository(),
        path: output.clone(),
        pretty: config.output.pretty,
    };
    host.rebuild_resource_list(&config.cms.resource_group);

    let watching = integration
        .activate(RunMode::Serve, Arc::new(host))
        .wrap_err("Failed to start watching")?;
    if !watching {
        println!("Live reload is disabled (cms.live_reload = false), exiting.");
        return Ok(());
    }

    println!();
    println!(
        "  Watching for content changes every {}s",
        config.cms.poll_interval_secs
    );
    println!("  Press Ctrl+C to stop");
    println!();

    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for Ctrl+C")?;

    if let Some(stats) = integration.shutdown().await {
        println!();
        println!("Stopped after {} checks, {} changes", stats.ticks, stats.changes);
    }

    Ok(())
}
