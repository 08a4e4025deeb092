//! Fetch command - one-shot load into a snapshot file

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use datobridge_core::{Config, ContentRepository};

use crate::integration::Integration;

/// Run the fetch command.
///
/// Loads all content once and writes the repository snapshot as JSON.
pub async fn run(config_path: &Path, output: Option<&Path>, preview: bool) -> Result<()> {
    let mut config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    if preview {
        config.cms.preview = true;
    }
    let output = output.unwrap_or(&config.output.snapshot).to_path_buf();

    tracing::info!(?config_path, ?output, preview = config.cms.preview, "Fetching content");

    let integration = Integration::new(&config.cms).wrap_err("Failed to set up CMS client")?;
    integration
        .load()
        .await
        .wrap_err("Failed to load content")?;

    let snapshot = integration.repository().snapshot();
    write_snapshot(&snapshot, &output, config.output.pretty)?;

    println!(
        "✓ Wrote {} records ({} models) to {}",
        snapshot.len(),
        snapshot.item_types().len(),
        output.display()
    );

    Ok(())
}

/// Serialize `repository` to `path`, creating parent directories.
pub fn write_snapshot(repository: &ContentRepository, path: &Path, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = if pretty {
        serde_json::to_string_pretty(repository)?
    } else {
        serde_json::to_string(repository)?
    };
    std::fs::write(path, json).wrap_err_with(|| format!("Failed to write {}", path.display()))?;

    tracing::debug!(?path, records = repository.len(), "snapshot written");
    Ok(())
}
