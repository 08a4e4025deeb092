//! Tags command - print head tags for a record

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};
use datobridge_core::Config;

use crate::integration::Integration;

/// Run the tags command.
pub async fn run(
    config_path: &Path,
    item_id: &str,
    favicon: bool,
    theme_color: Option<&str>,
) -> Result<()> {
    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    let integration = Integration::new(&config.cms).wrap_err("Failed to set up CMS client")?;
    integration
        .load()
        .await
        .wrap_err("Failed to load content")?;

    let snapshot = integration.repository().snapshot();
    let item = snapshot
        .get(item_id)
        .ok_or_else(|| eyre!("No record with id {item_id}"))?;

    println!("{}", integration.meta_tags(item));

    if favicon {
        let color = theme_color.or(config.output.theme_color.as_deref());
        println!("{}", integration.favicon_meta_tags(color));
    }

    Ok(())
}
