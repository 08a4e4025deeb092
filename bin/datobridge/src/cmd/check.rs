//! Check command - validate configuration and credentials offline

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use datobridge_core::{CmsConfig, Config, CredentialChain};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Never contacts the CMS.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    if !config_path.exists() {
        result.add_warning(format!(
            "{} not found, using defaults",
            config_path.display()
        ));
    }
    let config = match Config::load_with_env(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            Some(c)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
            None
        }
    };

    if let Some(ref cfg) = config {
        println!("\nChecking credentials...");
        check_credential(&cfg.cms, &mut result);

        println!("\nChecking configuration values...");
        check_cms_values(&cfg.cms, &mut result);
    }

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

fn check_credential(cms: &CmsConfig, result: &mut ValidationResult) {
    let chain = CredentialChain::from_config(cms);
    match chain.resolve() {
        Ok(_) => println!("  ✓ API token found"),
        Err(e) => {
            println!("  ✗ {e}");
            result.add_error(e.to_string());
        }
    }
}

fn check_cms_values(cms: &CmsConfig, result: &mut ValidationResult) {
    for name in cms.deprecated_options() {
        result.add_warning(format!("cms.{name} is deprecated and ignored"));
    }

    if cms.token.is_some() {
        result.add_warning(format!(
            "cms.token is set in the config file; prefer ${} or {}",
            cms.token_env_var,
            cms.env_file.display()
        ));
    }

    if cms.preview && !cms.live_reload {
        result.add_warning("cms.preview is on but live reload is off; drafts will not refresh");
    }

    if cms.poll_interval_secs < 2 {
        result.add_warning(format!(
            "cms.poll_interval_secs = {} may hit API rate limits",
            cms.poll_interval_secs
        ));
    }
}
