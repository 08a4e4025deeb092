//! datobridge CLI Library
//!
//! Glue between the content loader and a static site build host, plus the
//! command implementations behind the `datobridge` binary.
//!
//! # Modules
//!
//! - [`integration`] - Build host shim: credential check, load, live reload
//! - [`cmd`] - Command implementations (fetch, watch, check, tags)
//!
//! # Example
//!
//! ```no_run
//! use datobridge::{Integration, RunMode};
//! use datobridge_core::Config;
//!
//! # async fn demo() -> color_eyre::eyre::Result<()> {
//! let config = Config::load_with_env(std::path::Path::new("datobridge.toml"))?;
//! let mut integration = Integration::new(&config.cms)?;
//! integration.load().await?;
//! println!("{} records", integration.repository().snapshot().len());
//! # Ok(())
//! # }
//! ```

pub mod cmd;
pub mod integration;

pub use datobridge_core::{CmsConfig, Config, ContentRepository};
pub use datobridge_loader::{Loader, RepositoryHandle};
pub use integration::{BuildHost, Integration, IntegrationError, RunMode};

/// Initialize tracing with the specified verbosity level.
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(verbose > 1))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
