//! Build host integration.
//!
//! [`Integration`] is what a static site build wires in: it checks the
//! credential up front, performs the initial load, and in serve mode keeps
//! content fresh by asking the host to rebuild its resource list whenever the
//! CMS reports a change.

use std::sync::Arc;

use datobridge_core::{CmsConfig, ContentItem, CoreError, CredentialChain};
use datobridge_loader::{
    ApiError, ClientOptions, ContentApi, FaviconTagsBuilder, HttpContentApi, LoadError, Loader,
    RepositoryHandle, SeoTagsBuilder, WatchError, WatchSession, WatchStats, render_tags,
};
use thiserror::Error;
use tracing::{debug, info};

/// The site build tool hosting the integration.
pub trait BuildHost: Send + Sync {
    /// Invalidate derived resources tagged with `group` so pages re-render.
    fn rebuild_resource_list(&self, group: &str);
}

/// How the host is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One-shot build; content is loaded once.
    Build,
    /// Development server; content may live-reload.
    Serve,
}

/// Integration errors.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error(transparent)]
    Credential(CoreError),

    #[error("failed to create API client: {0}")]
    Client(#[from] ApiError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Loader plus live reload wiring for one site.
#[derive(Debug)]
pub struct Integration {
    cms: CmsConfig,
    loader: Loader,
    session: Option<WatchSession>,
}

impl Integration {
    /// Connect to the hosted API described by `cms`.
    ///
    /// The credential is resolved before any client is built, so a missing
    /// token fails here without touching the network.
    pub fn new(cms: &CmsConfig) -> Result<Self, IntegrationError> {
        let credential = CredentialChain::from_config(cms)
            .resolve()
            .map_err(IntegrationError::Credential)?;
        let api = HttpContentApi::new(&credential, ClientOptions::from(cms))?;
        Ok(Self::assemble(cms, Arc::new(api)))
    }

    /// Use a custom API. The credential is still required.
    pub fn with_api(cms: &CmsConfig, api: Arc<dyn ContentApi>) -> Result<Self, IntegrationError> {
        CredentialChain::from_config(cms)
            .resolve()
            .map_err(IntegrationError::Credential)?;
        Ok(Self::assemble(cms, api))
    }

    fn assemble(cms: &CmsConfig, api: Arc<dyn ContentApi>) -> Self {
        debug!(preview = cms.preview, live_reload = cms.live_reload, "integration ready");
        Self {
            cms: cms.clone(),
            loader: Loader::new(api, cms.preview),
            session: None,
        }
    }

    /// Initial full load.
    pub async fn load(&self) -> Result<(), IntegrationError> {
        self.loader.load().await?;
        Ok(())
    }

    /// Hook into the host after the initial load.
    ///
    /// Starts watching only when live reload is enabled and the host is
    /// serving. Returns whether a watch loop is running.
    pub fn activate(
        &mut self,
        mode: RunMode,
        host: Arc<dyn BuildHost>,
    ) -> Result<bool, IntegrationError> {
        if mode != RunMode::Serve || !self.cms.live_reload {
            debug!(?mode, live_reload = self.cms.live_reload, "live reload disabled");
            return Ok(false);
        }
        if self.session.is_some() {
            return Ok(true);
        }

        let group = self.cms.resource_group.clone();
        let session = self.loader.watch(self.cms.poll_interval(), move || {
            info!(group = %group, "content changed");
            host.rebuild_resource_list(&group);
        })?;
        self.session = Some(session);

        Ok(true)
    }

    #[must_use]
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Read accessor for templates.
    #[must_use]
    pub fn repository(&self) -> RepositoryHandle {
        self.loader.repository()
    }

    /// Rendered SEO tags for `item` against the current site metadata.
    #[must_use]
    pub fn meta_tags(&self, item: &ContentItem) -> String {
        let snapshot = self.loader.repository().snapshot();
        render_tags(&SeoTagsBuilder::new(item, snapshot.site()).meta_tags())
    }

    /// Rendered favicon tags for the current site.
    #[must_use]
    pub fn favicon_meta_tags(&self, theme_color: Option<&str>) -> String {
        let snapshot = self.loader.repository().snapshot();
        render_tags(&FaviconTagsBuilder::new(snapshot.site(), theme_color).meta_tags())
    }

    /// Stop live reload if running.
    pub async fn shutdown(&mut self) -> Option<WatchStats> {
        let session = self.session.take()?;
        let stats = session.stop().await;
        info!(
            ticks = stats.ticks,
            changes = stats.changes,
            failures = stats.failures,
            "live reload stopped"
        );
        Some(stats)
    }
}
