//! Content loading.
//!
//! [`Loader`] owns a [`ContentApi`], performs full loads into an in-memory
//! [`ContentRepository`] and runs the two-phase change check used by the
//! watch loop: a cheap fingerprint fetch, then a full reload only when the
//! fingerprint moved.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use datobridge_core::{ContentRepository, ContentVersion, CoreError, Fingerprint};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::api::{ApiError, ContentApi};

/// Full load errors.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The API call failed.
    #[error("failed to fetch content: {0}")]
    Api(#[from] ApiError),

    /// The API returned records that do not form a valid repository.
    #[error("invalid content: {0}")]
    Repository(#[from] CoreError),
}

/// Errors of a single watch tick. Never fatal to the loop.
#[derive(Debug, Error)]
pub enum PollError {
    /// The change marker could not be fetched.
    #[error("change check failed: {0}")]
    Fingerprint(#[source] ApiError),

    /// Content changed but the reload failed.
    #[error("reload failed: {0}")]
    Reload(#[source] LoadError),
}

/// Result of one change check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Fingerprint unchanged; nothing fetched.
    Unchanged,
    /// Content changed and a new snapshot was published.
    Reloaded,
}

/// Read-only view of the current repository snapshot.
#[derive(Debug, Clone)]
pub struct RepositoryHandle {
    rx: watch::Receiver<Arc<ContentRepository>>,
}

impl RepositoryHandle {
    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ContentRepository> {
        self.rx.borrow().clone()
    }

    /// Wait until a newer snapshot is published.
    ///
    /// Returns `false` once the loader is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

pub(crate) struct LoaderInner {
    api: Arc<dyn ContentApi>,
    version: ContentVersion,
    snapshot: watch::Sender<Arc<ContentRepository>>,
    fingerprint: Mutex<Option<Fingerprint>>,
    pub(crate) watching: AtomicBool,
}

/// Loads CMS content and keeps the published snapshot.
///
/// Cloning is cheap; clones share the snapshot and the watch state.
#[derive(Clone)]
pub struct Loader {
    pub(crate) inner: Arc<LoaderInner>,
}

impl Loader {
    /// Create a loader. `preview` selects draft content for every fetch and
    /// cannot change afterwards.
    pub fn new(api: Arc<dyn ContentApi>, preview: bool) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(ContentRepository::default()));
        Self {
            inner: Arc::new(LoaderInner {
                api,
                version: ContentVersion::from_preview(preview),
                snapshot,
                fingerprint: Mutex::new(None),
                watching: AtomicBool::new(false),
            }),
        }
    }

    /// Whether draft content is requested.
    #[must_use]
    pub fn preview(&self) -> bool {
        self.inner.version == ContentVersion::Current
    }

    /// Content version requested from the API.
    #[must_use]
    pub fn version(&self) -> ContentVersion {
        self.inner.version
    }

    /// Read accessor for templates and hosts.
    #[must_use]
    pub fn repository(&self) -> RepositoryHandle {
        RepositoryHandle {
            rx: self.inner.snapshot.subscribe(),
        }
    }

    /// Fingerprint of the last successful load.
    #[must_use]
    pub fn last_fingerprint(&self) -> Option<Fingerprint> {
        self.inner
            .fingerprint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch everything and publish a fresh snapshot.
    ///
    /// The fingerprint is read first so a change racing with the load is
    /// picked up by the next poll. On error the previous snapshot stays.
    pub async fn load(&self) -> Result<Arc<ContentRepository>, LoadError> {
        let start = Instant::now();
        let api = &self.inner.api;
        let version = self.inner.version;

        let (fingerprint, site) = api.fetch_site_with_fingerprint(version).await?;
        let items = api.fetch_items(version).await?;
        let repository = Arc::new(ContentRepository::from_parts(site, items)?);

        self.inner.snapshot.send_replace(repository.clone());
        *self
            .inner
            .fingerprint
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(fingerprint.clone());

        info!(
            items = repository.len(),
            version = version.as_str(),
            %fingerprint,
            duration_ms = start.elapsed().as_millis() as u64,
            "content loaded"
        );

        Ok(repository)
    }

    /// One change check: fetch the fingerprint, reload if it moved.
    ///
    /// Without a previous load there is nothing to compare to, so the check
    /// always reloads. A failed reload keeps the old fingerprint and the next
    /// check retries.
    pub async fn poll(&self) -> Result<PollOutcome, PollError> {
        let latest = self
            .inner
            .api
            .fetch_fingerprint(self.inner.version)
            .await
            .map_err(PollError::Fingerprint)?;

        if self.last_fingerprint().as_ref() == Some(&latest) {
            debug!(fingerprint = %latest, "content unchanged");
            return Ok(PollOutcome::Unchanged);
        }

        debug!(fingerprint = %latest, "content changed, reloading");
        self.load().await.map_err(PollError::Reload)?;
        Ok(PollOutcome::Reloaded)
    }

    /// Whether a watch loop is running for this loader.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.inner.watching.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("version", &self.inner.version)
            .field("fingerprint", &self.last_fingerprint())
            .field("watching", &self.is_watching())
            .finish()
    }
}
