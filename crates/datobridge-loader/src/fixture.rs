//! In-memory content API for tests and offline demos.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use datobridge_core::{ContentItem, ContentVersion, Fingerprint, SiteMetadata};

use crate::api::{ApiError, ContentApi, Result};

/// Fixture API holding published records and draft overrides.
///
/// Every mutation bumps a revision counter, exposed as the fingerprint
/// `rev-<n>`. Clones share state, so a test can keep a handle and mutate
/// content while a loader polls it.
#[derive(Clone, Default)]
pub struct FixtureContentApi {
    state: Arc<Mutex<FixtureState>>,
}

#[derive(Default)]
struct FixtureState {
    site: SiteMetadata,
    published: Vec<ContentItem>,
    drafts: Vec<ContentItem>,
    revision: u64,
    failing_fingerprints: usize,
    failing_loads: usize,
    calls: FixtureCalls,
}

/// How many times each endpoint was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixtureCalls {
    pub fingerprint: usize,
    pub site: usize,
    pub items: usize,
}

fn upsert(items: &mut Vec<ContentItem>, item: ContentItem) {
    match items.iter_mut().find(|i| i.id == item.id) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl FixtureContentApi {
    /// Fixture serving `site` and no records.
    #[must_use]
    pub fn new(site: SiteMetadata) -> Self {
        let api = Self::default();
        api.lock().site = site;
        api
    }

    fn lock(&self) -> MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builder-style: add a published record.
    #[must_use]
    pub fn with_item(self, item: ContentItem) -> Self {
        upsert(&mut self.lock().published, item);
        self
    }

    /// Builder-style: add a draft version, visible only in preview.
    #[must_use]
    pub fn with_draft(self, item: ContentItem) -> Self {
        upsert(&mut self.lock().drafts, item);
        self
    }

    /// Publish a record (replacing any previous version) and drop its draft.
    pub fn publish(&self, item: ContentItem) {
        let mut state = self.lock();
        state.drafts.retain(|d| d.id != item.id);
        upsert(&mut state.published, item);
        state.revision += 1;
    }

    /// Save a draft without publishing it.
    pub fn save_draft(&self, item: ContentItem) {
        let mut state = self.lock();
        upsert(&mut state.drafts, item);
        state.revision += 1;
    }

    /// Delete a record in every version.
    pub fn remove(&self, id: &str) {
        let mut state = self.lock();
        state.published.retain(|i| i.id != id);
        state.drafts.retain(|i| i.id != id);
        state.revision += 1;
    }

    /// Replace the site metadata.
    pub fn set_site(&self, site: SiteMetadata) {
        let mut state = self.lock();
        state.site = site;
        state.revision += 1;
    }

    /// Make the next `count` fingerprint calls fail.
    pub fn fail_next_fingerprints(&self, count: usize) {
        self.lock().failing_fingerprints = count;
    }

    /// Make the next `count` item listings fail.
    pub fn fail_next_loads(&self, count: usize) {
        self.lock().failing_loads = count;
    }

    /// Current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Endpoint call counters.
    #[must_use]
    pub fn calls(&self) -> FixtureCalls {
        self.lock().calls
    }
}

#[async_trait]
impl ContentApi for FixtureContentApi {
    async fn fetch_fingerprint(&self, _version: ContentVersion) -> Result<Fingerprint> {
        let mut state = self.lock();
        state.calls.fingerprint += 1;
        if state.failing_fingerprints > 0 {
            state.failing_fingerprints -= 1;
            return Err(ApiError::Unavailable("simulated network failure".into()));
        }
        Ok(Fingerprint::new(format!("rev-{}", state.revision)))
    }

    async fn fetch_site(&self) -> Result<SiteMetadata> {
        let mut state = self.lock();
        state.calls.site += 1;
        Ok(state.site.clone())
    }

    async fn fetch_items(&self, version: ContentVersion) -> Result<Vec<ContentItem>> {
        let mut state = self.lock();
        state.calls.items += 1;
        if state.failing_loads > 0 {
            state.failing_loads -= 1;
            return Err(ApiError::Unavailable("simulated network failure".into()));
        }

        let mut items = state.published.clone();
        if version == ContentVersion::Current {
            for draft in &state.drafts {
                upsert(&mut items, draft.clone());
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, title: &str) -> ContentItem {
        ContentItem::new(id, "post").with_field("title", title)
    }

    #[tokio::test]
    async fn test_drafts_only_in_current_version() {
        let api = FixtureContentApi::new(SiteMetadata::default())
            .with_item(post("1", "Published"))
            .with_draft(post("1", "Draft"))
            .with_draft(post("2", "Draft only"));

        let published = api.fetch_items(ContentVersion::Published).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title(), Some("Published"));

        let current = api.fetch_items(ContentVersion::Current).await.unwrap();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].title(), Some("Draft"));
    }

    #[tokio::test]
    async fn test_mutations_bump_fingerprint() {
        let api = FixtureContentApi::new(SiteMetadata::default());
        let before = api.fetch_fingerprint(ContentVersion::Published).await.unwrap();

        api.publish(post("1", "New"));
        let after = api.fetch_fingerprint(ContentVersion::Published).await.unwrap();

        assert_eq!(before.as_str(), "rev-0");
        assert_eq!(after.as_str(), "rev-1");
        assert_eq!(api.calls().fingerprint, 2);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let api = FixtureContentApi::new(SiteMetadata::default());
        api.fail_next_fingerprints(1);

        assert!(api.fetch_fingerprint(ContentVersion::Published).await.is_err());
        assert!(api.fetch_fingerprint(ContentVersion::Published).await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let api = FixtureContentApi::new(SiteMetadata::default());
        let handle = api.clone();

        handle.publish(post("1", "Shared"));
        assert_eq!(api.revision(), 1);
        assert_eq!(api.fetch_items(ContentVersion::Published).await.unwrap().len(), 1);
    }
}
