//! Content types and the in-memory repository.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Which version of every record to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentVersion {
    /// The published snapshot.
    #[default]
    Published,
    /// The latest version, including unpublished drafts.
    Current,
}

impl ContentVersion {
    /// Pick the version matching a preview flag.
    #[must_use]
    pub fn from_preview(preview: bool) -> Self {
        if preview { Self::Current } else { Self::Published }
    }

    /// Query parameter value understood by the API.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Current => "current",
        }
    }
}

/// Cheap marker compared between polls to decide whether to reload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Publication status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Never published.
    Draft,
    /// Published with unpublished changes on top.
    Updated,
    /// Published and unchanged.
    Published,
}

/// Record bookkeeping returned alongside the fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMeta {
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// First publication time.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Publication status.
    #[serde(default)]
    pub status: Option<ItemStatus>,
}

/// An image or upload reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Public URL.
    pub url: String,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub alt: Option<String>,

    /// File format, e.g. `png`.
    #[serde(default)]
    pub format: Option<String>,
}

/// SEO settings attached to a record or used as site fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoSettings {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub image: Option<Image>,

    /// `summary` or `summary_large_image`.
    #[serde(default)]
    pub twitter_card: Option<String>,

    #[serde(default)]
    pub no_index: Option<bool>,
}

/// Site-wide SEO settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSeo {
    #[serde(default)]
    pub site_name: Option<String>,

    /// Appended to page titles when it fits.
    #[serde(default)]
    pub title_suffix: Option<String>,

    /// Twitter handle, e.g. `@example`.
    #[serde(default)]
    pub twitter_account: Option<String>,

    #[serde(default)]
    pub facebook_page_url: Option<String>,

    /// Used when a record has no SEO settings of its own.
    #[serde(default)]
    pub fallback_seo: Option<SeoSettings>,
}

/// Site-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteMetadata {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Content locales, first one is the default.
    #[serde(default)]
    pub locales: Vec<String>,

    /// Hide the whole site from search engines.
    #[serde(default)]
    pub no_index: bool,

    #[serde(default)]
    pub favicon: Option<Image>,

    #[serde(default)]
    pub global_seo: Option<GlobalSeo>,

    /// Changes on every content update; used as the change fingerprint.
    #[serde(default)]
    pub last_data_change_at: Option<String>,
}

/// A single CMS record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable record identifier.
    pub id: String,

    /// Model api key (or model id when the key is unknown).
    pub item_type: String,

    /// Field values, opaque to this crate.
    #[serde(default)]
    pub fields: Map<String, Value>,

    #[serde(default)]
    pub meta: ItemMeta,
}

impl ContentItem {
    /// Create an item without fields.
    pub fn new(id: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_type: item_type.into(),
            fields: Map::new(),
            meta: ItemMeta::default(),
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Raw field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field value when it is a non-empty string.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Display title: the `title` field, else `name`.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.str_field("title").or_else(|| self.str_field("name"))
    }

    /// SEO settings stored in the `seo` field, if any.
    #[must_use]
    pub fn seo(&self) -> Option<SeoSettings> {
        let value = self.field("seo")?;
        if value.is_null() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::invalid_item(&self.id, "empty id"));
        }
        if self.item_type.trim().is_empty() {
            return Err(CoreError::invalid_item(&self.id, "missing item type"));
        }
        Ok(())
    }
}

/// Snapshot of every fetched record plus site metadata.
///
/// Only [`ContentRepository::from_parts`] builds a populated repository, so a
/// published snapshot never holds partial records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRepository {
    site: SiteMetadata,
    items: BTreeMap<String, ContentItem>,
}

impl ContentRepository {
    /// Build a repository, rejecting invalid and duplicate records.
    pub fn from_parts(
        site: SiteMetadata,
        items: impl IntoIterator<Item = ContentItem>,
    ) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for item in items {
            item.validate()?;
            if by_id.contains_key(&item.id) {
                return Err(CoreError::DuplicateItem(item.id));
            }
            by_id.insert(item.id.clone(), item);
        }
        Ok(Self { site, items: by_id })
    }

    /// Site metadata.
    #[must_use]
    pub fn site(&self) -> &SiteMetadata {
        &self.site
    }

    /// Look up one item.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ContentItem> {
        self.items.get(id)
    }

    /// All items ordered by id.
    pub fn items(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct model api keys present in the repository.
    #[must_use]
    pub fn item_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.items.values().map(|i| i.item_type.as_str()).collect();
        types.sort_unstable();
        types.dedup();
        types
    }

    /// Every item of one model.
    #[must_use]
    pub fn collection(&self, item_type: &str) -> Vec<&ContentItem> {
        self.items
            .values()
            .filter(|i| i.item_type == item_type)
            .collect()
    }

    /// The item of a singleton model.
    #[must_use]
    pub fn single(&self, item_type: &str) -> Option<&ContentItem> {
        self.items.values().find(|i| i.item_type == item_type)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn article(id: &str, title: &str) -> ContentItem {
        ContentItem::new(id, "article").with_field("title", title)
    }

    #[test]
    fn test_content_version_from_preview() {
        assert_eq!(ContentVersion::from_preview(true), ContentVersion::Current);
        assert_eq!(ContentVersion::from_preview(false), ContentVersion::Published);
        assert_eq!(ContentVersion::Current.as_str(), "current");
        assert_eq!(ContentVersion::Published.as_str(), "published");
    }

    #[test]
    fn test_item_accessors() {
        let item = ContentItem::new("1", "author")
            .with_field("name", "Ada")
            .with_field("title", "  ")
            .with_field("age", 36);

        assert_eq!(item.title(), Some("Ada"));
        assert_eq!(item.str_field("age"), None);
        assert_eq!(item.field("age"), Some(&json!(36)));
        assert!(item.seo().is_none());
    }

    #[test]
    fn test_item_seo_field() {
        let item = ContentItem::new("1", "article").with_field(
            "seo",
            json!({ "title": "SEO title", "twitter_card": "summary_large_image" }),
        );

        let seo = item.seo().unwrap();
        assert_eq!(seo.title.as_deref(), Some("SEO title"));
        assert_eq!(seo.twitter_card.as_deref(), Some("summary_large_image"));
        assert!(seo.description.is_none());
    }

    #[test]
    fn test_repository_from_parts() {
        let repo = ContentRepository::from_parts(
            SiteMetadata::default(),
            vec![
                article("2", "Second"),
                article("1", "First"),
                ContentItem::new("3", "home"),
            ],
        )
        .unwrap();

        assert_eq!(repo.len(), 3);
        assert_eq!(repo.get("1").and_then(ContentItem::title), Some("First"));
        let ids: Vec<_> = repo.items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(repo.item_types(), vec!["article", "home"]);
        assert_eq!(repo.collection("article").len(), 2);
        assert_eq!(repo.single("home").map(|i| i.id.as_str()), Some("3"));
        assert!(repo.single("missing").is_none());
    }

    #[test]
    fn test_repository_rejects_duplicates() {
        let result = ContentRepository::from_parts(
            SiteMetadata::default(),
            vec![article("1", "a"), article("1", "b")],
        );
        assert!(matches!(result, Err(CoreError::DuplicateItem(id)) if id == "1"));
    }

    #[test]
    fn test_repository_rejects_partial_items() {
        let result =
            ContentRepository::from_parts(SiteMetadata::default(), vec![ContentItem::new("1", "")]);
        assert!(matches!(result, Err(CoreError::InvalidItem { .. })));

        let result =
            ContentRepository::from_parts(SiteMetadata::default(), vec![ContentItem::new("", "x")]);
        assert!(matches!(result, Err(CoreError::InvalidItem { .. })));
    }

    #[test]
    fn test_repository_default_is_empty() {
        let repo = ContentRepository::default();
        assert!(repo.is_empty());
        assert!(repo.item_types().is_empty());
    }

    #[test]
    fn test_repository_serializes() {
        let repo =
            ContentRepository::from_parts(SiteMetadata::default(), vec![article("1", "First")])
                .unwrap();
        let json = serde_json::to_value(&repo).unwrap();
        assert_eq!(json["items"]["1"]["fields"]["title"], "First");
    }
}
