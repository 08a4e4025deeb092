//! HTTP client for the CMS content API.
//!
//! Speaks the JSON:API dialect of the DatoCMS site API: `GET /site`,
//! `GET /item-types` and paginated `GET /items`.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use datobridge_core::{
    CmsConfig, ContentItem, ContentVersion, Credential, Fingerprint, ItemMeta, SiteMetadata,
};
use reqwest::{
    StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::{ApiError, ContentApi, Result};

/// Items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Value sent in the `X-SSG` header.
pub const SSG_NAME: &str = "datobridge";

/// Connection options for [`HttpContentApi`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API base URL without trailing slash.
    pub base_url: String,

    /// Content environment, sent as `X-Environment`.
    pub environment: Option<String>,

    /// Page size for item listing.
    pub page_size: usize,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Additional headers sent with every request.
    pub extra_headers: Vec<(String, String)>,
}

impl ClientOptions {
    /// Options pointing at `base_url` with defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            environment: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(30),
            extra_headers: vec![
                ("X-Reason".to_string(), "dump".to_string()),
                ("X-SSG".to_string(), SSG_NAME.to_string()),
            ],
        }
    }

    /// Set the content environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Option<String>) -> Self {
        self.environment = environment.filter(|e| !e.trim().is_empty());
        self
    }

    /// Set the page size used for item listing.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

impl From<&CmsConfig> for ClientOptions {
    fn from(cms: &CmsConfig) -> Self {
        Self::new(&cms.api_base_url).with_environment(cms.environment.clone())
    }
}

/// [`ContentApi`] backed by the CMS HTTP API.
#[derive(Debug, Clone)]
pub struct HttpContentApi {
    client: reqwest::Client,
    base_url: String,
    page_size: usize,
}

impl HttpContentApi {
    /// Build a client authenticated with `credential`.
    pub fn new(credential: &Credential, options: ClientOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|_| ApiError::Unavailable("API token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-api-version", HeaderValue::from_static("3"));

        if let Some(environment) = &options.environment {
            headers.insert("x-environment", header_value(environment)?);
        }

        for (name, value) in &options.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::Unavailable(format!("invalid header name {name:?}")))?;
            headers.insert(name, header_value(value)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: options.base_url,
            page_size: options.page_size,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.client.get(self.url(path)).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(format!("{path}: {e}")))
    }

    /// Map of model id to model api key.
    async fn fetch_item_types(&self) -> Result<HashMap<String, String>> {
        let doc: Document<Vec<Resource<ItemTypeAttributes>>> =
            self.get_json("item-types", &[]).await?;

        Ok(doc
            .data
            .into_iter()
            .map(|r| (r.id, r.attributes.api_key))
            .collect())
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ApiError::Unavailable(format!("invalid header value {value:?}")))
}

/// The site marker moves on any record change, drafts included.
fn site_fingerprint(site: &SiteMetadata) -> Result<Fingerprint> {
    site.last_data_change_at
        .clone()
        .map(Fingerprint::new)
        .ok_or_else(|| ApiError::decode("site is missing last_data_change_at"))
}

/// Unresolved uploads arrive as bare ids; only expanded image objects are kept.
fn drop_upload_refs(value: &mut Value) {
    if let Value::Object(map) = value {
        map.retain(|key, v| !((key == "favicon" || key == "image") && !v.is_object()));
        for v in map.values_mut() {
            drop_upload_refs(v);
        }
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn fetch_fingerprint(&self, _version: ContentVersion) -> Result<Fingerprint> {
        let site = self.fetch_site().await?;
        site_fingerprint(&site)
    }

    async fn fetch_site(&self) -> Result<SiteMetadata> {
        let doc: Document<Resource<Value>> = self.get_json("site", &[]).await?;
        let mut attributes = doc.data.attributes;
        drop_upload_refs(&mut attributes);

        let mut site: SiteMetadata =
            serde_json::from_value(attributes).map_err(|e| ApiError::decode(format!("site: {e}")))?;
        site.id = doc.data.id;
        Ok(site)
    }

    async fn fetch_site_with_fingerprint(
        &self,
        _version: ContentVersion,
    ) -> Result<(Fingerprint, SiteMetadata)> {
        let site = self.fetch_site().await?;
        Ok((site_fingerprint(&site)?, site))
    }

    async fn fetch_items(&self, version: ContentVersion) -> Result<Vec<ContentItem>> {
        let item_types = self.fetch_item_types().await?;
        let mut items = Vec::new();
        let mut offset = 0usize;

        loop {
            let query = [
                ("version", version.as_str().to_string()),
                ("page[offset]", offset.to_string()),
                ("page[limit]", self.page_size.to_string()),
            ];
            let doc: Document<Vec<Resource<Map<String, Value>>>> =
                self.get_json("items", &query).await?;

            let total = doc.meta.map(|m| m.total_count);
            let fetched = doc.data.len();
            items.extend(doc.data.into_iter().map(|r| r.into_item(&item_types)));
            offset += fetched;

            debug!(offset, ?total, version = version.as_str(), "fetched items page");

            let done = match total {
                Some(total) => offset >= total,
                None => fetched < self.page_size,
            };
            if fetched == 0 || done {
                break;
            }
        }

        Ok(items)
    }
}

/// JSON:API top-level document.
#[derive(Debug, Deserialize)]
struct Document<T> {
    data: T,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    total_count: usize,
}

#[derive(Debug, Deserialize)]
struct Resource<A> {
    id: String,
    attributes: A,
    #[serde(default)]
    relationships: Relationships,
    #[serde(default)]
    meta: ItemMeta,
}

#[derive(Debug, Default, Deserialize)]
struct Relationships {
    #[serde(default)]
    item_type: Option<Relationship>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    data: Option<ResourceRef>,
}

#[derive(Debug, Deserialize)]
struct ResourceRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ItemTypeAttributes {
    api_key: String,
}

impl Resource<Map<String, Value>> {
    fn into_item(self, item_types: &HashMap<String, String>) -> ContentItem {
        let item_type = self
            .relationships
            .item_type
            .and_then(|r| r.data)
            .map(|r| item_types.get(&r.id).cloned().unwrap_or(r.id))
            .unwrap_or_default();

        ContentItem {
            id: self.id,
            item_type,
            fields: self.attributes,
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_options_from_config() {
        let cms = CmsConfig {
            api_base_url: "https://cms.example.com/".to_string(),
            environment: Some("sandbox".to_string()),
            ..CmsConfig::default()
        };

        let options = ClientOptions::from(&cms);
        assert_eq!(options.base_url, "https://cms.example.com");
        assert_eq!(options.environment.as_deref(), Some("sandbox"));
        assert_eq!(options.page_size, DEFAULT_PAGE_SIZE);
        assert!(
            options
                .extra_headers
                .contains(&("X-SSG".to_string(), SSG_NAME.to_string()))
        );
    }

    #[test]
    fn test_blank_environment_ignored() {
        let options = ClientOptions::new("https://cms.example.com")
            .with_environment(Some("  ".to_string()))
            .with_page_size(0);
        assert!(options.environment.is_none());
        assert_eq!(options.page_size, 1);
    }

    #[test]
    fn test_url_join() {
        let api = HttpContentApi::new(
            &Credential::new("token"),
            ClientOptions::new("https://cms.example.com"),
        )
        .unwrap();
        assert_eq!(api.url("/items"), "https://cms.example.com/items");
        assert_eq!(api.url("site"), "https://cms.example.com/site");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = HttpContentApi::new(
            &Credential::new("bad\ntoken"),
            ClientOptions::new("https://cms.example.com"),
        );
        assert!(matches!(result, Err(ApiError::Unavailable(_))));
    }

    #[test]
    fn test_upload_ids_dropped_from_site() {
        let mut attributes = serde_json::json!({
            "name": "Example",
            "favicon": "4411",
            "global_seo": {
                "site_name": "Example",
                "fallback_seo": { "description": "d", "image": "4412" }
            }
        });
        drop_upload_refs(&mut attributes);

        let site: SiteMetadata = serde_json::from_value(attributes).unwrap();
        assert!(site.favicon.is_none());
        let fallback = site.global_seo.unwrap().fallback_seo.unwrap();
        assert!(fallback.image.is_none());
        assert_eq!(fallback.description.as_deref(), Some("d"));
    }

    #[test]
    fn test_resource_into_item_uses_api_key() {
        let resource: Resource<Map<String, Value>> = serde_json::from_value(serde_json::json!({
            "id": "12",
            "type": "item",
            "attributes": { "title": "Hello" },
            "relationships": { "item_type": { "data": { "id": "99", "type": "item_type" } } },
            "meta": { "status": "published" }
        }))
        .unwrap();

        let item_types = HashMap::from([("99".to_string(), "article".to_string())]);
        let item = resource.into_item(&item_types);
        assert_eq!(item.id, "12");
        assert_eq!(item.item_type, "article");
        assert_eq!(item.title(), Some("Hello"));
    }
}
