//! Content API abstraction.

use async_trait::async_trait;
use datobridge_core::{ContentItem, ContentVersion, Fingerprint, SiteMetadata};
use thiserror::Error;

/// Content API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or protocol failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token was rejected.
    #[error("unauthorized ({status}): check the site API token")]
    Unauthorized { status: u16 },

    /// Any other non-success response.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response did not have the expected shape.
    #[error("malformed API response: {0}")]
    Decode(String),

    /// The API could not be reached.
    #[error("API unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// Result type for API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Read access to a headless CMS.
///
/// Implementations must be cheap to share; the loader holds one behind an
/// `Arc` and calls it from the watch task.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Fetch the change marker. Cheap; called on every watch tick.
    async fn fetch_fingerprint(&self, version: ContentVersion) -> Result<Fingerprint>;

    /// Fetch site-level metadata.
    async fn fetch_site(&self) -> Result<SiteMetadata>;

    /// Fetch the change marker together with the site metadata.
    ///
    /// Used by full loads. Override when both come from the same request.
    async fn fetch_site_with_fingerprint(
        &self,
        version: ContentVersion,
    ) -> Result<(Fingerprint, SiteMetadata)> {
        let fingerprint = self.fetch_fingerprint(version).await?;
        let site = self.fetch_site().await?;
        Ok((fingerprint, site))
    }

    /// Fetch every record in the given version.
    async fn fetch_items(&self, version: ContentVersion) -> Result<Vec<ContentItem>>;
}
