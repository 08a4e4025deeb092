//! datobridge Loader Library
//!
//! Fetching CMS content, publishing snapshots and watching for changes.
//!
//! # Modules
//!
//! - [`api`] - The content API seam
//! - [`http`] - HTTP client for the hosted site API
//! - [`fixture`] - In-memory API for tests and offline use
//! - [`loader`] - Full loads and change checks
//! - [`watch`] - Background polling loop
//! - [`markup`] - Head tag values and rendering
//! - [`seo`] - SEO tags for a record
//! - [`favicon`] - Favicon and app icon tags

pub mod api;
pub mod favicon;
pub mod fixture;
pub mod http;
pub mod loader;
pub mod markup;
pub mod seo;
pub mod watch;

pub use api::{ApiError, ContentApi};
pub use favicon::FaviconTagsBuilder;
pub use fixture::{FixtureCalls, FixtureContentApi};
pub use http::{ClientOptions, HttpContentApi};
pub use loader::{LoadError, Loader, PollError, PollOutcome, RepositoryHandle};
pub use markup::{MetaTag, render_tags};
pub use seo::SeoTagsBuilder;
pub use watch::{WatchError, WatchSession, WatchStats};
