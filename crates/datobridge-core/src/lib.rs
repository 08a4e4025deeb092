//! datobridge Core Library
//!
//! Core types, configuration, credential resolution and error handling for
//! the datobridge CMS integration.

pub mod config;
pub mod content;
pub mod credential;
pub mod error;

pub use config::{CmsConfig, Config, OutputConfig};
pub use content::{
    ContentItem, ContentRepository, ContentVersion, Fingerprint, GlobalSeo, Image, ItemMeta,
    ItemStatus, SeoSettings, SiteMetadata,
};
pub use credential::{
    Credential, CredentialChain, CredentialSource, EnvFileToken, EnvVarToken, ExplicitToken,
};
pub use error::{CoreError, Result};
