//! API token resolution.
//!
//! A [`CredentialChain`] tries each [`CredentialSource`] in order and the first
//! non-blank token wins. The default chain mirrors how the integration is
//! configured: explicit option, then an environment variable, then a local
//! `.env` file.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    config::CmsConfig,
    error::{CoreError, Result},
};

/// A resolved API token, immutable for the life of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// One place a token might come from.
pub trait CredentialSource: Send + Sync {
    /// Short label used in logs and errors.
    fn name(&self) -> String;

    /// Look the token up. `Ok(None)` means "not here, try the next one".
    fn resolve(&self) -> Result<Option<Credential>>;
}

fn non_blank(token: Option<String>) -> Option<Credential> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .map(Credential)
}

/// Token given directly in configuration.
#[derive(Debug, Clone)]
pub struct ExplicitToken(Option<String>);

impl ExplicitToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token)
    }
}

impl CredentialSource for ExplicitToken {
    fn name(&self) -> String {
        "config".to_string()
    }

    fn resolve(&self) -> Result<Option<Credential>> {
        Ok(non_blank(self.0.clone()))
    }
}

/// Token read from a process environment variable.
#[derive(Debug, Clone)]
pub struct EnvVarToken {
    var: String,
}

impl EnvVarToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvVarToken {
    fn name(&self) -> String {
        format!("${}", self.var)
    }

    fn resolve(&self) -> Result<Option<Credential>> {
        Ok(non_blank(std::env::var(&self.var).ok()))
    }
}

/// Token read from a dotenv-style file, without touching the process
/// environment.
#[derive(Debug, Clone)]
pub struct EnvFileToken {
    path: PathBuf,
    key: String,
}

impl EnvFileToken {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialSource for EnvFileToken {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn resolve(&self) -> Result<Option<Credential>> {
        if !self.path().exists() {
            return Ok(None);
        }

        let entries = dotenvy::from_path_iter(self.path()).map_err(|e| {
            CoreError::credential(format!("cannot read {}: {e}", self.path.display()))
        })?;

        for entry in entries {
            let (key, value) = entry.map_err(|e| {
                CoreError::credential(format!("cannot parse {}: {e}", self.path.display()))
            })?;
            if key == self.key {
                return Ok(non_blank(Some(value)));
            }
        }

        Ok(None)
    }
}

/// Ordered list of token sources.
#[derive(Default)]
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialChain {
    /// An empty chain; resolving it always fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source tried after the existing ones.
    #[must_use]
    pub fn with_source(mut self, source: impl CredentialSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Explicit option, then `token_env_var`, then `env_file`.
    #[must_use]
    pub fn from_config(cms: &CmsConfig) -> Self {
        Self::new()
            .with_source(ExplicitToken::new(cms.token.clone()))
            .with_source(EnvVarToken::new(&cms.token_env_var))
            .with_source(EnvFileToken::new(&cms.env_file, &cms.token_env_var))
    }

    /// Labels of the configured sources, in order.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Return the first token found.
    pub fn resolve(&self) -> Result<Credential> {
        for source in &self.sources {
            if let Some(credential) = source.resolve()? {
                tracing::debug!(source = %source.name(), "resolved API token");
                return Ok(credential);
            }
        }

        Err(CoreError::credential(format!(
            "Missing site API token (tried: {})",
            self.source_names().join(", ")
        )))
    }
}
