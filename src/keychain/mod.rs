//! Local trust store operations
//!
//! This module provides:
//! - The [`TrustStore`] seam used by the runner
//! - [`SecurityKeychain`], backed by the macOS `security` and `openssl` tools
//! - Parsing of `security find-identity` output

mod import;
mod validation;

use crate::error::Result;
use crate::output;
use async_trait::async_trait;
use std::path::Path;

pub use import::{ensure_keychain_accessible, import_file};
pub use validation::{
    Identity, certificate_fingerprint, find_identities, matching_identity, parse_identities,
};

#[async_trait]
pub trait TrustStore: Send + Sync {
    /// Whether the certificate stored at `path` is installed as a signing identity.
    async fn is_installed(&self, path: &Path) -> Result<bool>;

    /// Import the certificate or private key stored at `path`.
    async fn import_file(&self, path: &Path) -> Result<()>;
}

/// A named macOS keychain, e.g. `login.keychain-db`.
#[derive(Debug, Clone)]
pub struct SecurityKeychain {
    keychain: String,
    verbose: bool,
}

impl SecurityKeychain {
    #[must_use]
    pub fn new(keychain: impl Into<String>) -> Self {
        Self {
            keychain: keychain.into(),
            verbose: false,
        }
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.keychain
    }
}

#[async_trait]
impl TrustStore for SecurityKeychain {
    async fn is_installed(&self, path: &Path) -> Result<bool> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(false);
        }

        let fingerprint = certificate_fingerprint(path).await?;
        let identities = find_identities().await?;

        match matching_identity(&identities, &fingerprint) {
            Some(identity) => {
                output::verbose(
                    self.verbose,
                    &format!("{} is installed as '{}'", path.display(), identity.name),
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn import_file(&self, path: &Path) -> Result<()> {
        import_file(path, &self.keychain).await
    }
}
