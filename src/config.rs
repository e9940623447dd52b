//! Configuration for certificate lookup and provisioning.
//!
//! Values are layered: defaults, then the TOML config file, then the
//! `APPLE_API_*` environment variables, then command-line overrides.

use crate::error::{CertError, Result};
use crate::validation::expand_tilde_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default keychain for certificate storage
pub const DEFAULT_KEYCHAIN: &str = "login.keychain-db";

/// Default common name for certificate signing requests
pub const DEFAULT_COMMON_NAME: &str = "Kodegen Signing";

/// Default directory for `.cer`, `.p12` and `.certSigningRequest` files
pub const DEFAULT_OUTPUT_PATH: &str = ".";

pub const ENV_API_ISSUER: &str = "APPLE_API_ISSUER";
pub const ENV_API_KEY: &str = "APPLE_API_KEY";
pub const ENV_API_KEY_PATH: &str = "APPLE_API_KEY_PATH";

/// Resolved, read-only configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertConfig {
    /// App Store Connect issuer id; plays the role of the account username
    pub username: String,
    /// API key id, paired with `private_key_path` as the login credential
    pub key_id: String,
    pub private_key_path: PathBuf,
    pub output_path: PathBuf,
    /// Skip reuse of existing certificates and always create a new one
    pub force: bool,
    /// Request a development certificate instead of a distribution one
    pub development: bool,
    /// Account belongs to the Apple Developer Enterprise Program
    pub in_house: bool,
    pub keychain: String,
    pub common_name: String,
    pub verbose: bool,
}

/// Contents of the optional TOML config file. Every key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "issuer_id")]
    pub username: Option<String>,
    pub key_id: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub force: Option<bool>,
    pub development: Option<bool>,
    pub in_house: Option<bool>,
    pub keychain: Option<String>,
    pub common_name: Option<String>,
    pub verbose: Option<bool>,
}

impl ConfigFile {
    /// Default location: `~/.config/kodegen/cert.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kodegen").join("cert.toml"))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the file if it exists. A missing file yields an empty layer.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content).map_err(|e| {
            CertError::InvalidConfig(format!("{}: {e}", path.display()))
        })
    }
}

/// Command-line overrides. Boolean flags only ever turn options on.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub username: Option<String>,
    pub key_id: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub force: bool,
    pub development: bool,
    pub in_house: bool,
    pub keychain: Option<String>,
    pub common_name: Option<String>,
    pub verbose: bool,
}

impl CertConfig {
    /// Merge all configuration layers.
    ///
    /// `env` looks up environment variables; pass `|k| std::env::var(k).ok()`
    /// in production.
    pub fn resolve<F>(file: ConfigFile, overrides: ConfigOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = overrides
            .username
            .or_else(|| env(ENV_API_ISSUER))
            .or(file.username)
            .ok_or_else(|| {
                CertError::MissingConfig(format!(
                    "issuer id (use --username, {ENV_API_ISSUER} or `username` in the config file)"
                ))
            })?;

        let key_id = overrides
            .key_id
            .or_else(|| env(ENV_API_KEY))
            .or(file.key_id)
            .ok_or_else(|| {
                CertError::MissingConfig(format!(
                    "API key id (use --key-id, {ENV_API_KEY} or `key_id` in the config file)"
                ))
            })?;

        let private_key_path = match overrides
            .private_key_path
            .or_else(|| env(ENV_API_KEY_PATH).map(PathBuf::from))
            .or(file.private_key_path)
        {
            Some(path) => expand_path(&path)?,
            None => find_p8_key_in_standard_locations(&key_id).ok_or_else(|| {
                CertError::MissingConfig(format!(
                    "private key path (use --private-key, {ENV_API_KEY_PATH}, or place \
                     AuthKey_{key_id}.p8 in ~/.appstoreconnect/private_keys)"
                ))
            })?,
        };

        let output_path = expand_path(
            &overrides
                .output_path
                .or(file.output_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
        )?;

        Ok(Self {
            username,
            key_id,
            private_key_path,
            output_path,
            force: overrides.force || file.force.unwrap_or(false),
            development: overrides.development || file.development.unwrap_or(false),
            in_house: overrides.in_house || file.in_house.unwrap_or(false),
            keychain: overrides
                .keychain
                .or(file.keychain)
                .unwrap_or_else(|| DEFAULT_KEYCHAIN.to_string()),
            common_name: overrides
                .common_name
                .or(file.common_name)
                .unwrap_or_else(|| DEFAULT_COMMON_NAME.to_string()),
            verbose: overrides.verbose || file.verbose.unwrap_or(false),
        })
    }

    /// Rows for the run summary. The output path is hidden and the key id masked.
    #[must_use]
    pub fn summary_rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("username", self.username.clone()),
            ("key_id", mask(&self.key_id)),
            ("private_key_path", self.private_key_path.display().to_string()),
            ("force", self.force.to_string()),
            ("development", self.development.to_string()),
            ("in_house", self.in_house.to_string()),
            ("keychain", self.keychain.clone()),
        ]
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    expand_tilde_path(&path.to_string_lossy()).map(PathBuf::from)
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(2).collect();
    format!("{visible}{}", "*".repeat(secret.chars().count().saturating_sub(2)))
}

fn find_p8_key_in_standard_locations(key_id: &str) -> Option<PathBuf> {
    let filename = format!("AuthKey_{key_id}.p8");

    let mut search_paths = vec![PathBuf::from("./private_keys")];

    if let Some(home) = dirs::home_dir() {
        search_paths.push(home.join("private_keys"));
        search_paths.push(home.join(".private_keys"));
        search_paths.push(home.join(".appstoreconnect/private_keys"));
    }

    search_paths
        .into_iter()
        .map(|dir| dir.join(&filename))
        .find(|path| path.is_file())
}

/// The kind of certificate a run looks for or creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateType {
    #[serde(rename = "production")]
    Production,
    #[serde(rename = "in_house")]
    InHouse,
    #[serde(rename = "development")]
    Development,
}

impl CertificateType {
    /// Resolve the type for a run. Development wins over in-house, which
    /// wins over production.
    #[must_use]
    pub fn resolve(in_house_account: bool, development: bool) -> Self {
        let mut cert_type = Self::Production;
        if in_house_account {
            cert_type = Self::InHouse;
        }
        if development {
            cert_type = Self::Development;
        }
        cert_type
    }

    /// Convert to Apple API certificate type string
    ///
    /// In-house certificates are distribution certificates issued through the
    /// Enterprise Program API host, so they share the production string.
    #[must_use]
    pub fn to_apple_api_string(&self) -> &'static str {
        match self {
            Self::Production | Self::InHouse => "IOS_DISTRIBUTION",
            Self::Development => "IOS_DEVELOPMENT",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Production => "Production",
            Self::InHouse => "In-House",
            Self::Development => "Development",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn overrides() -> ConfigOverrides {
        ConfigOverrides {
            username: Some("12345678-1234-1234-1234-123456789012".to_string()),
            key_id: Some("AB12CD34EF".to_string()),
            private_key_path: Some(PathBuf::from("/keys/AuthKey_AB12CD34EF.p8")),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn development_beats_in_house_beats_production() {
        assert_eq!(CertificateType::resolve(false, false), CertificateType::Production);
        assert_eq!(CertificateType::resolve(true, false), CertificateType::InHouse);
        assert_eq!(CertificateType::resolve(false, true), CertificateType::Development);
        assert_eq!(CertificateType::resolve(true, true), CertificateType::Development);
    }

    #[test]
    fn defaults_fill_unset_options() {
        let config = CertConfig::resolve(ConfigFile::default(), overrides(), no_env).unwrap();

        assert_eq!(config.output_path, PathBuf::from("."));
        assert_eq!(config.keychain, DEFAULT_KEYCHAIN);
        assert_eq!(config.common_name, DEFAULT_COMMON_NAME);
        assert!(!config.force);
        assert!(!config.development);
        assert!(!config.in_house);
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let file = ConfigFile::parse(
            r#"
            username = "file-issuer"
            key_id = "FILEKEY000"
            private_key_path = "/file/key.p8"
            output_path = "/file/out"
            development = true
            "#,
        )
        .unwrap();

        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_API_ISSUER, "env-issuer"), (ENV_API_KEY, "ENVKEY0000")]);
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let cli = ConfigOverrides {
            key_id: Some("CLIKEY0000".to_string()),
            ..ConfigOverrides::default()
        };

        let config = CertConfig::resolve(file, cli, lookup).unwrap();

        assert_eq!(config.username, "env-issuer");
        assert_eq!(config.key_id, "CLIKEY0000");
        assert_eq!(config.private_key_path, PathBuf::from("/file/key.p8"));
        assert_eq!(config.output_path, PathBuf::from("/file/out"));
        assert!(config.development);
    }

    #[test]
    fn issuer_id_alias_is_accepted_in_file() {
        let file = ConfigFile::parse(r#"issuer_id = "abc""#).unwrap();
        assert_eq!(file.username.as_deref(), Some("abc"));
    }

    #[test]
    fn missing_username_is_reported() {
        let cli = ConfigOverrides {
            username: None,
            ..overrides()
        };
        let err = CertConfig::resolve(ConfigFile::default(), cli, no_env).unwrap_err();
        assert!(matches!(err, CertError::MissingConfig(_)));
    }

    #[test]
    fn summary_masks_key_and_hides_output_path() {
        let config = CertConfig::resolve(ConfigFile::default(), overrides(), no_env).unwrap();
        let rows = config.summary_rows();

        assert!(rows.iter().all(|(k, _)| *k != "output_path"));
        let key = rows.iter().find(|(k, _)| *k == "key_id").unwrap();
        assert_eq!(key.1, "AB********");
    }

    #[tokio::test]
    async fn missing_config_file_is_empty_layer() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::load(&dir.path().join("absent.toml")).await.unwrap();
        assert!(file.username.is_none());
    }
}
