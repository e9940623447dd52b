//! Error types for certificate lookup and provisioning.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CertError>;

#[derive(Debug, Error)]
pub enum CertError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error(
        "Could not create another certificate, reached the maximum number of available certificates."
    )]
    QuotaExceeded,

    #[error("Could not find the newly generated certificate installed: {0}")]
    NotInstalled(String),

    #[error("App Store Connect API error: {0}")]
    AppStoreConnectApi(String),

    #[error("CSR generation failed: {0}")]
    CsrGeneration(String),

    #[error("Keychain operation failed: {0}")]
    KeychainOperation(String),

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JWT creation failed: {0}")]
    JwtCreation(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}
