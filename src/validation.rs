//! Path validation, dependency checks and API key validation

use crate::error::{CertError, Result};
use crate::warn;
use jsonwebtoken::EncodingKey;
use std::io::Write;
use std::path::Path;
use termcolor::WriteColor;

/// Expand tilde in path, returning error if HOME is not set
///
/// When HOME is unset, shellexpand leaves `~` unchanged; that case is
/// reported instead of silently producing a relative path named `~`.
pub fn expand_tilde_path(path: &str) -> Result<String> {
    let expanded = shellexpand::tilde(path).to_string();

    if path.starts_with('~') && expanded.starts_with('~') {
        return Err(CertError::InvalidConfig(format!(
            "Could not expand ~ in '{path}' (HOME environment variable not set).\n\
             Please use an absolute path instead."
        )));
    }

    Ok(expanded)
}

/// Check that the `security` and `openssl` commands are available
pub async fn check_dependencies() -> Result<()> {
    if tokio::process::Command::new("security")
        .arg("help")
        .output()
        .await
        .is_err()
    {
        return Err(CertError::MissingDependency(
            "'security' command not available.\n\
             This tool requires macOS with the security framework."
                .to_string(),
        ));
    }

    tokio::process::Command::new("openssl")
        .arg("version")
        .output()
        .await
        .map_err(|_| {
            CertError::MissingDependency(
                "OpenSSL/LibreSSL not found in PATH.\n\
                 Required for: reading certificate fingerprints\n\
                 Install with `brew install openssl` or use /usr/bin/openssl"
                    .to_string(),
            )
        })?;

    Ok(())
}

/// Validate that a path points to a readable .p8 App Store Connect key
///
/// Checks existence, file type and size, then parses the key. A non-`.p8`
/// extension or an RSA key only produces a warning.
pub async fn validate_p8_file(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        CertError::InvalidConfig(format!(
            "Cannot access API key file: {}\n   Error: {e}",
            path.display()
        ))
    })?;

    if !metadata.is_file() {
        return Err(CertError::InvalidConfig(format!(
            "Path is not a file: {}\n   Please provide path to .p8 file",
            path.display()
        )));
    }

    if path.extension().and_then(|e| e.to_str()) != Some("p8") {
        warn!("Expected .p8 extension for API key: {}", path.display());
    }

    if metadata.len() == 0 {
        return Err(CertError::InvalidConfig(format!(
            "API key file is empty: {}",
            path.display()
        )));
    }

    let key_data = tokio::fs::read(path).await?;

    if let Err(e) = EncodingKey::from_ec_pem(&key_data) {
        if EncodingKey::from_rsa_pem(&key_data).is_err() {
            return Err(CertError::InvalidConfig(format!(
                "File is not a valid private key: {}\n   \
                 Error: {e}\n   \
                 Expected: PEM-encoded EC private key (.p8 file)\n   \
                 Download your key from https://appstoreconnect.apple.com/access/api",
                path.display()
            )));
        }
        warn!("RSA key found in {}, App Store Connect expects EC keys", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_unchanged() {
        assert_eq!(expand_tilde_path("/tmp/certs").unwrap(), "/tmp/certs");
        assert_eq!(expand_tilde_path("certs").unwrap(), "certs");
    }

    #[tokio::test]
    async fn empty_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AuthKey_AB12CD34EF.p8");
        tokio::fs::write(&path, b"").await.unwrap();

        let err = validate_p8_file(&path).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn garbage_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AuthKey_AB12CD34EF.p8");
        tokio::fs::write(&path, b"not a key").await.unwrap();

        let err = validate_p8_file(&path).await.unwrap_err();
        assert!(matches!(err, CertError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_p8_file(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }
}
