//! Certificate and key import into a macOS keychain

use crate::error::{CertError, Result};
use std::path::Path;

/// Import a certificate (`.cer`) or private key file into `keychain`
///
/// Both `codesign` and `security` are granted access to imported keys so
/// signing does not prompt. An item that is already present counts as
/// imported.
pub async fn import_file(path: &Path, keychain: &str) -> Result<()> {
    let path_str = path
        .to_str()
        .ok_or_else(|| CertError::InvalidConfig(format!("Invalid path: {}", path.display())))?;

    let output = tokio::process::Command::new("security")
        .args([
            "import",
            path_str,
            "-k",
            keychain,
            "-T",
            "/usr/bin/codesign",
            "-T",
            "/usr/bin/security",
        ])
        .output()
        .await
        .map_err(|e| {
            CertError::KeychainOperation(format!("Failed to execute security import: {e}"))
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if is_duplicate_item(&stderr) {
        return Ok(());
    }

    Err(CertError::KeychainOperation(format!(
        "Keychain import of {} failed: {}",
        path.display(),
        stderr.trim()
    )))
}

fn is_duplicate_item(stderr: &str) -> bool {
    stderr.contains("already exists in the keychain")
}

/// Verify keychain is accessible and unlocked
pub async fn ensure_keychain_accessible(keychain: &str) -> Result<()> {
    let output = tokio::process::Command::new("security")
        .args(["show-keychain-info", keychain])
        .output()
        .await
        .map_err(|e| {
            CertError::CommandExecution(format!("Failed to check keychain status: {e}"))
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);

    if stderr.contains("locked") {
        return Err(CertError::KeychainOperation(format!(
            "Keychain '{keychain}' is locked.\n\
             Unlock it before running: security unlock-keychain {keychain}"
        )));
    }

    if stderr.contains("does not exist") || stderr.contains("not found") {
        return Err(CertError::KeychainOperation(format!(
            "Keychain '{keychain}' not found."
        )));
    }

    Err(CertError::KeychainOperation(format!(
        "Keychain check failed: {}",
        stderr.trim()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_import_is_recognised() {
        assert!(is_duplicate_item(
            "security: SecKeychainItemImport: The specified item already exists in the keychain."
        ));
        assert!(!is_duplicate_item("security: SecKeychainItemImport: Unknown format in import."));
    }
}
