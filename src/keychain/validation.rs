//! Signing identity lookup for the macOS keychain

use crate::error::{CertError, Result};
use std::path::Path;

/// A valid code-signing identity reported by `security find-identity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Upper-case hex SHA-1 of the certificate
    pub sha1: String,
    pub name: String,
}

/// Parse `security find-identity -v -p codesigning` output
///
/// # Example Output Parsing
/// Input: `  1) 0123ABCD... "iPhone Distribution: Acme Corp (TEAM123)"`
/// Output: `Identity { sha1: "0123ABCD...", name: "iPhone Distribution: Acme Corp (TEAM123)" }`
pub fn parse_identities(output: &str) -> Vec<Identity> {
    let mut identities = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.contains("valid identities found") {
            continue;
        }

        // Format: `N) HASH "Name"`
        let Some((_, rest)) = trimmed.split_once(") ") else {
            continue;
        };
        let Some((hash, quoted)) = rest.split_once(' ') else {
            continue;
        };
        if hash.len() != 40 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            continue;
        }

        let name = quoted
            .trim()
            .strip_prefix('"')
            .and_then(|n| n.strip_suffix('"'))
            .unwrap_or(quoted.trim());

        identities.push(Identity {
            sha1: hash.to_ascii_uppercase(),
            name: name.to_string(),
        });
    }

    identities
}

/// List valid code-signing identities across the keychain search list
pub async fn find_identities() -> Result<Vec<Identity>> {
    let output = tokio::process::Command::new("security")
        .args(["find-identity", "-v", "-p", "codesigning"])
        .output()
        .await
        .map_err(|e| CertError::CommandExecution(format!("Failed to run security command: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CertError::CommandExecution(format!(
            "security find-identity failed with status {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    let stdout = std::str::from_utf8(&output.stdout).map_err(|e| {
        CertError::CommandExecution(format!("security command output is not valid UTF-8: {e}"))
    })?;

    Ok(parse_identities(stdout))
}

/// The identity whose SHA-1 matches `fingerprint`, ignoring case
#[must_use]
pub fn matching_identity<'a>(identities: &'a [Identity], fingerprint: &str) -> Option<&'a Identity> {
    identities
        .iter()
        .find(|identity| identity.sha1.eq_ignore_ascii_case(fingerprint))
}

/// SHA-1 fingerprint of a DER certificate, upper-case hex without colons
pub async fn certificate_fingerprint(cert_path: &Path) -> Result<String> {
    let output = tokio::process::Command::new("openssl")
        .args(["x509", "-inform", "DER", "-fingerprint", "-sha1", "-noout", "-in"])
        .arg(cert_path)
        .output()
        .await
        .map_err(|e| CertError::CommandExecution(format!("Failed to run openssl: {e}")))?;

    if !output.status.success() {
        return Err(CertError::KeychainOperation(format!(
            "Could not read certificate {}: {}",
            cert_path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_fingerprint(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `SHA1 Fingerprint=AB:CD:...` (OpenSSL) or `sha1 Fingerprint=...` (LibreSSL)
fn parse_fingerprint(line: &str) -> Result<String> {
    let (_, hash) = line
        .trim()
        .split_once("Fingerprint=")
        .ok_or_else(|| CertError::KeychainOperation(format!("Invalid fingerprint output: {line}")))?;

    Ok(hash.replace(':', "").to_ascii_uppercase())
}
