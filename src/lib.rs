//! Find or provision Apple code-signing certificates and install them locally

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Best-effort removal of a file, warning on stderr when it fails.
///
/// A path that is already gone is not an error.
pub async fn cleanup_path<P: AsRef<std::path::Path>>(path: P, description: &str) {
    let path = path.as_ref();

    let Err(e) = tokio::fs::remove_file(path).await else {
        return;
    };
    if e.kind() == std::io::ErrorKind::NotFound {
        return;
    }

    let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();

    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
    let _ = writeln!(&mut buffer, "⚠️  Warning: Failed to remove {description}");
    let _ = buffer.reset();
    let _ = writeln!(&mut buffer, "   Path: {}", path.display());
    let _ = writeln!(&mut buffer, "   Error: {e}");
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        let _ = writeln!(
            &mut buffer,
            "   Suggestion: Check file permissions or remove it manually"
        );
    }

    let _ = bufwtr.print(&buffer);
}

#[macro_use]
pub mod output;

pub mod apple_api;
pub mod authority;
pub mod config;
pub mod error;
pub mod keychain;
pub mod runner;
pub mod validation;

// Re-export common types
pub use apple_api::AppleAPIClient;
pub use authority::{Certificate, CertificateAuthority, SigningRequest};
pub use config::{CertConfig, CertificateType};
pub use error::CertError;
pub use keychain::{SecurityKeychain, TrustStore};
pub use runner::{Runner, SelectedCertificate};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cleanup_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.cer");
        tokio::fs::write(&path, b"x").await.unwrap();

        cleanup_path(&path, "cached certificate").await;
        assert!(!path.exists());

        cleanup_path(&path, "cached certificate").await;
    }
}
