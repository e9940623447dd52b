//! The remote certificate authority seam
//!
//! The runner only talks to the authority through [`CertificateAuthority`];
//! [`crate::apple_api::AppleAPIClient`] is the production implementation.

use crate::config::CertificateType;
use crate::error::{CertError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Text Apple returns when the account already holds the maximum number of
/// certificates of the requested type.
pub const QUOTA_EXHAUSTED_MARKER: &str = "You already have a current";

/// A certificate as listed by the remote authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub id: String,
    pub name: String,
    pub expires: DateTime<Utc>,
    pub can_download: bool,
    pub certificate_type: CertificateType,
}

impl Certificate {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires < now
    }
}

/// A certificate signing request and the private key it was generated with.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SigningRequest {
    pub csr_pem: String,
    pub private_key_pem: String,
}

impl std::fmt::Debug for SigningRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningRequest")
            .field("csr_pem", &self.csr_pem)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Establish a session. Failures are authentication errors.
    async fn login(&mut self) -> Result<()>;

    /// Whether the authenticated account is an in-house (enterprise) account.
    fn is_in_house(&self) -> bool;

    /// All certificates of `cert_type`, in the order the authority returns them.
    async fn list_certificates(&self, cert_type: CertificateType) -> Result<Vec<Certificate>>;

    /// Generate a new key pair and signing request.
    fn create_signing_request(&self, common_name: &str) -> Result<SigningRequest>;

    async fn create_certificate(
        &self,
        csr_pem: &str,
        cert_type: CertificateType,
    ) -> Result<Certificate>;

    /// Fetch the raw DER bytes of `certificate`.
    async fn download_certificate(&self, certificate: &Certificate) -> Result<Vec<u8>>;
}

/// Whether an authority error message means the certificate quota is used up.
///
/// Apple does not return a dedicated error code for this, so the message text
/// is matched.
#[must_use]
pub fn is_quota_exhausted(message: &str) -> bool {
    message.contains(QUOTA_EXHAUSTED_MARKER)
}

/// Map a failed creation into the error surfaced to the user.
#[must_use]
pub fn classify_creation_error(error: CertError) -> CertError {
    if is_quota_exhausted(&error.to_string()) {
        CertError::QuotaExceeded
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_message_is_classified() {
        let err = CertError::AppStoreConnectApi(
            "There is a problem with the request entity\nCode: ENTITY_ERROR\n\
             You already have a current iOS Distribution certificate or a pending certificate request."
                .to_string(),
        );
        assert!(matches!(classify_creation_error(err), CertError::QuotaExceeded));
    }

    #[test]
    fn other_errors_pass_through() {
        let err = CertError::AppStoreConnectApi("Invalid CSR format".to_string());
        match classify_creation_error(err) {
            CertError::AppStoreConnectApi(msg) => assert_eq!(msg, "Invalid CSR format"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_api_creation_errors_keep_their_kind() {
        let err = CertError::Io(std::io::Error::other("connection reset"));
        let classified = classify_creation_error(err);
        assert!(matches!(classified, CertError::Io(_)));
        assert_eq!(classified.to_string(), "File I/O error: connection reset");
    }

    #[test]
    fn quota_match_is_case_sensitive() {
        assert!(!is_quota_exhausted("you already have a current certificate"));
    }

    #[test]
    fn signing_request_debug_hides_key() {
        let req = SigningRequest {
            csr_pem: "CSR".to_string(),
            private_key_pem: "SECRET".to_string(),
        };
        assert!(!format!("{req:?}").contains("SECRET"));
    }
}
