//! Webhook signature verification (`X-Hub-Signature-256`).

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Result of checking a delivery against the shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// No secret configured; the body is accepted unverified
    Skipped,
    Valid,
    /// Secret configured but the request carried no signature
    Missing,
    Mismatch,
}

impl SignatureCheck {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Skipped | Self::Valid)
    }
}

/// Shared webhook secret.
///
/// `Debug` never prints the secret.
#[derive(Clone)]
pub struct WebhookSecret(Option<SecretString>);

impl WebhookSecret {
    pub fn new(secret: Option<SecretString>) -> Self {
        Self(secret)
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    /// Verify `body` against the `sha256=<hex>` signature header.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> SignatureCheck {
        let Some(secret) = &self.0 else {
            return SignatureCheck::Skipped;
        };
        let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) else {
            return SignatureCheck::Missing;
        };

        match sign(secret.expose_secret().as_bytes(), body) {
            Some(expected) if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) => {
                SignatureCheck::Valid
            }
            _ => SignatureCheck::Mismatch,
        }
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "WebhookSecret([REDACTED])"),
            None => write!(f, "WebhookSecret(None)"),
        }
    }
}

/// Compute the `sha256=<lowercase hex>` header value for a body.
pub fn sign(secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}
