//! Delivery signature verification
//!
//! Each delivery carries a base64 HMAC-SHA256 of the exact raw body bytes.
//! A primary and an optional secondary key are configured so keys can be
//! rotated without dropping deliveries.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signatures as received with a delivery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl Signatures {
    pub fn primary(signature: impl Into<String>) -> Self {
        Self {
            primary: Some(signature.into()),
            secondary: None,
        }
    }
}

/// Signing keys shared with the event source
#[derive(Clone)]
pub struct SigningKeys {
    primary: Vec<u8>,
    secondary: Option<Vec<u8>>,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("primary", &"<redacted>")
            .field("secondary", &self.secondary.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SigningKeys {
    pub fn new(primary: impl Into<Vec<u8>>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<Vec<u8>>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    /// Whether either signature matches its key over `body`.
    pub fn verify(&self, body: &[u8], signatures: &Signatures) -> bool {
        let primary_ok = signatures
            .primary
            .as_deref()
            .is_some_and(|sig| verify_one(&self.primary, body, sig));
        if primary_ok {
            return true;
        }

        match (&self.secondary, signatures.secondary.as_deref()) {
            (Some(key), Some(sig)) => verify_one(key, body, sig),
            _ => false,
        }
    }
}

/// Base64 HMAC-SHA256 of `body` under `key`
pub fn sign(key: &[u8], body: &[u8]) -> String {
    let mut mac = mac_for(key);
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

fn verify_one(key: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let mut mac = mac_for(key);
    mac.update(body);
    // Constant-time comparison
    mac.verify_slice(&expected).is_ok()
}

fn mac_for(key: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length, so this constructor cannot fail
    match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}
