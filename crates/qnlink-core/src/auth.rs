//! Token signing
//!
//! A [`Signer`] turns a message into an opaque token. The secret is bound
//! into the signer value, so the same signer always yields the same token
//! for the same message.

use crate::error::QnlinkError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::{Hmac, Mac as _};
use qnlink_types::Settings;
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

pub trait Signer: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<String, QnlinkError>;
}

fn hmac_sha1(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, QnlinkError> {
    let mut mac = HmacSha1::new_from_slice(secret)
        .map_err(|e| QnlinkError::Configuration(format!("unusable signing key: {}", e)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Account credential pair
#[derive(Clone)]
pub struct Mac {
    pub access_key: String,
    secret_key: String,
}

impl Mac {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, QnlinkError> {
        let mac = Self::new(settings.access_key.clone(), settings.secret_key.clone());
        mac.check()?;
        Ok(mac)
    }

    fn check(&self) -> Result<(), QnlinkError> {
        if self.access_key.is_empty() {
            return Err(QnlinkError::Configuration("access key is not set".into()));
        }
        if self.secret_key.is_empty() {
            return Err(QnlinkError::Configuration("secret key is not set".into()));
        }
        Ok(())
    }

    /// URL-safe base64 of HMAC-SHA1(secret_key, message)
    pub fn encoded_sign(&self, message: &[u8]) -> Result<String, QnlinkError> {
        self.check()?;
        Ok(URL_SAFE.encode(hmac_sha1(self.secret_key.as_bytes(), message)?))
    }
}

// Keep the secret out of logs.
impl fmt::Debug for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mac")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Download token: `<access_key>:<encoded sign>`
impl Signer for Mac {
    fn sign(&self, message: &[u8]) -> Result<String, QnlinkError> {
        Ok(format!("{}:{}", self.access_key, self.encoded_sign(message)?))
    }
}

/// Lowercase hex HMAC-SHA1 keyed by a shared secret
#[derive(Clone)]
pub struct HmacSigner {
    key: Vec<u8>,
}

impl HmacSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn sign(&self, message: &[u8]) -> Result<String, QnlinkError> {
        if self.key.is_empty() {
            return Err(QnlinkError::Configuration("signing key is empty".into()));
        }
        Ok(hex::encode(hmac_sha1(&self.key, message)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_token_layout() {
        let mac = Mac::new("ak", "sk");
        let token = mac.sign(b"http://a.b.com/p/v.mp4?e=1500000000").unwrap();

        let (access_key, encoded) = token.split_once(':').unwrap();
        assert_eq!(access_key, "ak");
        // 20-byte digest, padded URL-safe base64
        assert_eq!(encoded.len(), 28);
        assert!(encoded.ends_with('='));
        assert!(!encoded.contains('+') && !encoded.contains('/'));
    }

    #[test]
    fn test_mac_sign_is_deterministic() {
        let mac = Mac::new("ak", "sk");
        assert_eq!(mac.sign(b"message").unwrap(), mac.sign(b"message").unwrap());
        assert_ne!(mac.sign(b"message").unwrap(), mac.sign(b"other").unwrap());
    }

    #[test]
    fn test_hmac_sha1_rfc2202_vector() {
        let signer = HmacSigner::new("Jefe");
        assert_eq!(
            signer.sign(b"what do ya want for nothing?").unwrap(),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let err = Mac::new("ak", "").sign(b"m").unwrap_err();
        assert!(matches!(err, QnlinkError::Configuration(_)));

        let err = HmacSigner::new("").sign(b"m").unwrap_err();
        assert!(matches!(err, QnlinkError::Configuration(_)));
    }

    #[test]
    fn test_mac_from_settings_requires_both_keys() {
        let mut settings = Settings::default();
        assert!(Mac::from_settings(&settings).is_err());

        settings.access_key = "ak".into();
        settings.secret_key = "sk".into();
        let mac = Mac::from_settings(&settings).unwrap();
        assert_eq!(mac.access_key, "ak");
    }

    #[test]
    fn test_mac_debug_redacts_secret() {
        let rendered = format!("{:?}", Mac::new("ak", "very-secret"));
        assert!(!rendered.contains("very-secret"));
    }
}
