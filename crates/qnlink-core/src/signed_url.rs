//! Authorized download links for private buckets
//!
//! `url?e=<deadline>&token=<token>`, where the token signs everything up to
//! and including the deadline parameter.

use crate::auth::Signer;
use crate::clock::Clock;
use crate::error::QnlinkError;
use crate::timestamp;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use qnlink_types::DEFAULT_EXPIRE_SECS;
use tracing::debug;

/// Bytes escaped in a query parameter value
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Build an authorized download link valid for `expire_secs` seconds
/// (one hour when `None`).
pub fn create_signed_url<C: Clock + ?Sized>(
    signer: &dyn Signer,
    url: &str,
    expire_secs: Option<i64>,
    clock: &C,
) -> Result<String, QnlinkError> {
    let deadline = timestamp::expire_after(clock, expire_secs.unwrap_or(DEFAULT_EXPIRE_SECS));

    let mut signed = String::with_capacity(url.len() + 64);
    signed.push_str(url);
    signed.push(if url.contains('?') { '&' } else { '?' });
    signed.push_str(&format!("e={}", deadline));

    let token = signer.sign(signed.as_bytes())?;
    signed.push_str("&token=");
    signed.extend(utf8_percent_encode(&token, QUERY_VALUE));

    debug!("Signed download URL for {} (deadline {})", url, deadline);
    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Mac;
    use crate::clock::FixedClock;
    use pretty_assertions::assert_eq;

    struct TagSigner;

    impl Signer for TagSigner {
        fn sign(&self, message: &[u8]) -> Result<String, QnlinkError> {
            Ok(format!("tok({})", message.len()))
        }
    }

    #[test]
    fn test_default_expiry_is_one_hour() {
        let clock = FixedClock::from_unix(1_500_000_000).unwrap();
        let signed = create_signed_url(&TagSigner, "http://a.b.com/v.mp4", None, &clock).unwrap();
        assert!(signed.starts_with("http://a.b.com/v.mp4?e=1500003600&token="));
    }

    #[test]
    fn test_token_is_query_encoded() {
        let clock = FixedClock::from_unix(0).unwrap();
        let signed = create_signed_url(&TagSigner, "http://h/f", Some(5), &clock).unwrap();
        assert_eq!(signed, "http://h/f?e=5&token=tok(14)");

        struct SpacedSigner;
        impl Signer for SpacedSigner {
            fn sign(&self, _: &[u8]) -> Result<String, QnlinkError> {
                Ok("a b&c".into())
            }
        }
        let signed = create_signed_url(&SpacedSigner, "http://h/f", Some(5), &clock).unwrap();
        assert_eq!(signed, "http://h/f?e=5&token=a%20b%26c");
    }

    #[test]
    fn test_mac_token_signs_url_with_deadline() {
        let clock = FixedClock::from_unix(1_500_000_000).unwrap();
        let mac = Mac::new("ak", "sk");
        let signed = create_signed_url(&mac, "http://a.b.com/p/v.mp4", Some(60), &clock).unwrap();

        let expected_token = mac.sign(b"http://a.b.com/p/v.mp4?e=1500000060").unwrap();
        assert_eq!(
            signed,
            format!("http://a.b.com/p/v.mp4?e=1500000060&token={}", expected_token)
        );
    }

    #[test]
    fn test_configuration_error_propagates() {
        let clock = FixedClock::from_unix(0).unwrap();
        let err = create_signed_url(&Mac::new("", ""), "http://h/f", None, &clock).unwrap_err();
        assert!(matches!(err, QnlinkError::Configuration(_)));
    }
}
