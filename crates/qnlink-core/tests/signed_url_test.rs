//! Signed link layout against the system clock

use pretty_assertions::assert_eq;
use qnlink_core::timestamp::expire_after;
use qnlink_core::{create_signed_url, AntiLeechRequest, Mac, QnlinkError, Signer, WallClock};

/// Deterministic stand-in for the real signing primitive
struct ReverseSigner;

impl Signer for ReverseSigner {
    fn sign(&self, message: &[u8]) -> Result<String, QnlinkError> {
        Ok(String::from_utf8_lossy(message)
            .chars()
            .rev()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect())
    }
}

fn split_deadline_and_token(signed: &str, prefix: &str) -> (i64, String) {
    let rest = signed.strip_prefix(prefix).unwrap();
    let (deadline, token) = rest.split_once("&token=").unwrap();
    (deadline.parse().unwrap(), token.to_string())
}

#[test]
fn test_signed_url_without_query() {
    let url = "http://a.b.com/p/v.mp4";
    let before = expire_after(&WallClock, 3600).as_secs();
    let signed = create_signed_url(&ReverseSigner, url, Some(3600), &WallClock).unwrap();
    let after = expire_after(&WallClock, 3600).as_secs();

    assert_eq!(signed.matches("?e=").count(), 1);
    assert_eq!(signed.matches("&token=").count(), 1);

    let (deadline, token) = split_deadline_and_token(&signed, "http://a.b.com/p/v.mp4?e=");
    assert!(before <= deadline && deadline <= after);
    assert_eq!(
        token,
        ReverseSigner
            .sign(format!("{}?e={}", url, deadline).as_bytes())
            .unwrap()
    );
}

#[test]
fn test_signed_url_with_existing_query() {
    let signed =
        create_signed_url(&ReverseSigner, "http://a.b.com/p/v.mp4?v=1", None, &WallClock).unwrap();

    assert!(signed.starts_with("http://a.b.com/p/v.mp4?v=1&e="));
    assert!(!signed.contains("?e="));

    let (deadline, _) = split_deadline_and_token(&signed, "http://a.b.com/p/v.mp4?v=1&e=");
    let expected = expire_after(&WallClock, 3600).as_secs();
    assert!((expected - deadline).abs() <= 1);
}

#[test]
fn test_signed_url_with_real_credentials_is_stable_per_deadline() {
    let mac = Mac::new("access", "secret");
    let signed = create_signed_url(&mac, "http://a.b.com/p/v.mp4", Some(60), &WallClock).unwrap();
    let (deadline, token) = split_deadline_and_token(&signed, "http://a.b.com/p/v.mp4?e=");

    let message = format!("http://a.b.com/p/v.mp4?e={}", deadline);
    assert_eq!(token, mac.sign(message.as_bytes()).unwrap());
    assert!(token.starts_with("access:"));
}

#[test]
fn test_anti_leech_from_url_then_parts() {
    let mut request =
        AntiLeechRequest::from_url("http://cdn.example.com/dir/a.mp4", "key", 120, &WallClock)
            .unwrap();
    assert_eq!(request.host, "http://cdn.example.com");
    assert_eq!(request.path, "/dir/");
    assert_eq!(request.file, "a.mp4");
    assert_eq!(request.query, "");

    let deadline = request.timestamp().unwrap().as_secs();
    let expected = expire_after(&WallClock, 120).as_secs();
    assert!((expected - deadline).abs() <= 1);

    request.set_expire_after(-60, &WallClock);
    assert!(request.timestamp().unwrap().as_secs() < expected);
}
