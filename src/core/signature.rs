//! HMAC-SHA256 request signatures in the `sha256=<hex>` form

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
const SIGNATURE_PREFIX: &str = "sha256=";

pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Checks `header` against the signature of `body`. The comparison is constant time.
pub fn verify(secret: &str, body: &[u8], header: &str) -> bool {
    let Some(signature) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_own_signature() {
        let body = br#"{"_type":"page","slug":{"current":"about"}}"#;
        let header = sign("secret", body);

        assert!(header.starts_with("sha256="));
        assert!(verify("secret", body, &header));
    }

    #[test]
    fn rejects_tampering() {
        let header = sign("secret", b"original");

        assert!(!verify("secret", b"modified", &header));
        assert!(!verify("other-secret", b"original", &header));
        assert!(!verify("secret", b"original", header.trim_start_matches("sha256=")));
        assert!(!verify("secret", b"original", "sha256=zz"));
    }
}
