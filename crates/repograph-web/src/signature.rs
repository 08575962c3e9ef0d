//! Push-event signature verification (`X-Hub-Signature-256`).

use hmac::{Hmac, Mac};
use sha2::Sha256;

use repograph_core::{RepographError, RepographResult};

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

type HmacSha256 = Hmac<Sha256>;

/// Check `header` (`sha256=<hex>`) against the HMAC-SHA256 of `body` under `secret`.
///
/// The digest comparison is constant-time.
pub fn verify_signature(secret: &[u8], header: Option<&str>, body: &[u8]) -> RepographResult<()> {
    let header = header.ok_or(RepographError::MissingSignature)?;

    let hex_digest = header
        .trim()
        .strip_prefix("sha256=")
        .ok_or_else(|| RepographError::Authentication("unsupported signature scheme".into()))?;
    let expected = hex::decode(hex_digest)
        .map_err(|_| RepographError::Authentication("malformed signature".into()))?;

    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .map_err(|e| RepographError::Authentication(format!("HMAC initialization failed: {e}")))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| RepographError::Authentication("invalid signature".into()))
}

/// `sha256=<hex>` signature of `body`, as a sender computes it.
pub fn sign(secret: &[u8], body: &[u8]) -> RepographResult<String> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .map_err(|e| RepographError::Authentication(format!("HMAC initialization failed: {e}")))?;
    mac.update(body);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
