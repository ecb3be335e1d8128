//! Webhook signature computation and verification.
//!
//! GitHub signs the raw request body with HMAC using the shared webhook
//! secret and sends `"<algorithm>=<hex digest>"` in a header. Verification
//! must run on the bytes as received: re-serializing parsed JSON is not
//! guaranteed to reproduce them.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use hookfolder_types::webhook::SignatureAlgorithm;

/// Compute the signature header value for `body`.
///
/// Returns `"<algorithm>=<lowercase hex>"`, e.g. `sha1=effcdf6a...`.
pub fn sign(algorithm: SignatureAlgorithm, secret: &[u8], body: &[u8]) -> String {
    let digest = match algorithm {
        SignatureAlgorithm::Sha1 => hmac_digest::<Hmac<Sha1>>(secret, body),
        SignatureAlgorithm::Sha256 => hmac_digest::<Hmac<Sha256>>(secret, body),
    };
    format!("{}={}", algorithm.prefix(), hex::encode(digest))
}

/// Check `provided` against the signature of `body` under `secret`.
///
/// Returns `false` when the signature is missing or differs in any byte.
/// The comparison is constant-time over the formatted header value.
pub fn verify(
    algorithm: SignatureAlgorithm,
    secret: &[u8],
    body: &[u8],
    provided: Option<&str>,
) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    let expected = sign(algorithm, secret, body);
    constant_time_eq(expected.as_bytes(), provided.as_bytes())
}

fn hmac_digest<M: Mac + KeyInit>(secret: &[u8], body: &[u8]) -> Vec<u8> {
    let mut mac = <M as KeyInit>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time byte comparison (XOR-based).
///
/// Returns true if and only if `a == b`. Time taken is independent of
/// how many bytes match.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
