//! Short ID derivation
//!
//! A short ID is the first [`SHORT_HASH_BYTES`] bytes of the SHA-1 hash of
//! the URL's byte representation, rendered as lowercase hex. The function is
//! pure: shortening the same URL always yields the same token, which is what
//! makes conflict detection possible downstream.

use sha1::{Digest, Sha1};

/// Number of hash bytes kept for the token; the rendered ID is twice as long.
pub const SHORT_HASH_BYTES: usize = 4;

/// Compute the short ID for a full URL.
///
/// Does not validate the URL; callers are expected to have done that.
pub fn compute_short_id(full_url: &str) -> String {
    let digest = Sha1::digest(full_url.as_bytes());
    hex::encode(&digest[..SHORT_HASH_BYTES])
}
