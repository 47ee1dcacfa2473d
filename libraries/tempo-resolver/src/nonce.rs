//! Client playback nonces
//!
//! Short random tokens used as the body `cpn` and the `t` query parameter.
//! Uniqueness is only statistical; no cryptographic strength is needed.

use rand::Rng;

/// The 64-symbol nonce alphabet
pub const NONCE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Length of the client playback nonce embedded in request bodies
pub const CPN_LENGTH: usize = 16;

/// Length of the correlation nonce sent as the `t` query parameter
pub const QUERY_NONCE_LENGTH: usize = 12;

/// Generate a nonce of `length` characters
pub fn generate_nonce(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())]))
        .collect()
}
