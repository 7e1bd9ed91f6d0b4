//! Deterministic digests using BLAKE2b with a 128-bit output.
//!
//! The same digest serves as the user-facing `hash` command and as the key
//! derivation step, so its length matches [`KEY_LENGTH`](crate::keys::KEY_LENGTH).

use blake2::digest::consts::U16;
use blake2::{Blake2b, Digest};
use zeroize::Zeroize;

use crate::keys::{Key, Passphrase};
use secretary_common::Result;

/// Digest size in bytes.
pub const DIGEST_LENGTH: usize = 16;

/// Compute the raw digest of `data`.
pub fn digest_bytes(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    let mut hasher = Blake2b::<U16>::new();
    hasher.update(data);

    let result = hasher.finalize();
    let mut out = [0u8; DIGEST_LENGTH];
    out.copy_from_slice(&result);
    out
}

/// Compute the digest of `text` as lowercase hex.
///
/// # Postconditions
/// - Output is always `2 * DIGEST_LENGTH` characters
/// - Same input gives the same output
pub fn digest(text: &str) -> String {
    hex::encode(digest_bytes(text.as_bytes()))
}

/// Derive the symmetric key for a passphrase.
///
/// # Errors
/// - `KeyDerivation` if the digest does not fit the cipher key length
pub fn derive_key(passphrase: &Passphrase) -> Result<Key> {
    let mut material = digest_bytes(passphrase.expose().as_bytes());
    let key = Key::from_slice(&material);
    material.zeroize();
    key
}
