//! Authenticated encryption using AES-128-GCM.
//!
//! Every blob is self-contained: `nonce || ciphertext || tag`. The 96-bit
//! nonce is drawn from the operating system CSPRNG on every call and is
//! authenticated as part of the GCM construction, so tampering with any
//! byte of the blob is detected.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes128Gcm, Nonce,
};

use crate::hash::derive_key;
use crate::keys::{Key, Passphrase};
use secretary_common::{Error, Result};

/// Nonce size for AES-GCM (12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under the key derived from `passphrase`.
///
/// # Postconditions
/// - Returns nonce || ciphertext || tag
/// - The nonce is freshly generated for every call
/// - The blob length is plaintext length + NONCE_SIZE + TAG_SIZE
///
/// # Errors
/// - `KeyDerivation` if the derived key does not fit AES-128
/// - `RandomSource` if the CSPRNG fails
pub fn encrypt(plaintext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
    let key = derive_key(passphrase)?;
    encrypt_with_key(&key, plaintext)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// # Errors
/// - `MalformedInput` if the blob cannot even hold a nonce
/// - `Authentication` for any other failure: wrong passphrase, corrupted
///   bytes, or a blob too short to hold the tag
pub fn decrypt(blob: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
    let key = derive_key(passphrase)?;
    decrypt_with_key(&key, blob)
}

/// Encrypt with an already derived key.
pub fn encrypt_with_key(key: &Key, plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_rng(key, plaintext, &mut OsRng)
}

/// Decrypt with an already derived key.
pub fn decrypt_with_key(key: &Key, blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < NONCE_SIZE {
        return Err(Error::MalformedInput(format!(
            "Ciphertext too short: expected at least {} bytes, got {}",
            NONCE_SIZE,
            blob.len()
        )));
    }
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Authentication);
    }

    let cipher = new_cipher(key)?;
    let (nonce_bytes, sealed) = blob.split_at(NONCE_SIZE);

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), sealed)
        .map_err(|_| Error::Authentication)
}

/// Encrypt text and hex-encode the blob.
pub fn encrypt_text(text: &str, passphrase: &Passphrase) -> Result<String> {
    let blob = encrypt(text.as_bytes(), passphrase)?;
    Ok(hex::encode(blob))
}

/// Decode a hex blob and decrypt it to text.
///
/// # Errors
/// - `Encoding` if `text` is not even-length hex, or the plaintext is not UTF-8
/// - Everything [`decrypt`] returns
pub fn decrypt_text(text: &str, passphrase: &Passphrase) -> Result<String> {
    let blob = hex::decode(text).map_err(|e| Error::Encoding(e.to_string()))?;
    let plaintext = decrypt(&blob, passphrase)?;
    String::from_utf8(plaintext)
        .map_err(|_| Error::Encoding("Decrypted payload is not valid UTF-8".to_string()))
}

fn new_cipher(key: &Key) -> Result<Aes128Gcm> {
    Aes128Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| Error::KeyDerivation("Key does not fit AES-128-GCM".to_string()))
}

fn encrypt_with_rng<R: RngCore + ?Sized>(
    key: &Key,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>> {
    let cipher = new_cipher(key)?;

    let mut nonce = [0u8; NONCE_SIZE];
    rng.try_fill_bytes(&mut nonce)
        .map_err(|e| Error::RandomSource(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| Error::MalformedInput("Plaintext too large for AES-GCM".to_string()))?;

    // Prepend nonce to ciphertext
    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}
