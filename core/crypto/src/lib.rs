//! Cryptographic primitives for Secretary.
//!
//! This module provides:
//! - Deterministic 128-bit digests using BLAKE2b
//! - Passphrase to key derivation over that digest
//! - Authenticated encryption using AES-128-GCM with a random nonce per call
//! - Secure key and passphrase handling with automatic zeroization
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Authentication failures are reported without saying what failed

pub mod aead;
pub mod hash;
pub mod keys;

pub use aead::{decrypt, decrypt_text, encrypt, encrypt_text};
pub use hash::{derive_key, digest};
pub use keys::{Key, Passphrase};
